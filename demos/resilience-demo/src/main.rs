//! AEGIS Resilience Demo
//!
//! Walks the layer through its whole life against an in-process
//! collector: healthy delivery, a collector outage, a browser-offline
//! stretch, reconnect replay from disk, and a fallback boundary
//! degrading under crashes and low frame rates.
//!
//! The queue file lives in a stable temp directory: kill the demo
//! mid-outage and the next run restores and replays the leftovers.

mod collector;

use std::sync::Arc;
use std::time::Duration;

use aegis_capability::{CapabilityProbe, StaticHost};
use aegis_core::{Clock, ErrorDetails, SystemClock};
use aegis_fallback::{BoundaryConfig, FallbackBoundary};
use aegis_quality::{QualitySample, SpringConfig};
use aegis_queue::{ErrorQueue, FileStore, QueueConfig};
use aegis_telemetry::{
    DispatcherConfig, SentryStyleAnalytics, TelemetryDispatcher, TracingAnalytics,
};
use aegis_transport::{Connectivity, HttpSink, TelemetrySink};

use collector::Collector;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("╔════════════════════════════════════════════════════════════╗");
    println!("║           AEGIS Resilience Layer - Demo                    ║");
    println!("║   outage, offline, replay, and fallback walkthrough        ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();

    let collector = Arc::new(Collector::new());
    let addr = collector::serve(Arc::clone(&collector)).await?;
    println!("collector listening on http://{addr}/api/errors");

    let dir = std::env::temp_dir().join("aegis-resilience-demo");
    std::fs::create_dir_all(&dir)?;
    let store = FileStore::in_dir(&dir);
    println!("queue file at {}", store.path().display());

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let connectivity = Connectivity::online();
    let sink = Arc::new(HttpSink::new(format!("http://{addr}/api/errors"))?);

    let queue = Arc::new(ErrorQueue::restore(
        Box::new(store),
        sink as Arc<dyn TelemetrySink>,
        connectivity.clone(),
        Arc::clone(&clock),
        QueueConfig {
            // Demo-speed replay.
            backoff_base_ms: 250,
            backoff_max_ms: 2_000,
            backoff_jitter_ms: 50,
            ..QueueConfig::default()
        },
    ));
    if !queue.is_empty() {
        println!(
            "restored {} pending entries from a previous run",
            queue.len()
        );
    }
    let _watcher = queue.spawn_reconnect_watcher();

    // A laptop without a headset: WebGL yes, WebXR no.
    let probe = Arc::new(CapabilityProbe::new(
        Arc::new(StaticHost::new(false, true)),
        Arc::clone(&clock),
    ));
    let dispatcher = Arc::new(
        TelemetryDispatcher::new(
            Arc::clone(&queue),
            Arc::clone(&probe),
            Arc::clone(&clock),
            DispatcherConfig {
                user_agent: "resilience-demo/0.1".into(),
                page_url: "https://demo.local/xr".into(),
                ..DispatcherConfig::default()
            },
        )
        .with_analytics(Arc::new(TracingAnalytics))
        .with_analytics(Arc::new(SentryStyleAnalytics)),
    );

    phase(1, "healthy delivery");
    for i in 0..3 {
        dispatcher
            .log_error(
                ErrorDetails::new("TextureError", format!("texture upload {i} failed")),
                serde_json::json!({"component": "asset-loader"}),
            )
            .await;
    }
    println!(
        "collector received {} records, queue holds {}",
        collector.count(),
        queue.len()
    );

    phase(2, "collector outage");
    collector.set_accepting(false);
    for i in 0..3 {
        dispatcher
            .log_error(
                ErrorDetails::new("SessionError", format!("session heartbeat {i} lost")),
                serde_json::json!({"component": "xr-session", "token": "se-99"}),
            )
            .await;
    }
    println!("queue holds {} entries, persisted to disk", queue.len());

    phase(3, "browser offline");
    connectivity.set_online(false);
    for i in 0..2 {
        dispatcher
            .log_error(
                ErrorDetails::new("NetworkError", format!("fetch {i} aborted")),
                serde_json::json!({"component": "net"}),
            )
            .await;
    }
    println!("queue holds {} entries, no sends attempted", queue.len());

    phase(4, "reconnect and replay");
    collector.set_accepting(true);
    connectivity.set_online(true);
    // The watcher flushes on the edge; keep nudging until the backoff
    // windows of previously failed entries expire.
    for _ in 0..40 {
        if queue.is_empty() {
            break;
        }
        queue.flush().await;
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    println!("queue holds {} entries", queue.len());
    println!("delivery order:");
    for (i, message) in collector.received_messages().iter().enumerate() {
        println!("  {:>2}. {message}", i + 1);
    }

    phase(5, "fallback boundary");
    let boundary = FallbackBoundary::new(
        BoundaryConfig {
            component: "demo-scene".into(),
            ..BoundaryConfig::default()
        },
        Arc::clone(&dispatcher),
    );
    let state = boundary.align_to_capabilities().await;
    println!("mounted at {} (host has WebGL, no WebXR)", state.level);

    boundary
        .catch_error(ErrorDetails::new("RenderError", "shader compile failed"))
        .await;
    println!(
        "after crash: level={} error={}",
        boundary.state().level,
        boundary.state().has_error
    );
    boundary.retry();
    println!(
        "after retry: level={} retries used={}",
        boundary.state().level,
        boundary.state().retry_count
    );

    // Sustained low frame rate walks the boundary down the ladder.
    let mut degraded = None;
    for _ in 0..30 {
        if let Some(state) = boundary.observe_sample(QualitySample::stable(22.0)) {
            degraded = Some(state);
            break;
        }
    }
    if let Some(state) = degraded {
        println!("sustained 22 fps degraded the boundary to {}", state.level);
    }
    // Keep sampling at the floor so the spring reflects the reduced band.
    for _ in 0..6 {
        boundary.observe_sample(QualitySample::stable(22.0));
    }
    let spring = boundary.spring(SpringConfig::default());
    println!(
        "adaptive spring now tension={:.0} friction={:.1}",
        spring.tension, spring.friction
    );

    phase(6, "session stats");
    println!("{}", serde_json::to_string_pretty(&dispatcher.stats())?);

    Ok(())
}

fn phase(n: u32, title: &str) {
    println!();
    println!("--- phase {n}: {title} ---");
}
