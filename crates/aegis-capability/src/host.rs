//! Host capability queries.
//!
//! The checks a browser would run against `navigator.xr` and a throwaway
//! canvas are modeled as an injected trait. Both queries are optional and
//! fallible external capabilities; the probe maps every failure to
//! "unsupported".

use async_trait::async_trait;

use aegis_core::AegisResult;

/// External capability queries consumed by the probe.
#[async_trait]
pub trait HostCapabilities: Send + Sync {
    /// Whether an immersive XR session can be started.
    ///
    /// May suspend for as long as the host needs (a permission prompt,
    /// device enumeration). Errors mean "could not determine", which the
    /// probe treats as unsupported.
    async fn xr_session_supported(&self) -> AegisResult<bool>;

    /// Whether a WebGL rendering context can be created.
    async fn webgl_context_available(&self) -> AegisResult<bool>;
}

/// Host with no rendering APIs at all. The default when nothing richer is
/// injected, mirroring an environment without a `navigator`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedHost;

#[async_trait]
impl HostCapabilities for DetachedHost {
    async fn xr_session_supported(&self) -> AegisResult<bool> {
        Err(aegis_core::AegisError::CapabilityUnavailable(
            "no XR runtime attached".into(),
        ))
    }

    async fn webgl_context_available(&self) -> AegisResult<bool> {
        Err(aegis_core::AegisError::CapabilityUnavailable(
            "no graphics context source attached".into(),
        ))
    }
}

/// Host with fixed answers. Used by demos and tests that need a device of a
/// particular shape.
#[derive(Debug, Clone, Copy)]
pub struct StaticHost {
    pub webxr: bool,
    pub webgl: bool,
}

impl StaticHost {
    pub fn new(webxr: bool, webgl: bool) -> Self {
        Self { webxr, webgl }
    }
}

#[async_trait]
impl HostCapabilities for StaticHost {
    async fn xr_session_supported(&self) -> AegisResult<bool> {
        Ok(self.webxr)
    }

    async fn webgl_context_available(&self) -> AegisResult<bool> {
        Ok(self.webgl)
    }
}
