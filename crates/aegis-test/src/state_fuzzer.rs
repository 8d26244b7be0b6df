//! Randomized exercise of the fallback state machine.
//!
//! Feeds long seeded event sequences through `FallbackState::apply` and
//! checks the invariants that hold for every sequence:
//! - the level only ever descends the ladder
//! - the retry count never exceeds the budget
//! - a refused transition leaves the state untouched

use aegis_core::FallbackLevel;
use aegis_fallback::{FallbackEvent, FallbackState, Transition};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Fuzzer configuration
#[derive(Clone, Debug)]
pub struct FuzzerConfig {
    /// Number of events to generate
    pub event_count: usize,
    /// Probability an event is a crash (0.0 - 1.0)
    pub catch_prob: f64,
    /// Probability an event is a degrade request (0.0 - 1.0)
    pub degrade_prob: f64,
    /// Retry budget per level
    pub max_retries: u32,
    /// Random seed
    pub seed: u64,
}

impl Default for FuzzerConfig {
    fn default() -> Self {
        FuzzerConfig {
            event_count: 1000,
            catch_prob: 0.5,
            degrade_prob: 0.2,
            max_retries: 3,
            seed: 42,
        }
    }
}

impl FuzzerConfig {
    /// Light fuzzing for quick tests
    pub fn light() -> Self {
        FuzzerConfig {
            event_count: 100,
            ..FuzzerConfig::default()
        }
    }

    /// Crash-heavy sequence with almost no retry budget
    pub fn adversarial() -> Self {
        FuzzerConfig {
            event_count: 5000,
            catch_prob: 0.7,
            degrade_prob: 0.25,
            max_retries: 1,
            seed: 42,
        }
    }
}

/// Fuzzing result
#[derive(Debug)]
pub struct FuzzResult {
    pub events_applied: u64,
    pub refusals: u64,
    pub final_state: FallbackState,
    /// Transitions that moved the level up the ladder
    pub ascent_violations: u32,
    /// States observed with a retry count above the budget
    pub budget_violations: u32,
    /// Refused transitions that still mutated the state
    pub refusal_violations: u32,
}

impl FuzzResult {
    pub fn is_valid(&self) -> bool {
        self.ascent_violations == 0 && self.budget_violations == 0 && self.refusal_violations == 0
    }
}

/// Drives one boundary's state machine with a random event stream.
pub struct StateFuzzer {
    config: FuzzerConfig,
    rng: StdRng,
}

impl StateFuzzer {
    pub fn new(config: FuzzerConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        StateFuzzer { config, rng }
    }

    fn generate_event(&mut self) -> FallbackEvent {
        let roll: f64 = self.rng.gen();
        if roll < self.config.catch_prob {
            FallbackEvent::Catch
        } else if roll < self.config.catch_prob + self.config.degrade_prob {
            FallbackEvent::Degrade
        } else {
            FallbackEvent::Retry
        }
    }

    /// Run the fuzzer
    pub fn run(&mut self) -> FuzzResult {
        let mut state = FallbackState::mount(FallbackLevel::Immersive);
        let mut result = FuzzResult {
            events_applied: 0,
            refusals: 0,
            final_state: state,
            ascent_violations: 0,
            budget_violations: 0,
            refusal_violations: 0,
        };

        for _ in 0..self.config.event_count {
            let event = self.generate_event();
            let (next, transition) = state.apply(event, self.config.max_retries);

            match transition {
                Transition::Applied => result.events_applied += 1,
                Transition::AtFloor | Transition::RetriesExhausted => {
                    result.refusals += 1;
                    if next != state {
                        result.refusal_violations += 1;
                    }
                }
            }
            if next.level.tier() < state.level.tier() {
                result.ascent_violations += 1;
            }
            if next.retry_count > self.config.max_retries {
                result.budget_violations += 1;
            }

            state = next;
        }

        result.final_state = state;
        result
    }
}

/// Property helpers shared with the proptest suites.
pub mod properties {
    use super::*;

    /// Property: the level sequence never climbs the ladder
    pub fn descent_monotone(levels: &[FallbackLevel]) -> bool {
        levels.windows(2).all(|w| w[1].tier() >= w[0].tier())
    }

    /// Property: a refused transition is a no-op
    pub fn refusal_preserves_state(
        before: FallbackState,
        after: FallbackState,
        transition: Transition,
    ) -> bool {
        transition == Transition::Applied || before == after
    }

    /// Property: the retry count stays within budget
    pub fn retry_within_budget(state: FallbackState, max_retries: u32) -> bool {
        state.retry_count <= max_retries
    }
}
