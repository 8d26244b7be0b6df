//! The fallback ladder as a pure state machine.
//!
//! The state is a plain value and transitions are a total function, so the
//! rules are testable without any runtime around them. Everything
//! observable (telemetry, callbacks, rendering) happens in the boundary
//! wrapper, not here.

use aegis_core::FallbackLevel;

/// Live state of one boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackState {
    pub level: FallbackLevel,
    pub has_error: bool,
    pub retry_count: u32,
}

/// Inputs the machine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackEvent {
    /// The wrapped content failed.
    Catch,
    /// Move to the next stricter level.
    Degrade,
    /// Re-attempt rendering at the current level.
    Retry,
}

/// What a transition did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The event took effect.
    Applied,
    /// Degrade requested at the floor level; nothing stricter exists.
    AtFloor,
    /// Retry requested with the retry budget spent.
    RetriesExhausted,
}

impl FallbackState {
    /// Fresh mount at `level`.
    pub fn mount(level: FallbackLevel) -> Self {
        Self {
            level,
            has_error: false,
            retry_count: 0,
        }
    }

    /// Strictest level with the error view showing. The only exit is a
    /// full reload, which is outside the machine.
    pub fn is_terminal(&self) -> bool {
        self.level.is_floor() && self.has_error
    }

    /// The transition function.
    ///
    /// Catch never changes the level; the embedding UI offers the
    /// explicit next-fallback action. Degrade resets the error and retry
    /// budget for the new level. Retry clears the error at the current
    /// level until `max_retries` attempts are spent, then refuses.
    pub fn apply(self, event: FallbackEvent, max_retries: u32) -> (Self, Transition) {
        match event {
            FallbackEvent::Catch => (
                Self {
                    has_error: true,
                    ..self
                },
                Transition::Applied,
            ),
            FallbackEvent::Degrade => match self.level.degrade() {
                Some(next) => (
                    Self {
                        level: next,
                        has_error: false,
                        retry_count: 0,
                    },
                    Transition::Applied,
                ),
                None => (self, Transition::AtFloor),
            },
            FallbackEvent::Retry => {
                if self.retry_count < max_retries {
                    (
                        Self {
                            has_error: false,
                            retry_count: self.retry_count + 1,
                            ..self
                        },
                        Transition::Applied,
                    )
                } else {
                    (self, Transition::RetriesExhausted)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_is_clean() {
        let state = FallbackState::mount(FallbackLevel::Immersive);
        assert_eq!(state.level, FallbackLevel::Immersive);
        assert!(!state.has_error);
        assert_eq!(state.retry_count, 0);
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_catch_sets_error_without_changing_level() {
        let state = FallbackState::mount(FallbackLevel::Immersive);
        let (state, transition) = state.apply(FallbackEvent::Catch, 3);

        assert_eq!(transition, Transition::Applied);
        assert!(state.has_error);
        assert_eq!(state.level, FallbackLevel::Immersive);
        assert_eq!(state.retry_count, 0);
    }

    #[test]
    fn test_degrade_ladder_reaches_floor() {
        let mut state = FallbackState::mount(FallbackLevel::Immersive);

        for _ in 0..3 {
            state = state.apply(FallbackEvent::Degrade, 3).0;
        }
        assert_eq!(state.level, FallbackLevel::Flat2d);

        let (after_fourth, transition) = state.apply(FallbackEvent::Degrade, 3);
        assert_eq!(transition, Transition::AtFloor);
        assert_eq!(after_fourth, state);
    }

    #[test]
    fn test_degrade_resets_error_and_retries() {
        let state = FallbackState {
            level: FallbackLevel::Immersive,
            has_error: true,
            retry_count: 2,
        };

        let (state, transition) = state.apply(FallbackEvent::Degrade, 3);
        assert_eq!(transition, Transition::Applied);
        assert_eq!(state.level, FallbackLevel::Rendered3d);
        assert!(!state.has_error);
        assert_eq!(state.retry_count, 0);
    }

    #[test]
    fn test_retry_clears_error_until_exhausted() {
        let max_retries = 2;
        let mut state = FallbackState::mount(FallbackLevel::Immersive);

        // The content keeps failing; each retry clears the error and the
        // next catch restores it.
        for expected_count in 1..=max_retries {
            state = state.apply(FallbackEvent::Catch, max_retries).0;
            let (next, transition) = state.apply(FallbackEvent::Retry, max_retries);
            assert_eq!(transition, Transition::Applied);
            assert!(!next.has_error);
            assert_eq!(next.retry_count, expected_count);
            state = next;
        }

        state = state.apply(FallbackEvent::Catch, max_retries).0;
        let (after_third, transition) = state.apply(FallbackEvent::Retry, max_retries);
        assert_eq!(transition, Transition::RetriesExhausted);
        assert!(after_third.has_error);
        assert_eq!(after_third.retry_count, max_retries);
        assert_eq!(after_third.level, FallbackLevel::Immersive);
    }

    #[test]
    fn test_terminal_only_at_floor_with_error() {
        let floor_clean = FallbackState::mount(FallbackLevel::Flat2d);
        assert!(!floor_clean.is_terminal());

        let (floor_error, _) = floor_clean.apply(FallbackEvent::Catch, 3);
        assert!(floor_error.is_terminal());

        let upper_error = FallbackState {
            level: FallbackLevel::Rendered3d,
            has_error: true,
            retry_count: 0,
        };
        assert!(!upper_error.is_terminal());
    }
}
