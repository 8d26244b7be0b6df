#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use aegis_core::FallbackLevel;
use aegis_fallback::{FallbackEvent, FallbackState, Transition};

#[derive(Arbitrary, Debug)]
struct Input {
    codes: Vec<u8>,
    max_retries: u8,
}

fuzz_target!(|input: Input| {
    let max_retries = input.max_retries as u32;
    let mut state = FallbackState::mount(FallbackLevel::Immersive);

    for code in input.codes {
        let event = match code % 3 {
            0 => FallbackEvent::Catch,
            1 => FallbackEvent::Degrade,
            _ => FallbackEvent::Retry,
        };
        let (next, transition) = state.apply(event, max_retries);

        assert!(next.level.tier() >= state.level.tier());
        assert!(next.retry_count <= max_retries);
        if transition != Transition::Applied {
            assert_eq!(next, state);
        }
        state = next;
    }
});
