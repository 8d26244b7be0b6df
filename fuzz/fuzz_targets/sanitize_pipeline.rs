#![no_main]

use libfuzzer_sys::fuzz_target;

use aegis_sanitize::{
    sanitize_context, sanitize_error_message, sanitize_stack, MAX_ERROR_MESSAGE_LEN, MAX_STACK_LEN,
};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let message = sanitize_error_message(input);
        assert!(message.chars().count() <= MAX_ERROR_MESSAGE_LEN);
        assert!(!message.contains(['<', '>', '\'', '"']));
        assert!(!message.to_lowercase().contains("<script"));

        let stack = sanitize_stack(input);
        assert!(stack.chars().count() <= MAX_STACK_LEN);
        assert!(!stack.contains(['<', '>', '\'', '"']));

        let context = sanitize_context(&serde_json::Value::String(input.to_string()));
        if let serde_json::Value::String(s) = context {
            assert!(!s.contains(['<', '>', '\'', '"']));
        }
    }
});
