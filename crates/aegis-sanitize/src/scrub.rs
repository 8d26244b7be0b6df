//! String scrubbing: bounded truncation followed by ordered pattern passes.

use once_cell::sync::Lazy;
use regex::Regex;

/// Length ceiling for sanitized error messages.
pub const MAX_ERROR_MESSAGE_LEN: usize = 500;
/// Length ceiling for sanitized user-agent strings.
pub const MAX_USER_AGENT_LEN: usize = 200;
/// Length ceiling for sanitized error names.
pub const MAX_ERROR_NAME_LEN: usize = 100;
/// Length ceiling for sanitized URLs.
pub const MAX_URL_LEN: usize = 300;
/// Length ceiling for sanitized stack traces.
pub const MAX_STACK_LEN: usize = 2000;

/// A compiled scrub pattern paired with its placeholder.
struct ScrubPattern {
    regex: &'static Lazy<Option<Regex>>,
    placeholder: &'static str,
}

macro_rules! scrub_pattern {
    ($name:ident, $regex_str:expr) => {
        static $name: Lazy<Option<Regex>> = Lazy::new(|| Regex::new($regex_str).ok());
    };
}

// Windows drive-letter paths, both separator styles.
scrub_pattern!(RE_WINDOWS_PATH, r#"(?i)\b[a-z]:[\\/][^\s<>'"]{0,256}"#);

// POSIX absolute paths with at least two segments; a bare "/x" in prose is
// not worth a false positive.
scrub_pattern!(RE_POSIX_PATH, r"/(?:[\w.\-]+/)+[\w.\-]+");

// Script blocks. Repetition bounds are deliberate even though the engine is
// non-backtracking; inputs are already truncated before any pass runs.
scrub_pattern!(
    RE_SCRIPT_BLOCK,
    r"(?is)<script[^>]{0,256}>.{0,4096}?</script\s{0,16}>"
);

// Any remaining markup tag, including an unclosed <script ...>.
scrub_pattern!(RE_HTML_TAG, r"<[^>]{0,256}>");

// The one SQL signature the collection endpoint has actually seen probed.
scrub_pattern!(RE_SQL, r"(?i)\bDROP\s+TABLE\b");

/// The ordered passes applied by [`sanitize_string`].
fn passes() -> [ScrubPattern; 5] {
    [
        ScrubPattern {
            regex: &RE_WINDOWS_PATH,
            placeholder: "[PATH]",
        },
        ScrubPattern {
            regex: &RE_POSIX_PATH,
            placeholder: "[PATH]",
        },
        ScrubPattern {
            regex: &RE_SCRIPT_BLOCK,
            placeholder: "[SCRIPT]",
        },
        ScrubPattern {
            regex: &RE_HTML_TAG,
            placeholder: "[HTML]",
        },
        ScrubPattern {
            regex: &RE_SQL,
            placeholder: "[SQL]",
        },
    ]
}

/// Sanitize an arbitrary string down to `max_length` characters.
///
/// Truncates first so every subsequent pass works on bounded input, then
/// replaces paths, script blocks, remaining markup, and the SQL signature
/// with placeholders, and finally strips `<`, `>`, `'`, `"`.
pub fn sanitize_string(input: &str, max_length: usize) -> String {
    let mut out: String = input.chars().take(max_length).collect();

    for pass in passes() {
        if let Some(re) = pass.regex.as_ref() {
            out = re.replace_all(&out, pass.placeholder).into_owned();
        }
    }

    out = out.replace(['<', '>', '\'', '"'], "");

    // Placeholders can be longer than the text they replaced.
    if out.chars().count() > max_length {
        out = out.chars().take(max_length).collect();
    }
    out
}

/// Sanitize an error message (ceiling 500).
pub fn sanitize_error_message(input: &str) -> String {
    sanitize_string(input, MAX_ERROR_MESSAGE_LEN)
}

/// Sanitize a user-agent string (ceiling 200).
pub fn sanitize_user_agent(input: &str) -> String {
    sanitize_string(input, MAX_USER_AGENT_LEN)
}

/// Sanitize an error name (ceiling 100).
pub fn sanitize_error_name(input: &str) -> String {
    sanitize_string(input, MAX_ERROR_NAME_LEN)
}

/// Sanitize a URL (ceiling 300).
pub fn sanitize_url(input: &str) -> String {
    sanitize_string(input, MAX_URL_LEN)
}

/// Sanitize a stack trace (ceiling 2000).
pub fn sanitize_stack(input: &str) -> String {
    sanitize_string(input, MAX_STACK_LEN)
}
