//! crates/prog_helper_core/src/chat.rs
//!
//! Input validation and small pure helpers for the chat exchange.

use crate::ports::{PortError, PortResult};

/// Maximum message length in characters, after trimming.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// How many prior conversation turns are handed to the completion provider.
pub const HISTORY_TURN_CAP: usize = 20;

/// How many recent classified messages feed the modal-classification counter.
pub const RECENT_CLASSIFICATION_WINDOW: i64 = 10;

/// Trims and length-checks an inbound chat message. Rejection happens before
/// anything is persisted.
pub fn validate_message(raw: &str) -> PortResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PortError::Invalid("Message must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_MESSAGE_CHARS {
        return Err(PortError::Invalid(format!(
            "Message must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Title used for a lazily created session before the generated title lands:
/// the first 50 characters of the message.
pub fn fallback_title(message: &str) -> String {
    if message.chars().count() > 50 {
        let preview: String = message.chars().take(50).collect();
        format!("{preview}...")
    } else {
        message.to_string()
    }
}

/// Cleans a generated title, falling back to the message preview when the
/// model returned something unusable.
pub fn clean_title(generated: &str, message: &str) -> String {
    let cleaned: String = generated.trim().chars().filter(|c| *c != '"' && *c != '\'').collect();
    let len = cleaned.chars().count();
    if !(3..=50).contains(&len) {
        return fallback_title(message);
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_trimmed_message() {
        assert_eq!(validate_message("  hello  ").unwrap(), "hello");
    }

    #[test]
    fn rejects_whitespace_only() {
        assert!(validate_message("   \n\t ").is_err());
    }

    #[test]
    fn rejects_over_long_messages() {
        let long = "x".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(validate_message(&long).is_err());
        let max = "x".repeat(MAX_MESSAGE_CHARS);
        assert!(validate_message(&max).is_ok());
    }

    #[test]
    fn fallback_title_truncates_long_messages() {
        let long = "a".repeat(80);
        let title = fallback_title(&long);
        assert!(title.ends_with("..."));
        assert_eq!(title.chars().count(), 53);
    }

    #[test]
    fn clean_title_strips_quotes() {
        assert_eq!(clean_title("\"Rust Borrow Checker\"", "msg"), "Rust Borrow Checker");
    }

    #[test]
    fn clean_title_falls_back_on_degenerate_output() {
        assert_eq!(clean_title("ok", "what is a borrow checker"), "what is a borrow checker");
        let essay = "t".repeat(60);
        assert_eq!(clean_title(&essay, "short question"), "short question");
    }
}
