//! Conversation title derivation.
//!
//! Titles are derived once, from the first user message of a conversation:
//! the leading words of the message, truncated to a hard character bound.
//! They are never recomputed afterward, even if the message content would
//! produce a different title under new bounds.

/// Placeholder title a conversation carries until its first user message.
pub const PLACEHOLDER_TITLE: &str = "New Conversation";

/// Derive a conversation title from message content.
///
/// Takes the first `max_words` whitespace-separated words, then enforces
/// `max_chars` by cutting at a character boundary and appending `...`.
/// Blank content falls back to [`PLACEHOLDER_TITLE`].
pub fn derive_title(content: &str, max_words: usize, max_chars: usize) -> String {
    let title = content
        .split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ");

    if title.is_empty() {
        return PLACEHOLDER_TITLE.to_string();
    }

    if title.chars().count() <= max_chars {
        return title;
    }

    let keep = max_chars.saturating_sub(3);
    let truncated: String = title.chars().take(keep).collect();
    format!("{truncated}...")
}
