/// Phrases that wake the assistant. Matching is case-insensitive substring
/// containment, so "bob" alone is enough.
pub const WAKE_PHRASES: [&str; 2] = ["hey bob", "bob"];

pub fn is_wake_phrase(text: &str) -> bool {
    let lowered = text.to_lowercase();
    WAKE_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}
