use rand::seq::SliceRandom;

pub const ACTIVATION_RESPONSES: [&str; 4] = [
    "Hey, how can I help you?",
    "Hello, what can I do for you?",
    "Hi there, how can I assist you today?",
    "Hey, what do you need help with?",
];

pub const FOLLOW_UP_RESPONSES: [&str; 4] = [
    "Is there anything else I can help you with?",
    "Do you need anything else?",
    "Let me know if there's something more I can do.",
    "Anything else on your mind?",
];

pub const TIMER_DONE: &str = "Your timer is up!";
pub const RETRY_TIME: &str = "Sorry, I didn't understand the time. Please try again.";
pub const RETRY_DURATION: &str = "Sorry, I didn't understand the duration. Please try again.";
pub const HANDLER_TIMED_OUT: &str = "Sorry, that took too long. Please try again.";

/// Picks the spoken acknowledgement and follow-up lines.
#[derive(Debug, Clone)]
pub struct PhraseBook {
    activation: Vec<String>,
    follow_up: Vec<String>,
}

impl Default for PhraseBook {
    fn default() -> Self {
        Self {
            activation: ACTIVATION_RESPONSES.iter().map(|s| s.to_string()).collect(),
            follow_up: FOLLOW_UP_RESPONSES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PhraseBook {
    /// Single fixed lines; handy for deterministic tests.
    pub fn fixed(activation: &str, follow_up: &str) -> Self {
        Self {
            activation: vec![activation.to_string()],
            follow_up: vec![follow_up.to_string()],
        }
    }

    pub fn activation(&self) -> &str {
        pick(&self.activation)
    }

    pub fn follow_up(&self) -> &str {
        pick(&self.follow_up)
    }
}

fn pick(lines: &[String]) -> &str {
    lines
        .choose(&mut rand::thread_rng())
        .map(String::as_str)
        .unwrap_or_default()
}
