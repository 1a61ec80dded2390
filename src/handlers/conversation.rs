use std::sync::Arc;

use tracing::warn;

use crate::services::llm::ChatModel;

pub const PERSONA_PROMPT: &str = "You are a personal assistant designed to help with daily tasks and \
answer any questions. Your responses should be short, cheerful, and playful, like you're the closest \
friend of the person you're talking to. Keep your replies simple, clear, and easy to understand, with \
no long explanations. Do not use emojis in your responses. Your goal is to assist in a friendly, \
natural way, just like a best friend would!";

pub const CONVERSE_FAILED: &str = "Sorry, I'm having trouble thinking right now. Please try again later.";

/// Fallback for queries no keyword route claims. Each call is one stateless turn.
pub struct Conversation {
    model: Arc<dyn ChatModel>,
}

impl Conversation {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub async fn converse(&self, query: &str) -> String {
        match self.model.complete(PERSONA_PROMPT, query).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("LLM Error: {}", e);
                CONVERSE_FAILED.to_string()
            }
        }
    }
}
