pub mod client;

pub use client::{ChatModel, OpenAiChatClient};
