use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::speech::SpeechOutput;
use crate::error::SpeechError;

/// Writes replies to stdout instead of speaking them (console mode).
pub struct ConsoleSpeaker {
    stdout: Mutex<tokio::io::Stdout>,
}

impl ConsoleSpeaker {
    pub fn new() -> Self {
        Self {
            stdout: Mutex::new(tokio::io::stdout()),
        }
    }
}

impl Default for ConsoleSpeaker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechOutput for ConsoleSpeaker {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        let mut out = self.stdout.lock().await;
        out.write_all(format!("Bob: {}\n", text).as_bytes()).await?;
        out.flush().await?;
        Ok(())
    }
}
