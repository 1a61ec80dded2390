use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::TtsConfig;
use crate::error::SpeechError;

/// Text-to-speech sink. `speak` returns once the utterance has been fully rendered.
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    async fn speak(&self, text: &str) -> Result<(), SpeechError>;
}

/// Speaks through a platform TTS command (`say`, `espeak`).
///
/// The dispatcher and the ticker share one speaker; the mutex keeps their
/// utterances from overlapping.
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
    rate: u32,
    busy: Mutex<()>,
}

impl CommandSpeaker {
    pub fn new(config: &TtsConfig) -> Result<Self, SpeechError> {
        let mut words = shell_words::split(&config.command)
            .map_err(|e| SpeechError::Engine(format!("bad TTS command {:?}: {}", config.command, e)))?;
        if words.is_empty() {
            return Err(SpeechError::Engine("empty TTS command".to_string()));
        }
        let program = words.remove(0);
        Ok(Self {
            program,
            args: words,
            rate: config.rate,
            busy: Mutex::new(()),
        })
    }

    fn rate_args(&self) -> Vec<String> {
        let name = std::path::Path::new(&self.program)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        match name {
            "say" => vec!["-r".to_string(), self.rate.to_string()],
            "espeak" | "espeak-ng" => vec!["-s".to_string(), self.rate.to_string()],
            _ => Vec::new(),
        }
    }
}

#[async_trait]
impl SpeechOutput for CommandSpeaker {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        if text.trim().is_empty() {
            return Ok(());
        }
        let _turn = self.busy.lock().await;
        debug!("Speaking via '{}': {}", self.program, text);

        let status = Command::new(&self.program)
            .args(&self.args)
            .args(self.rate_args())
            .arg(text)
            .kill_on_drop(true)
            .status()
            .await?;

        if !status.success() {
            return Err(SpeechError::Engine(format!("'{}' exited with {}", self.program, status)));
        }
        Ok(())
    }
}
