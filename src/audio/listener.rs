use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ringbuf::traits::Consumer;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, info};

use super::processing::UtteranceSegmenter;
use super::wav::encode_wav;
use crate::error::RecognitionError;
use crate::services::stt::Transcriber;

/// How long to wait for speech to begin and how long a phrase may run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenPolicy {
    /// `None` waits indefinitely for speech to start.
    pub timeout: Option<Duration>,
    pub phrase_limit: Option<Duration>,
}

impl ListenPolicy {
    /// Waiting for the wake phrase: no timeout, short phrases.
    pub fn wake() -> Self {
        Self {
            timeout: None,
            phrase_limit: Some(Duration::from_secs(5)),
        }
    }

    pub fn query(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            phrase_limit: Some(Duration::from_secs(15)),
        }
    }
}

/// Microphone capture plus speech-to-text.
#[async_trait]
pub trait SpeechInput: Send + Sync {
    async fn listen(&self, policy: ListenPolicy) -> Result<String, RecognitionError>;
}

/// Live microphone: VAD segmentation, WAV encoding, hosted transcription.
pub struct MicrophoneListener<C>
where
    C: Consumer<Item = f32> + Send + 'static,
{
    segmenter: Arc<Mutex<UtteranceSegmenter<C>>>,
    transcriber: Transcriber,
}

impl<C> MicrophoneListener<C>
where
    C: Consumer<Item = f32> + Send + 'static,
{
    pub fn new(segmenter: UtteranceSegmenter<C>, transcriber: Transcriber) -> Self {
        Self {
            segmenter: Arc::new(Mutex::new(segmenter)),
            transcriber,
        }
    }
}

#[async_trait]
impl<C> SpeechInput for MicrophoneListener<C>
where
    C: Consumer<Item = f32> + Send + 'static,
{
    async fn listen(&self, policy: ListenPolicy) -> Result<String, RecognitionError> {
        let segmenter = Arc::clone(&self.segmenter);
        let (samples, sample_rate) = tokio::task::spawn_blocking(move || {
            let mut seg = segmenter.lock().unwrap_or_else(|e| e.into_inner());
            let rate = seg.sample_rate();
            seg.capture(&policy).map(|samples| (samples, rate))
        })
        .await
        .map_err(|e| RecognitionError::Service(format!("capture task failed: {}", e)))??;

        let wav = encode_wav(&samples, sample_rate)
            .map_err(|e| RecognitionError::Service(format!("wav encode failed: {}", e)))?;
        debug!("Captured {} samples, {} bytes of WAV", samples.len(), wav.len());

        let text = self
            .transcriber
            .transcribe(wav)
            .await
            .map_err(|e| RecognitionError::Service(e.to_string()))?;

        if text.trim().is_empty() {
            return Err(RecognitionError::Unintelligible);
        }
        info!("Recognized: {}", text);
        Ok(text)
    }
}

/// Reads one utterance per line. Used for `--console` and in tests.
///
/// Typing has no natural timeout, so the policy is ignored.
pub struct ConsoleListener<R> {
    lines: tokio::sync::Mutex<Lines<R>>,
}

impl ConsoleListener<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> ConsoleListener<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: tokio::sync::Mutex::new(reader.lines()),
        }
    }
}

#[async_trait]
impl<R> SpeechInput for ConsoleListener<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn listen(&self, _policy: ListenPolicy) -> Result<String, RecognitionError> {
        let mut lines = self.lines.lock().await;
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => Err(RecognitionError::NoSpeech),
            Ok(Some(line)) => {
                info!("Console Input: '{}'", line.trim());
                Ok(line.trim().to_string())
            }
            Ok(None) => Err(RecognitionError::Closed),
            Err(e) => Err(RecognitionError::Service(e.to_string())),
        }
    }
}
