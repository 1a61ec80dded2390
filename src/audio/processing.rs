use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ringbuf::traits::{Consumer, Observer};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::listener::ListenPolicy;
use crate::error::RecognitionError;

/// VAD debounce tuning. Frames are 30ms.
#[derive(Debug, Clone, Copy)]
pub struct SegmenterSettings {
    pub frame_ms: usize,
    /// Consecutive voiced frames before speech counts as started (90ms).
    pub min_speech_frames: usize,
    /// Consecutive silent frames that end the utterance (600ms).
    pub min_silence_frames: usize,
    /// Frames kept from before the start trigger so the first syllable survives.
    pub pre_roll_frames: usize,
}

impl Default for SegmenterSettings {
    fn default() -> Self {
        Self {
            frame_ms: 30,
            min_speech_frames: 3,
            min_silence_frames: 20,
            pre_roll_frames: 10,
        }
    }
}

/// Cuts one utterance out of the live sample stream using webrtc VAD.
pub struct UtteranceSegmenter<C>
where
    C: Consumer<Item = f32> + Send,
{
    consumer: C,
    sample_rate: u32,
    settings: SegmenterSettings,
    shutdown: Option<CancellationToken>,
}

impl<C> UtteranceSegmenter<C>
where
    C: Consumer<Item = f32> + Send,
{
    pub fn new(consumer: C, sample_rate: u32) -> Self {
        Self {
            consumer,
            sample_rate,
            settings: SegmenterSettings::default(),
            shutdown: None,
        }
    }

    /// Abandon a capture in progress once `token` is cancelled.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = Some(token);
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Blocks until a full utterance is captured, the policy timeout passes
    /// with no speech, or the phrase limit is hit.
    pub fn capture(&mut self, policy: &ListenPolicy) -> Result<Vec<f32>, RecognitionError> {
        let vad_rate = match self.sample_rate {
            8000 => webrtc_vad::SampleRate::Rate8kHz,
            16000 => webrtc_vad::SampleRate::Rate16kHz,
            32000 => webrtc_vad::SampleRate::Rate32kHz,
            48000 => webrtc_vad::SampleRate::Rate48kHz,
            other => {
                return Err(RecognitionError::Service(format!("Unsupported VAD Rate {}", other)));
            }
        };
        // Mode 3 is very aggressive (suppress noise).
        let mut vad = webrtc_vad::Vad::new_with_rate_and_mode(vad_rate, webrtc_vad::VadMode::Aggressive);

        let frame_size = (self.sample_rate as usize * self.settings.frame_ms) / 1000;
        let mut frame_f32 = vec![0.0f32; frame_size];
        let mut frame_i16 = vec![0i16; frame_size];

        let max_frames = policy
            .phrase_limit
            .map(|limit| (limit.as_millis() as usize / self.settings.frame_ms).max(1));

        // Anything buffered predates this listen (including our own voice).
        self.consumer.clear();

        let started_at = Instant::now();
        let mut pre_roll: VecDeque<Vec<f32>> = VecDeque::with_capacity(self.settings.pre_roll_frames);
        let mut utterance: Vec<f32> = Vec::new();
        let mut speaking = false;
        let mut speech_run = 0usize;
        let mut silence_run = 0usize;
        let mut voiced_frames = 0usize;

        loop {
            if self.shutdown.as_ref().is_some_and(CancellationToken::is_cancelled) {
                return Err(RecognitionError::Closed);
            }
            if self.consumer.occupied_len() < frame_size {
                if !speaking {
                    if let Some(timeout) = policy.timeout {
                        if started_at.elapsed() >= timeout {
                            debug!("Listen timeout after {:?}", timeout);
                            return Err(RecognitionError::NoSpeech);
                        }
                    }
                }
                std::thread::sleep(Duration::from_millis(10));
                continue;
            }

            let _ = self.consumer.pop_slice(&mut frame_f32);
            for (dst, &sample) in frame_i16.iter_mut().zip(frame_f32.iter()) {
                *dst = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            }

            let voiced = vad.is_voice_segment(&frame_i16).unwrap_or_else(|e| {
                debug!("VAD Error: {:?}", e);
                false
            });

            if voiced {
                silence_run = 0;
                speech_run += 1;
            } else {
                speech_run = 0;
                silence_run += 1;
            }

            if !speaking {
                pre_roll.push_back(frame_f32.clone());
                if pre_roll.len() > self.settings.pre_roll_frames {
                    pre_roll.pop_front();
                }
                if speech_run >= self.settings.min_speech_frames {
                    speaking = true;
                    info!("Audio Control: Speech START detected");
                    for frame in pre_roll.drain(..) {
                        utterance.extend_from_slice(&frame);
                    }
                    voiced_frames = speech_run;
                } else if let Some(timeout) = policy.timeout {
                    if started_at.elapsed() >= timeout {
                        return Err(RecognitionError::NoSpeech);
                    }
                }
                continue;
            }

            utterance.extend_from_slice(&frame_f32);
            if voiced {
                voiced_frames += 1;
            }

            let hit_limit = max_frames.is_some_and(|max| utterance.len() / frame_size >= max);
            if silence_run >= self.settings.min_silence_frames || hit_limit {
                info!(
                    "Audio Control: Speech END detected ({} ms, {} voiced frames)",
                    utterance.len() as u64 * 1000 / self.sample_rate as u64,
                    voiced_frames
                );
                return Ok(utterance);
            }
        }
    }
}
