use std::time::Duration;

use async_trait::async_trait;
use rodio::Source;
use tracing::debug;

use crate::error::AlertError;

/// Alarm tone used for both alarms and timers.
pub const ALARM_FREQUENCY_HZ: u32 = 2500;
pub const ALARM_DURATION: Duration = Duration::from_millis(2000);

#[async_trait]
pub trait AlertDevice: Send + Sync {
    /// Plays a tone and returns when it has finished.
    async fn beep(&self, frequency_hz: u32, duration: Duration) -> Result<(), AlertError>;
}

/// Sine-wave beeper on the default output device.
#[derive(Debug, Clone, Copy)]
pub struct RodioBeeper {
    volume: f32,
}

impl RodioBeeper {
    pub fn new() -> Self {
        Self { volume: 0.4 }
    }
}

impl Default for RodioBeeper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertDevice for RodioBeeper {
    async fn beep(&self, frequency_hz: u32, duration: Duration) -> Result<(), AlertError> {
        let volume = self.volume;
        debug!("Beep {}Hz for {:?}", frequency_hz, duration);

        // The output stream is not Send; open and drive it on a blocking thread.
        tokio::task::spawn_blocking(move || {
            let (_stream, handle) = rodio::OutputStream::try_default()
                .map_err(|e| AlertError::Device(e.to_string()))?;
            let sink = rodio::Sink::try_new(&handle).map_err(|e| AlertError::Device(e.to_string()))?;
            let tone = rodio::source::SineWave::new(frequency_hz as f32)
                .take_duration(duration)
                .amplify(volume);
            sink.append(tone);
            sink.sleep_until_end();
            Ok(())
        })
        .await
        .map_err(|e| AlertError::Device(format!("beep task failed: {}", e)))?
    }
}
