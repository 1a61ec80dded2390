use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::scheduler::{AlarmRegistry, ScheduleEntry, ScheduleKind};
use super::speech::phrases::TIMER_DONE;
use super::time::TICK_INTERVAL;
use crate::audio::alert::{AlertDevice, ALARM_DURATION, ALARM_FREQUENCY_HZ};
use crate::outputs::speech::SpeechOutput;

/// Background poller that fires due alarms and timers.
pub struct Ticker {
    registry: Arc<AlarmRegistry>,
    alert: Arc<dyn AlertDevice>,
    speech: Arc<dyn SpeechOutput>,
    period: Duration,
}

impl Ticker {
    pub fn new(registry: Arc<AlarmRegistry>, alert: Arc<dyn AlertDevice>, speech: Arc<dyn SpeechOutput>) -> Self {
        Self {
            registry,
            alert,
            speech,
            period: TICK_INTERVAL,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// One scan: claim everything due, sound it, then drop it from the registry.
    /// Returns the entries that fired.
    pub async fn tick_once(&self) -> Vec<ScheduleEntry> {
        let now = self.registry.clock().now();
        let due = self.registry.claim_due(now);

        let mut fired = Vec::with_capacity(due.len());
        for entry in due {
            self.fire(&entry).await;
            if self.registry.complete(entry.id) {
                fired.push(entry);
            }
        }
        fired
    }

    async fn fire(&self, entry: &ScheduleEntry) {
        match entry.kind {
            ScheduleKind::Alarm => {
                info!("Wake up! Alarm for {} is ringing", entry.due.format("%I:%M %p"));
            }
            ScheduleKind::Timer { seconds } => {
                info!("Timer is up! ({}s)", seconds);
                if let Err(e) = self.speech.speak(TIMER_DONE).await {
                    warn!("Timer announcement failed: {}", e);
                }
            }
        }
        if let Err(e) = self.alert.beep(ALARM_FREQUENCY_HZ, ALARM_DURATION).await {
            warn!("Alarm sound failed: {}", e);
        }
    }

    /// Polls until `shutdown` is cancelled. A late tick fires late; nothing is skipped
    /// because every scan covers all entries due so far.
    pub async fn run(self, shutdown: CancellationToken) {
        info!("Ticker started. Period: {:?}", self.period);
        let mut cadence = interval(self.period);
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = cadence.tick() => {
                    self.tick_once().await;
                }
            }
        }
        info!("Ticker stopped");
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
