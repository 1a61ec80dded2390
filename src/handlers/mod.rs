//! Capability handlers. Each turns an intent into the sentence Bob speaks;
//! failures come back as apologies, never as errors.

pub mod apps;
pub mod conversation;
pub mod media;
pub mod weather;

use std::sync::Arc;

use tracing::info;

use crate::kernel::intent::Intent;
use crate::kernel::scheduler::AlarmRegistry;
use crate::kernel::speech::phrases::{RETRY_DURATION, RETRY_TIME};
use crate::kernel::timeparse::TimeParser;

pub use apps::{AppCatalog, AppLauncher};
pub use conversation::Conversation;
pub use media::MediaPlayer;
pub use weather::WeatherReporter;

pub struct Capabilities {
    pub apps: AppLauncher,
    pub media: MediaPlayer,
    pub weather: WeatherReporter,
    pub conversation: Conversation,
    pub registry: Arc<AlarmRegistry>,
    pub time_parser: Arc<dyn TimeParser>,
}

impl Capabilities {
    pub async fn execute(&self, intent: &Intent) -> String {
        match intent {
            Intent::OpenApp { app_name } => self.apps.open(app_name),
            Intent::PlayMedia { song_name } => self.media.play(song_name).await,
            Intent::SetAlarm { expression } => self.set_alarm(expression),
            Intent::SetTimer { seconds: Some(seconds) } => self.registry.set_timer(*seconds),
            Intent::SetTimer { seconds: None } => RETRY_DURATION.to_string(),
            Intent::GetWeather => self.weather.report().await,
            Intent::Converse { query } => self.conversation.converse(query).await,
        }
    }

    fn set_alarm(&self, expression: &str) -> String {
        let now = self.registry.clock().now();
        match self.time_parser.parse(expression, now) {
            Some(at) => self.registry.set_alarm(at),
            None => {
                info!("Could not parse alarm time from '{}'", expression);
                RETRY_TIME.to_string()
            }
        }
    }
}
