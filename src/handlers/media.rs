use std::sync::Arc;

use tracing::{info, warn};

use crate::error::AutomationError;
use crate::services::browser::BrowserDriver;

pub const YOUTUBE_URL: &str = "https://www.youtube.com";
pub const SEARCH_BOX: &str = "input[name='search_query']";
pub const FIRST_RESULT: &str = "#video-title";

/// Plays a song by searching YouTube in the shared browser session.
pub struct MediaPlayer {
    browser: Arc<dyn BrowserDriver>,
}

impl MediaPlayer {
    pub fn new(browser: Arc<dyn BrowserDriver>) -> Self {
        Self { browser }
    }

    pub async fn play(&self, song_name: &str) -> String {
        let song_name = song_name.trim();
        if song_name.is_empty() {
            return "Sorry, I didn't catch what to play.".to_string();
        }
        match self.search_and_play(song_name).await {
            Ok(()) => {
                info!("Playing {} on YouTube...", song_name);
                format!("Playing {} on YouTube...", song_name)
            }
            Err(e) => {
                warn!("An error occurred while trying to play music: {}", e);
                format!("Sorry, I couldn't play {}: {}", song_name, e)
            }
        }
    }

    async fn search_and_play(&self, song_name: &str) -> Result<(), AutomationError> {
        self.browser.open_url(YOUTUBE_URL).await?;
        self.browser.type_into(SEARCH_BOX, song_name).await?;
        self.browser.press_enter().await?;
        self.browser.click_first_matching(FIRST_RESULT).await
    }
}
