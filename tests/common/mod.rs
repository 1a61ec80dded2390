#![allow(dead_code)]

use std::sync::Arc;

use bob::handlers::{AppCatalog, AppLauncher, Capabilities, Conversation, MediaPlayer, WeatherReporter};
use bob::kernel::scheduler::AlarmRegistry;
use bob::kernel::time::ManualClock;
use bob::kernel::timeparse::NaturalTimeParser;
use bob::mocks::{RecordingBrowser, RecordingLauncher, StubChatModel, StubGeocoder, StubWeather};
use bob::services::llm::ChatModel;
use chrono::{DateTime, Local, TimeZone};

/// Mid-June, clear of any DST transition.
pub fn fixed_now() -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 6, 15, 10, 0, 0).unwrap()
}

pub fn at(day: u32, hour: u32, minute: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 6, day, hour, minute, 0).unwrap()
}

/// Handles onto the fakes behind a `Capabilities` bundle.
pub struct Rig {
    pub clock: Arc<ManualClock>,
    pub registry: Arc<AlarmRegistry>,
    pub launcher: Arc<RecordingLauncher>,
    pub browser: Arc<RecordingBrowser>,
}

pub fn capabilities_with(chat: Arc<dyn ChatModel>) -> (Capabilities, Rig) {
    let clock = Arc::new(ManualClock::new(fixed_now()));
    let registry = Arc::new(AlarmRegistry::new(clock.clone()));
    let launcher = Arc::new(RecordingLauncher::new());
    let browser = Arc::new(RecordingBrowser::new());

    let catalog = AppCatalog::from_entries([
        ("notepad".to_string(), "notepad.exe".to_string()),
        ("calculator".to_string(), "calc".to_string()),
    ]);

    let capabilities = Capabilities {
        apps: AppLauncher::new(catalog, launcher.clone()),
        media: MediaPlayer::new(browser.clone()),
        weather: WeatherReporter::new(
            Arc::new(StubGeocoder::found(11.56, 104.92)),
            Arc::new(StubWeather::report(31.5, "scattered clouds", "Phnom Penh")),
            "Phnom Penh, Cambodia",
        ),
        conversation: Conversation::new(chat),
        registry: registry.clone(),
        time_parser: Arc::new(NaturalTimeParser::new()),
    };

    (
        capabilities,
        Rig {
            clock,
            registry,
            launcher,
            browser,
        },
    )
}

pub fn capabilities() -> (Capabilities, Rig) {
    capabilities_with(Arc::new(StubChatModel::new("Doing great, thanks for asking!")))
}
