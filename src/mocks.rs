//! In-process stand-ins for every external seam. Used by the integration
//! tests and handy for wiring the dispatcher without a microphone or network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::audio::alert::AlertDevice;
use crate::audio::listener::{ListenPolicy, SpeechInput};
use crate::error::{AlertError, ApiError, AutomationError, RecognitionError, SpeechError};
use crate::outputs::speech::SpeechOutput;
use crate::services::browser::BrowserDriver;
use crate::services::launcher::ProcessLauncher;
use crate::services::llm::ChatModel;
use crate::services::weather::{Geocoder, WeatherReport, WeatherService};

fn guard<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Replays a fixed script of recognition results, then reports `Closed`.
#[derive(Default)]
pub struct ScriptedListener {
    script: Mutex<VecDeque<Result<String, RecognitionError>>>,
    policies: Mutex<Vec<ListenPolicy>>,
}

impl ScriptedListener {
    pub fn new<I>(script: I) -> Self
    where
        I: IntoIterator<Item = Result<String, RecognitionError>>,
    {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            policies: Mutex::new(Vec::new()),
        }
    }

    /// Every utterance recognized cleanly.
    pub fn lines(lines: &[&str]) -> Self {
        Self::new(lines.iter().map(|l| Ok(l.to_string())))
    }

    /// Policies seen so far, in call order.
    pub fn policies(&self) -> Vec<ListenPolicy> {
        guard(&self.policies).clone()
    }

    pub fn remaining(&self) -> usize {
        guard(&self.script).len()
    }
}

#[async_trait]
impl SpeechInput for ScriptedListener {
    async fn listen(&self, policy: ListenPolicy) -> Result<String, RecognitionError> {
        guard(&self.policies).push(policy);
        guard(&self.script).pop_front().unwrap_or(Err(RecognitionError::Closed))
    }
}

#[derive(Default)]
pub struct RecordingSpeaker {
    spoken: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingSpeaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records each line but reports an engine failure.
    pub fn failing() -> Self {
        Self {
            spoken: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn spoken(&self) -> Vec<String> {
        guard(&self.spoken).clone()
    }
}

#[async_trait]
impl SpeechOutput for RecordingSpeaker {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        guard(&self.spoken).push(text.to_string());
        if self.fail {
            return Err(SpeechError::Engine("speaker unplugged".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingAlert {
    beeps: Mutex<Vec<(u32, Duration)>>,
}

impl RecordingAlert {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn beeps(&self) -> Vec<(u32, Duration)> {
        guard(&self.beeps).clone()
    }

    pub fn count(&self) -> usize {
        guard(&self.beeps).len()
    }
}

#[async_trait]
impl AlertDevice for RecordingAlert {
    async fn beep(&self, frequency_hz: u32, duration: Duration) -> Result<(), AlertError> {
        guard(&self.beeps).push((frequency_hz, duration));
        Ok(())
    }
}

/// Answers every prompt with the same text and remembers the user messages.
pub struct StubChatModel {
    answer: String,
    prompts: Mutex<Vec<(String, String)>>,
}

impl StubChatModel {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// `(system, user)` pairs in call order.
    pub fn prompts(&self) -> Vec<(String, String)> {
        guard(&self.prompts).clone()
    }
}

#[async_trait]
impl ChatModel for StubChatModel {
    async fn complete(&self, system_prompt: &str, user_message: &str) -> Result<String, ApiError> {
        guard(&self.prompts).push((system_prompt.to_string(), user_message.to_string()));
        Ok(self.answer.clone())
    }
}

#[derive(Default)]
pub struct FailingChatModel;

#[async_trait]
impl ChatModel for FailingChatModel {
    async fn complete(&self, _system_prompt: &str, _user_message: &str) -> Result<String, ApiError> {
        Err(ApiError::Status {
            status: 503,
            body: "upstream unavailable".to_string(),
        })
    }
}

/// Never answers.
#[derive(Default)]
pub struct HangingChatModel;

#[async_trait]
impl ChatModel for HangingChatModel {
    async fn complete(&self, _system_prompt: &str, _user_message: &str) -> Result<String, ApiError> {
        std::future::pending().await
    }
}

pub struct StubGeocoder {
    result: Result<Option<(f64, f64)>, String>,
    calls: AtomicUsize,
}

impl StubGeocoder {
    pub fn found(lat: f64, lon: f64) -> Self {
        Self {
            result: Ok(Some((lat, lon))),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn not_found() -> Self {
        Self {
            result: Ok(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn geocode(&self, _place: &str) -> Result<Option<(f64, f64)>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map_err(ApiError::Malformed)
    }
}

pub enum StubWeather {
    Report(WeatherReport),
    MissingKey,
    Failing,
}

impl StubWeather {
    pub fn report(temp_c: f64, description: &str, city_name: &str) -> Self {
        Self::Report(WeatherReport {
            temp_c,
            description: description.to_string(),
            city_name: city_name.to_string(),
        })
    }
}

#[async_trait]
impl WeatherService for StubWeather {
    async fn current_weather(&self, _lat: f64, _lon: f64) -> Result<WeatherReport, ApiError> {
        match self {
            Self::Report(report) => Ok(report.clone()),
            Self::MissingKey => Err(ApiError::MissingKey("OPENWEATHER_API_KEY")),
            Self::Failing => Err(ApiError::Status {
                status: 401,
                body: "invalid api key".to_string(),
            }),
        }
    }
}

/// Remembers launched command lines instead of spawning them.
#[derive(Default)]
pub struct RecordingLauncher {
    launched: Mutex<Vec<String>>,
    failure: Option<String>,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            launched: Mutex::new(Vec::new()),
            failure: Some(message.to_string()),
        }
    }

    pub fn launched(&self) -> Vec<String> {
        guard(&self.launched).clone()
    }
}

impl ProcessLauncher for RecordingLauncher {
    fn launch(&self, command: &str) -> Result<(), AutomationError> {
        guard(&self.launched).push(command.to_string());
        match &self.failure {
            Some(message) => Err(AutomationError::Launch(message.clone())),
            None => Ok(()),
        }
    }
}

/// Logs browser actions as strings like `open https://...` or `type <selector> <text>`.
#[derive(Default)]
pub struct RecordingBrowser {
    actions: Mutex<Vec<String>>,
    failure: Option<String>,
}

impl RecordingBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails on the first action.
    pub fn failing(message: &str) -> Self {
        Self {
            actions: Mutex::new(Vec::new()),
            failure: Some(message.to_string()),
        }
    }

    pub fn actions(&self) -> Vec<String> {
        guard(&self.actions).clone()
    }

    fn record(&self, action: String) -> Result<(), AutomationError> {
        guard(&self.actions).push(action);
        match &self.failure {
            Some(message) => Err(AutomationError::Browser(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BrowserDriver for RecordingBrowser {
    async fn open_url(&self, url: &str) -> Result<(), AutomationError> {
        self.record(format!("open {}", url))
    }

    async fn type_into(&self, selector: &str, text: &str) -> Result<(), AutomationError> {
        self.record(format!("type {} {}", selector, text))
    }

    async fn press_enter(&self) -> Result<(), AutomationError> {
        self.record("enter".to_string())
    }

    async fn click_first_matching(&self, selector: &str) -> Result<(), AutomationError> {
        self.record(format!("click {}", selector))
    }

    async fn close(&self) -> Result<(), AutomationError> {
        guard(&self.actions).push("close".to_string());
        Ok(())
    }
}
