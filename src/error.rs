//! Error taxonomy for the assistant.
//!
//! Listening-stage failures (`RecognitionError`) are logged and retried in
//! silence. Everything raised while handling a query is caught at the handler
//! boundary and turned into a spoken apology.

/// Speech capture or transcription failed.
#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    /// Nothing was said before the listen timeout.
    #[error("no speech detected")]
    NoSpeech,

    /// Audio was captured but produced no usable text.
    #[error("could not understand audio")]
    Unintelligible,

    /// The transcription backend or audio device failed.
    #[error("recognition service error: {0}")]
    Service(String),

    /// The input source is gone (console EOF, device removed).
    #[error("input source closed")]
    Closed,
}

/// Network or service failure from a hosted API (LLM, weather, geocoding, STT).
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("missing API key: {0}")]
    MissingKey(&'static str),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Process launch or browser automation failure.
#[derive(Debug, thiserror::Error)]
pub enum AutomationError {
    #[error("launch failed: {0}")]
    Launch(String),

    #[error("browser error: {0}")]
    Browser(String),

    /// The driver no longer knows the session; a new one must be opened.
    #[error("browser session lost: {0}")]
    SessionLost(String),

    #[error("webdriver http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Text-to-speech engine failure.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("speech engine error: {0}")]
    Engine(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Audible alert device failure.
#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("alert device error: {0}")]
    Device(String),
}

/// Invalid or unreadable configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("env file error: {0}")]
    Env(#[from] dotenvy::Error),
}
