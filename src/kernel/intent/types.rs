use serde::{Deserialize, Serialize};

/// Which handler a query is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentKind {
    OpenApp,
    PlayMedia,
    SetAlarm,
    SetTimer,
    GetWeather,
    Converse,
}

/// A classified query with its handler argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    OpenApp { app_name: String },
    PlayMedia { song_name: String },
    /// Free-text time expression, parsed by the handler.
    SetAlarm { expression: String },
    /// `None` when no duration could be read from the query.
    SetTimer { seconds: Option<u64> },
    GetWeather,
    /// The query as heard, unmodified.
    Converse { query: String },
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::OpenApp { .. } => IntentKind::OpenApp,
            Intent::PlayMedia { .. } => IntentKind::PlayMedia,
            Intent::SetAlarm { .. } => IntentKind::SetAlarm,
            Intent::SetTimer { .. } => IntentKind::SetTimer,
            Intent::GetWeather => IntentKind::GetWeather,
            Intent::Converse { .. } => IntentKind::Converse,
        }
    }
}
