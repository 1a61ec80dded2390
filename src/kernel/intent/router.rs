use super::types::{Intent, IntentKind};
use crate::kernel::timeparse::parse_duration_seconds;

/// One routing rule: queries containing `keyword` go to `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub keyword: &'static str,
    pub kind: IntentKind,
}

impl Route {
    pub fn matches(&self, lowered_query: &str) -> bool {
        lowered_query.contains(self.keyword)
    }
}

/// Routing order. The first matching route wins; anything unmatched is
/// conversation. Behavior depends on this order (e.g. "open the weather app"
/// opens an app), so it is a fixed total order rather than a best match.
pub const INTENT_PRIORITY: [Route; 5] = [
    Route { keyword: "open", kind: IntentKind::OpenApp },
    Route { keyword: "play", kind: IntentKind::PlayMedia },
    Route { keyword: "set alarm", kind: IntentKind::SetAlarm },
    Route { keyword: "set timer", kind: IntentKind::SetTimer },
    Route { keyword: "weather", kind: IntentKind::GetWeather },
];

#[derive(Debug, Default, Clone, Copy)]
pub struct IntentRouter;

impl IntentRouter {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, query: &str) -> Intent {
        classify(query)
    }
}

/// Classifies a query. Arguments are taken from the lowercased query with
/// every occurrence of the trigger keyword removed.
pub fn classify(query: &str) -> Intent {
    let lowered = query.to_lowercase();

    let Some(route) = INTENT_PRIORITY.iter().find(|r| r.matches(&lowered)) else {
        return Intent::Converse {
            query: query.trim().to_string(),
        };
    };

    let argument = strip_keyword(&lowered, route.keyword);
    match route.kind {
        IntentKind::OpenApp => Intent::OpenApp { app_name: argument },
        IntentKind::PlayMedia => Intent::PlayMedia { song_name: argument },
        IntentKind::SetAlarm => Intent::SetAlarm { expression: argument },
        IntentKind::SetTimer => Intent::SetTimer {
            seconds: parse_duration_seconds(&argument),
        },
        IntentKind::GetWeather => Intent::GetWeather,
        IntentKind::Converse => Intent::Converse {
            query: query.trim().to_string(),
        },
    }
}

/// Removes `keyword` and collapses the leftover whitespace.
pub fn strip_keyword(lowered: &str, keyword: &str) -> String {
    lowered
        .replace(keyword, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
