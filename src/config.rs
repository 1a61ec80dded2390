use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Runtime configuration, read from the process environment (and `.env`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    pub llm: LlmConfig,
    pub stt: SttConfig,
    pub weather: WeatherConfig,
    pub browser: BrowserConfig,
    pub tts: TtsConfig,
    /// Extra `name=command` entries layered over the built-in app catalog.
    pub apps: Vec<(String, String)>,
    /// `None` means handler calls may block the loop indefinitely.
    pub handler_timeout: Option<Duration>,
    pub query_timeout: Duration,
    pub wake_pause: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub location: String,
    pub weather_url: String,
    pub geocode_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub browser_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    pub command: String,
    pub rate: u32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                api_key: None,
                base_url: "https://api.deepseek.com".to_string(),
                model: "deepseek-chat".to_string(),
            },
            stt: SttConfig {
                api_key: None,
                base_url: "https://api.groq.com/openai/v1".to_string(),
                model: "whisper-large-v3-turbo".to_string(),
            },
            weather: WeatherConfig {
                api_key: None,
                location: "Phnom Penh, Cambodia".to_string(),
                weather_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
                geocode_url: "https://nominatim.openstreetmap.org/search".to_string(),
            },
            browser: BrowserConfig {
                webdriver_url: "http://localhost:9515".to_string(),
                browser_name: "MicrosoftEdge".to_string(),
            },
            tts: TtsConfig {
                command: default_tts_command().to_string(),
                rate: 150,
            },
            apps: Vec::new(),
            handler_timeout: Some(Duration::from_secs(30)),
            query_timeout: Duration::from_secs(8),
            wake_pause: Duration::from_millis(1000),
        }
    }
}

fn default_tts_command() -> &'static str {
    if cfg!(target_os = "macos") {
        "say"
    } else {
        "espeak"
    }
}

impl AssistantConfig {
    /// Load `.env` (or the given file) and build the config from the environment.
    pub fn load(env_file: Option<&Path>) -> Result<Self, ConfigError> {
        match env_file {
            Some(path) => {
                dotenvy::from_path(path)?;
            }
            None => {
                // A missing .env is normal.
                if let Err(e) = dotenvy::dotenv() {
                    if !e.not_found() {
                        return Err(e.into());
                    }
                }
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        cfg.llm.api_key = get("LLM_API_KEY");
        if let Some(v) = get("LLM_BASE_URL") {
            cfg.llm.base_url = v;
        }
        if let Some(v) = get("LLM_MODEL") {
            cfg.llm.model = v;
        }

        cfg.stt.api_key = get("STT_API_KEY").or_else(|| cfg.llm.api_key.clone());
        if let Some(v) = get("STT_BASE_URL") {
            cfg.stt.base_url = v;
        }
        if let Some(v) = get("STT_MODEL") {
            cfg.stt.model = v;
        }

        cfg.weather.api_key = get("OPENWEATHER_API_KEY");
        if let Some(v) = get("BOB_LOCATION") {
            cfg.weather.location = v;
        }

        if let Some(v) = get("WEBDRIVER_URL") {
            cfg.browser.webdriver_url = v;
        }
        if let Some(v) = get("BOB_BROWSER") {
            cfg.browser.browser_name = v;
        }

        if let Some(v) = get("BOB_TTS_COMMAND") {
            cfg.tts.command = v;
        }
        if let Some(v) = get("BOB_TTS_RATE") {
            cfg.tts.rate = parse_number("BOB_TTS_RATE", &v)?;
        }

        if let Some(v) = get("BOB_APPS") {
            cfg.apps = parse_app_overrides(&v)?;
        }

        if let Some(v) = get("BOB_HANDLER_TIMEOUT_SECS") {
            cfg.handler_timeout = match parse_number::<u64>("BOB_HANDLER_TIMEOUT_SECS", &v)? {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            };
        }
        if let Some(v) = get("BOB_QUERY_TIMEOUT_SECS") {
            cfg.query_timeout = Duration::from_secs(parse_number("BOB_QUERY_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = get("BOB_WAKE_PAUSE_MS") {
            cfg.wake_pause = Duration::from_millis(parse_number("BOB_WAKE_PAUSE_MS", &v)?);
        }

        Ok(cfg)
    }
}

fn parse_number<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse::<T>().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

/// Parses `name=command;name=command`. Names are lowercased.
pub fn parse_app_overrides(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    let mut entries = Vec::new();
    for pair in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, command) = pair.split_once('=').ok_or_else(|| ConfigError::Invalid {
            key: "BOB_APPS",
            value: pair.to_string(),
        })?;
        let (name, command) = (name.trim().to_lowercase(), command.trim().to_string());
        if name.is_empty() || command.is_empty() {
            return Err(ConfigError::Invalid {
                key: "BOB_APPS",
                value: pair.to_string(),
            });
        }
        entries.push((name, command));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = AssistantConfig::from_lookup(lookup(&[])).unwrap();
        assert!(cfg.llm.api_key.is_none());
        assert_eq!(cfg.weather.location, "Phnom Penh, Cambodia");
        assert_eq!(cfg.handler_timeout, Some(Duration::from_secs(30)));
        assert_eq!(cfg.wake_pause, Duration::from_secs(1));
    }

    #[test]
    fn stt_key_falls_back_to_llm_key() {
        let cfg = AssistantConfig::from_lookup(lookup(&[("LLM_API_KEY", "sk-1")])).unwrap();
        assert_eq!(cfg.stt.api_key.as_deref(), Some("sk-1"));
    }

    #[test]
    fn zero_handler_timeout_disables_it() {
        let cfg =
            AssistantConfig::from_lookup(lookup(&[("BOB_HANDLER_TIMEOUT_SECS", "0")])).unwrap();
        assert_eq!(cfg.handler_timeout, None);
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let err = AssistantConfig::from_lookup(lookup(&[("BOB_QUERY_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "BOB_QUERY_TIMEOUT_SECS", .. }));
    }

    #[test]
    fn oversized_tts_rate_is_rejected() {
        let err = AssistantConfig::from_lookup(lookup(&[("BOB_TTS_RATE", "4294967296")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "BOB_TTS_RATE", .. }));

        let cfg = AssistantConfig::from_lookup(lookup(&[("BOB_TTS_RATE", "180")])).unwrap();
        assert_eq!(cfg.tts.rate, 180);
    }

    #[test]
    fn app_overrides_are_lowercased() {
        let apps = parse_app_overrides("Terminal=gnome-terminal; spotify = spotify --minimized").unwrap();
        assert_eq!(
            apps,
            vec![
                ("terminal".to_string(), "gnome-terminal".to_string()),
                ("spotify".to_string(), "spotify --minimized".to_string()),
            ]
        );
        assert!(parse_app_overrides("broken").is_err());
    }
}
