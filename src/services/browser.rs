//! Minimal W3C WebDriver client for driving a desktop browser.
//!
//! Talks to a running driver (`msedgedriver`, `chromedriver`, `geckodriver`).
//! The browser session is opened on first use, reused for the life of the
//! process, and deleted by [`BrowserDriver::close`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::BrowserConfig;
use crate::error::AutomationError;

/// W3C element reference key.
const ELEMENT_KEY: &str = "element-6066-11e4-a52a-4f735466cecf";
/// WebDriver code point for the Enter key.
const ENTER_KEY: &str = "\u{E007}";
/// W3C error code for a session the driver has dropped.
const INVALID_SESSION: &str = "invalid session id";

#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn open_url(&self, url: &str) -> Result<(), AutomationError>;
    async fn type_into(&self, selector: &str, text: &str) -> Result<(), AutomationError>;
    /// Sends Enter to the element last typed into.
    async fn press_enter(&self) -> Result<(), AutomationError>;
    /// Waits for at least one match, then clicks the first.
    async fn click_first_matching(&self, selector: &str) -> Result<(), AutomationError>;
    async fn close(&self) -> Result<(), AutomationError>;
}

#[derive(Debug, Default)]
struct Session {
    id: Option<String>,
    focused: Option<String>,
}

impl Session {
    /// Forgets the session when the driver reports it gone, so the next call opens a fresh one.
    fn settle<T>(&mut self, result: Result<T, AutomationError>) -> Result<T, AutomationError> {
        if let Err(AutomationError::SessionLost(reason)) = &result {
            warn!("Browser session {} lost: {}", self.id.as_deref().unwrap_or("?"), reason);
            self.id = None;
            self.focused = None;
        }
        result
    }
}

pub struct WebDriverBrowser {
    client: Client,
    base_url: String,
    browser_name: String,
    session: Mutex<Session>,
    result_poll: Duration,
    result_attempts: u32,
}

impl WebDriverBrowser {
    pub fn new(config: &BrowserConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            base_url: config.webdriver_url.trim_end_matches('/').to_string(),
            browser_name: config.browser_name.clone(),
            session: Mutex::new(Session::default()),
            result_poll: Duration::from_millis(500),
            result_attempts: 12,
        }
    }

    /// Overrides how long `click_first_matching` waits for results.
    pub fn with_result_polling(mut self, interval: Duration, attempts: u32) -> Self {
        self.result_poll = interval;
        self.result_attempts = attempts.max(1);
        self
    }

    fn capabilities(&self) -> Value {
        let args = json!({ "args": ["--start-maximized"] });
        let mut always = json!({ "browserName": self.browser_name });
        let options_key = match self.browser_name.to_lowercase().as_str() {
            "microsoftedge" | "msedge" | "edge" => Some("ms:edgeOptions"),
            "chrome" | "chromium" => Some("goog:chromeOptions"),
            _ => None,
        };
        if let (Some(key), Some(obj)) = (options_key, always.as_object_mut()) {
            obj.insert(key.to_string(), args);
        }
        json!({ "capabilities": { "alwaysMatch": always } })
    }

    async fn send(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> Result<Value, AutomationError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        let payload: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = payload
                .pointer("/value/message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            let detail = format!("{} {}: {}", status.as_u16(), path, message);
            if payload.pointer("/value/error").and_then(Value::as_str) == Some(INVALID_SESSION) {
                return Err(AutomationError::SessionLost(detail));
            }
            return Err(AutomationError::Browser(detail));
        }
        Ok(payload.get("value").cloned().unwrap_or(Value::Null))
    }

    /// Returns the live session id, creating the session on first use.
    async fn session_id(&self, session: &mut Session) -> Result<String, AutomationError> {
        if let Some(id) = &session.id {
            return Ok(id.clone());
        }
        let value = self
            .send(reqwest::Method::POST, "/session", Some(self.capabilities()))
            .await?;
        let id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| AutomationError::Browser("driver returned no sessionId".to_string()))?
            .to_string();
        info!("Browser session started: {}", id);
        session.id = Some(id.clone());
        Ok(id)
    }

    async fn find_element(&self, sid: &str, selector: &str) -> Result<String, AutomationError> {
        let value = self
            .send(
                reqwest::Method::POST,
                &format!("/session/{}/element", sid),
                Some(json!({ "using": "css selector", "value": selector })),
            )
            .await?;
        element_id(&value).ok_or_else(|| AutomationError::Browser(format!("no element for {}", selector)))
    }

    async fn send_keys(&self, sid: &str, element: &str, text: &str) -> Result<(), AutomationError> {
        self.send(
            reqwest::Method::POST,
            &format!("/session/{}/element/{}/value", sid, element),
            Some(json!({ "text": text })),
        )
        .await
        .map(|_| ())
    }

    async fn click_first(&self, sid: &str, selector: &str) -> Result<(), AutomationError> {
        for attempt in 1..=self.result_attempts {
            let value = self
                .send(
                    reqwest::Method::POST,
                    &format!("/session/{}/elements", sid),
                    Some(json!({ "using": "css selector", "value": selector })),
                )
                .await?;
            let first = value.as_array().and_then(|items| items.iter().find_map(element_id));
            if let Some(element) = first {
                self.send(
                    reqwest::Method::POST,
                    &format!("/session/{}/element/{}/click", sid, element),
                    Some(json!({})),
                )
                .await?;
                return Ok(());
            }
            debug!("No match for {} yet (attempt {})", selector, attempt);
            tokio::time::sleep(self.result_poll).await;
        }
        Err(AutomationError::Browser(format!("no results matched {}", selector)))
    }
}

fn element_id(value: &Value) -> Option<String> {
    value.get(ELEMENT_KEY).and_then(Value::as_str).map(str::to_string)
}

#[async_trait]
impl BrowserDriver for WebDriverBrowser {
    async fn open_url(&self, url: &str) -> Result<(), AutomationError> {
        let mut session = self.session.lock().await;
        let sid = self.session_id(&mut session).await?;
        let result = self
            .send(
                reqwest::Method::POST,
                &format!("/session/{}/url", sid),
                Some(json!({ "url": url })),
            )
            .await;
        session.settle(result)?;
        session.focused = None;
        Ok(())
    }

    async fn type_into(&self, selector: &str, text: &str) -> Result<(), AutomationError> {
        let mut session = self.session.lock().await;
        let sid = self.session_id(&mut session).await?;
        let result = match self.find_element(&sid, selector).await {
            Ok(element) => self.send_keys(&sid, &element, text).await.map(|_| element),
            Err(e) => Err(e),
        };
        let element = session.settle(result)?;
        session.focused = Some(element);
        Ok(())
    }

    async fn press_enter(&self) -> Result<(), AutomationError> {
        let mut session = self.session.lock().await;
        let sid = self.session_id(&mut session).await?;
        let element = session
            .focused
            .clone()
            .ok_or_else(|| AutomationError::Browser("nothing has been typed into".to_string()))?;
        let result = self.send_keys(&sid, &element, ENTER_KEY).await;
        session.settle(result)
    }

    async fn click_first_matching(&self, selector: &str) -> Result<(), AutomationError> {
        let mut session = self.session.lock().await;
        let sid = self.session_id(&mut session).await?;
        let result = self.click_first(&sid, selector).await;
        session.settle(result)
    }

    async fn close(&self) -> Result<(), AutomationError> {
        let mut session = self.session.lock().await;
        let Some(sid) = session.id.take() else {
            return Ok(());
        };
        session.focused = None;
        match self
            .send(reqwest::Method::DELETE, &format!("/session/{}", sid), None)
            .await
        {
            Ok(_) => {
                info!("Browser session closed: {}", sid);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to close browser session {}: {}", sid, e);
                Err(e)
            }
        }
    }
}
