//! Wire-format checks for the hosted services, against a local mock server.

use bob::config::{BrowserConfig, LlmConfig, SttConfig, WeatherConfig};
use bob::error::{ApiError, AutomationError};
use bob::handlers::MediaPlayer;
use bob::services::browser::{BrowserDriver, WebDriverBrowser};
use bob::services::llm::{ChatModel, OpenAiChatClient};
use bob::services::stt::Transcriber;
use bob::services::weather::{Geocoder, NominatimGeocoder, OpenWeatherClient, WeatherService};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ELEMENT_KEY: &str = "element-6066-11e4-a52a-4f735466cecf";

fn llm_config(server: &MockServer, key: Option<&str>) -> LlmConfig {
    LlmConfig {
        api_key: key.map(str::to_string),
        base_url: server.uri(),
        model: "deepseek-chat".to_string(),
    }
}

fn weather_config(server: &MockServer, key: Option<&str>) -> WeatherConfig {
    WeatherConfig {
        api_key: key.map(str::to_string),
        location: "Phnom Penh, Cambodia".to_string(),
        weather_url: format!("{}/data/2.5/weather", server.uri()),
        geocode_url: format!("{}/search", server.uri()),
    }
}

#[tokio::test]
async fn chat_request_carries_persona_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "deepseek-chat",
            "stream": false,
            "messages": [
                {"role": "system", "content": "be nice"},
                {"role": "user", "content": "hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "  Hey buddy!  "}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiChatClient::new(&llm_config(&server, Some("sk-test")));
    assert_eq!(client.complete("be nice", "hello").await.unwrap(), "Hey buddy!");
}

#[tokio::test]
async fn chat_error_status_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let client = OpenAiChatClient::new(&llm_config(&server, Some("sk-test")));
    let err = client.complete("sys", "hi").await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 500, .. }));
}

#[tokio::test]
async fn chat_without_key_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = OpenAiChatClient::new(&llm_config(&server, None));
    let err = client.complete("sys", "hi").await.unwrap_err();
    assert!(matches!(err, ApiError::MissingKey("LLM_API_KEY")));
}

#[tokio::test]
async fn geocoder_reads_string_coordinates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Phnom Penh, Cambodia"))
        .and(query_param("format", "json"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"lat": "11.5683", "lon": "104.9224", "display_name": "Phnom Penh"}
        ])))
        .mount(&server)
        .await;

    let geocoder = NominatimGeocoder::new(&weather_config(&server, None));
    let (lat, lon) = geocoder.geocode("Phnom Penh, Cambodia").await.unwrap().unwrap();
    assert!((lat - 11.5683).abs() < 1e-9);
    assert!((lon - 104.9224).abs() < 1e-9);
}

#[tokio::test]
async fn geocoder_empty_result_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let geocoder = NominatimGeocoder::new(&weather_config(&server, None));
    assert_eq!(geocoder.geocode("Atlantis").await.unwrap(), None);
}

#[tokio::test]
async fn weather_uses_metric_units() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("appid", "w-key"))
        .and(query_param("units", "metric"))
        .and(query_param("lat", "11.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "main": {"temp": 30.2, "humidity": 70},
            "weather": [{"main": "Rain", "description": "light rain"}],
            "name": "Phnom Penh"
        })))
        .mount(&server)
        .await;

    let client = OpenWeatherClient::new(&weather_config(&server, Some("w-key")));
    let report = client.current_weather(11.5, 104.9).await.unwrap();
    assert_eq!(report.city_name, "Phnom Penh");
    assert_eq!(report.description, "light rain");
    assert!((report.temp_c - 30.2).abs() < 1e-9);
}

#[tokio::test]
async fn weather_without_key_is_missing_key() {
    let server = MockServer::start().await;
    let client = OpenWeatherClient::new(&weather_config(&server, None));
    let err = client.current_weather(0.0, 0.0).await.unwrap_err();
    assert!(matches!(err, ApiError::MissingKey("OPENWEATHER_API_KEY")));
}

#[tokio::test]
async fn transcriber_posts_wav_and_trims_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .and(header("authorization", "Bearer stt-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": " Hey Bob. "})))
        .expect(1)
        .mount(&server)
        .await;

    let transcriber = Transcriber::new(&SttConfig {
        api_key: Some("stt-key".to_string()),
        base_url: server.uri(),
        model: "whisper-large-v3-turbo".to_string(),
    });
    let wav = bob::audio::wav::encode_wav(&[0.0; 1600], 16_000).unwrap();
    assert_eq!(transcriber.transcribe(wav).await.unwrap(), "Hey Bob.");
}

async fn mount_webdriver(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/session"))
        .and(body_partial_json(json!({
            "capabilities": {"alwaysMatch": {"browserName": "MicrosoftEdge"}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": {"sessionId": "s1", "capabilities": {}}
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s1/url"))
        .and(body_partial_json(json!({"url": "https://www.youtube.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": null})))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s1/element"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": {ELEMENT_KEY: "search"}
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s1/element/search/value"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": null})))
        .expect(2)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s1/elements"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{ELEMENT_KEY: "video1"}, {ELEMENT_KEY: "video2"}]
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s1/element/video1/click"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": null})))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/session/s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": null})))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn webdriver_session_is_lazy_and_reused() {
    let server = MockServer::start().await;
    mount_webdriver(&server).await;

    let browser = Arc::new(WebDriverBrowser::new(&BrowserConfig {
        webdriver_url: server.uri(),
        browser_name: "MicrosoftEdge".to_string(),
    }));
    let player = MediaPlayer::new(browser.clone());

    assert_eq!(player.play("lofi beats").await, "Playing lofi beats on YouTube...");
    browser.close().await.unwrap();
    // Closing twice is a no-op.
    browser.close().await.unwrap();
}

#[tokio::test]
async fn webdriver_gives_up_when_no_results_appear() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": {"sessionId": "s2"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s2/elements"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(3)
        .mount(&server)
        .await;

    let browser = WebDriverBrowser::new(&BrowserConfig {
        webdriver_url: server.uri(),
        browser_name: "chrome".to_string(),
    })
    .with_result_polling(Duration::from_millis(1), 3);

    let err = browser.click_first_matching("#video-title").await.unwrap_err();
    assert!(err.to_string().contains("no results matched"));
}

#[tokio::test]
async fn webdriver_error_message_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "value": {"error": "session not created", "message": "msedgedriver version mismatch"}
        })))
        .mount(&server)
        .await;

    let browser = WebDriverBrowser::new(&BrowserConfig {
        webdriver_url: server.uri(),
        browser_name: "MicrosoftEdge".to_string(),
    });
    let err = browser.open_url("https://www.youtube.com").await.unwrap_err();
    assert!(err.to_string().contains("msedgedriver version mismatch"));
}

#[tokio::test]
async fn webdriver_reopens_session_after_driver_drops_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": {"sessionId": "dead"}
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": {"sessionId": "fresh"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/dead/url"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "value": {"error": "invalid session id", "message": "session deleted because of page crash"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/fresh/url"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": null})))
        .expect(1)
        .mount(&server)
        .await;

    let browser = WebDriverBrowser::new(&BrowserConfig {
        webdriver_url: server.uri(),
        browser_name: "MicrosoftEdge".to_string(),
    });

    let err = browser.open_url("https://www.youtube.com").await.unwrap_err();
    assert!(matches!(err, AutomationError::SessionLost(_)));
    browser.open_url("https://www.youtube.com").await.unwrap();
}
