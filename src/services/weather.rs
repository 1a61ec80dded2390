use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::WeatherConfig;
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub temp_c: f64,
    pub description: String,
    pub city_name: String,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the place is unknown.
    async fn geocode(&self, place: &str) -> Result<Option<(f64, f64)>, ApiError>;
}

#[async_trait]
pub trait WeatherService: Send + Sync {
    async fn current_weather(&self, lat: f64, lon: f64) -> Result<WeatherReport, ApiError>;
}

fn http_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(10))
        .user_agent(concat!("bob-assistant/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_default()
}

/// OpenStreetMap Nominatim search.
#[derive(Clone)]
pub struct NominatimGeocoder {
    client: Client,
    url: String,
}

#[derive(Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(config: &WeatherConfig) -> Self {
        Self {
            client: http_client(),
            url: config.geocode_url.clone(),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, place: &str) -> Result<Option<(f64, f64)>, ApiError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let places: Vec<Place> = response.json().await?;
        let Some(first) = places.into_iter().next() else {
            return Ok(None);
        };
        let lat = first
            .lat
            .parse::<f64>()
            .map_err(|_| ApiError::Malformed(format!("latitude {:?}", first.lat)))?;
        let lon = first
            .lon
            .parse::<f64>()
            .map_err(|_| ApiError::Malformed(format!("longitude {:?}", first.lon)))?;
        Ok(Some((lat, lon)))
    }
}

/// OpenWeatherMap current-conditions client (metric units).
#[derive(Clone)]
pub struct OpenWeatherClient {
    client: Client,
    url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct CurrentWeather {
    main: MainBlock,
    weather: Vec<Condition>,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct MainBlock {
    temp: f64,
}

#[derive(Deserialize)]
struct Condition {
    description: String,
}

impl OpenWeatherClient {
    pub fn new(config: &WeatherConfig) -> Self {
        Self {
            client: http_client(),
            url: config.weather_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl WeatherService for OpenWeatherClient {
    async fn current_weather(&self, lat: f64, lon: f64) -> Result<WeatherReport, ApiError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ApiError::MissingKey("OPENWEATHER_API_KEY"))?;

        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", api_key.to_string()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: CurrentWeather = response.json().await?;
        let description = body
            .weather
            .into_iter()
            .next()
            .map(|c| c.description)
            .ok_or_else(|| ApiError::Malformed("no weather conditions".to_string()))?;

        Ok(WeatherReport {
            temp_c: body.main.temp,
            description,
            city_name: body.name,
        })
    }
}
