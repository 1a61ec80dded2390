use std::sync::Arc;

use tracing::{error, warn};

use crate::error::ApiError;
use crate::services::weather::{Geocoder, WeatherService};

pub struct WeatherReporter {
    geocoder: Arc<dyn Geocoder>,
    weather: Arc<dyn WeatherService>,
    location: String,
}

impl WeatherReporter {
    pub fn new(geocoder: Arc<dyn Geocoder>, weather: Arc<dyn WeatherService>, location: impl Into<String>) -> Self {
        Self {
            geocoder,
            weather,
            location: location.into(),
        }
    }

    pub async fn report(&self) -> String {
        let (lat, lon) = match self.geocoder.geocode(&self.location).await {
            Ok(Some(coords)) => coords,
            Ok(None) => {
                warn!("No coordinates for '{}'", self.location);
                return "Sorry, couldn't retrieve your location.".to_string();
            }
            Err(e) => {
                error!("Error fetching location: {}", e);
                return "Sorry, couldn't retrieve your location.".to_string();
            }
        };

        match self.weather.current_weather(lat, lon).await {
            Ok(report) => format!(
                "The current weather in {} is {}°C with {}.",
                report.city_name, report.temp_c, report.description
            ),
            Err(ApiError::MissingKey(key)) => {
                warn!("{} is not set", key);
                "Sorry, the weather service isn't configured.".to_string()
            }
            Err(e) => {
                error!("Error fetching weather data: {}", e);
                "Sorry, I couldn't fetch the weather data.".to_string()
            }
        }
    }
}
