use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Weather {
    /// °C
    pub temperature: f64,
    pub description: String,
}

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("weather API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("weather response had no conditions")]
    MissingConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    main: MainReading,
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct MainReading {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

/// OpenWeatherMap current-conditions lookup.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl WeatherClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, WeatherError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, WeatherError> {
        Self::new(config.weather_base_url.clone(), config.weather_api_key.clone())
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// `Ok(None)` when no API key is configured.
    pub async fn current(&self, lat: f64, lon: f64) -> Result<Option<Weather>, WeatherError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(None);
        };

        let response = self
            .http
            .get(format!("{}/data/2.5/weather", self.base_url))
            .query(&[("lat", lat), ("lon", lon)])
            .query(&[("units", "metric"), ("appid", api_key)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(WeatherError::Status { status, body });
        }

        let reading: CurrentWeatherResponse = response.json().await?;
        let description = reading
            .weather
            .into_iter()
            .next()
            .ok_or(WeatherError::MissingConditions)?
            .description;

        Ok(Some(Weather {
            temperature: reading.main.temp,
            description,
        }))
    }
}
