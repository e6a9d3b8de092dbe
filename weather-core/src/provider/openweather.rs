use async_trait::async_trait;
use reqwest::{Client, header};
use serde::Deserialize;
use std::time::Duration;

use super::{Exclude, ProviderError, Units, WeatherProvider};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const ONECALL_PATH: &str = "/data/2.5/onecall";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One Call API response for a single coordinate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OneCallResponse {
    pub lat: f64,
    pub lon: f64,
    pub timezone: String,
    pub timezone_offset: i32,
    pub current: ProviderWeather,
    #[serde(default)]
    pub hourly: Vec<ProviderWeather>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderWeather {
    pub dt: i64,
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub clouds: f64,
    pub wind_speed: f64,
    #[serde(default)]
    pub wind_gust: f64,
    pub wind_deg: f64,
    /// Precipitation probability. Not reported on `current`.
    #[serde(default)]
    pub pop: f64,
    #[serde(default)]
    pub weather: Vec<ProviderCondition>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderCondition {
    pub main: String,
    pub description: String,
}

/// OpenWeatherMap One Call client.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Result<Self, ProviderError> {
        Self::with_timeout(api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(api_key: String, timeout: Duration) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ProviderError::Transport)?;

        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http,
        })
    }

    /// Point the client at another host, e.g. a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn onecall_url(&self) -> String {
        format!("{}{}", self.base_url, ONECALL_PATH)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn fetch_weather(
        &self,
        lat: f64,
        lon: f64,
        exclude: &[Exclude],
        units: Units,
    ) -> Result<OneCallResponse, ProviderError> {
        let exclude = exclude
            .iter()
            .map(Exclude::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let lat = format!("{lat:.6}");
        let lon = format!("{lon:.6}");

        log::debug!("requesting one call weather. lat={lat} lon={lon} units={units}");

        let res = self
            .http
            .get(self.onecall_url())
            .header(header::ACCEPT, "application/json")
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("units", units.as_str()),
                ("appid", self.api_key.as_str()),
                ("exclude", exclude.as_str()),
            ])
            .send()
            .await
            .map_err(ProviderError::Transport)?;

        let status = res.status();
        let body = res.text().await.map_err(ProviderError::Transport)?;

        if status != reqwest::StatusCode::OK {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(ProviderError::Decode)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
