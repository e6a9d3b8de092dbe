use async_trait::async_trait;
use std::fmt::{self, Debug};
use thiserror::Error;

pub mod openweather;

pub use openweather::{OneCallResponse, OpenWeatherClient, ProviderCondition, ProviderWeather};

/// Data blocks that can be left out of a One Call response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exclude {
    Current,
    Minutely,
    Hourly,
    Daily,
    Alerts,
}

impl Exclude {
    pub fn as_str(&self) -> &'static str {
        match self {
            Exclude::Current => "current",
            Exclude::Minutely => "minutely",
            Exclude::Hourly => "hourly",
            Exclude::Daily => "daily",
            Exclude::Alerts => "alerts",
        }
    }
}

impl fmt::Display for Exclude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exclusions used by the sync job: only current and hourly data are requested.
pub const SYNC_EXCLUDES: &[Exclude] = &[Exclude::Minutely, Exclude::Daily, Exclude::Alerts];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    Standard,
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Standard => "standard",
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("fetching weather data")]
    Transport(#[source] reqwest::Error),
    #[error("unexpected status code {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unmarshaling weather data")]
    Decode(#[source] serde_json::Error),
}

/// Source of current and hourly weather for a single coordinate.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_weather(
        &self,
        lat: f64,
        lon: f64,
        exclude: &[Exclude],
        units: Units,
    ) -> Result<OneCallResponse, ProviderError>;
}
