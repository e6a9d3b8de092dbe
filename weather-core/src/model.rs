use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Version tag written into every snapshot document.
pub const SCHEMA_VERSION: &str = "1";

/// The complete weather document for all configured groups at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: String,
    pub groups: Vec<SnapshotGroup>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            groups: Vec::new(),
        }
    }

    /// Total number of locations across all groups.
    pub fn location_count(&self) -> usize {
        self.groups.iter().map(|g| g.locations.len()).sum()
    }

    /// Total number of hourly forecast entries across all locations.
    pub fn forecast_count(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|g| g.locations.iter())
            .map(|l| l.forecasts.len())
            .sum()
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotGroup {
    pub name: String,
    pub slug: String,
    pub locations: Vec<SnapshotLocation>,
}

/// Weather for one configured location. `lat`/`lon` are the provider's coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotLocation {
    pub name: String,
    pub slug: String,
    pub lat: f64,
    pub lon: f64,
    pub latest: SnapshotWeather,
    pub forecasts: Vec<SnapshotWeather>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotWeather {
    /// Observation time in the location's own UTC offset.
    pub timestamp: DateTime<FixedOffset>,
    pub temp: f64,
    pub temp_feels_like: f64,
    pub humidity: f64,
    pub clouds: f64,
    pub wind_speed: f64,
    pub wind_gust: f64,
    pub wind_degree: f64,
    pub precipitation_percent: f64,
    pub details: Vec<SnapshotConditionDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotConditionDetail {
    pub summary: String,
    pub description: String,
}
