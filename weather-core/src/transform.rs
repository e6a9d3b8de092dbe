//! Mapping from provider responses to snapshot entries.

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::{
    config::Location,
    model::{SnapshotConditionDetail, SnapshotLocation, SnapshotWeather},
    provider::{OneCallResponse, ProviderWeather},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("timezone offset {0}s is out of range")]
    InvalidOffset(i32),
    #[error("timestamp {0} is out of range")]
    InvalidTimestamp(i64),
}

/// Build the snapshot entry for `location` from its provider response.
///
/// Timestamps are rendered in the fixed offset reported by the provider; the
/// timezone name is not consulted.
pub fn to_snapshot_location(
    location: &Location,
    resp: &OneCallResponse,
) -> Result<SnapshotLocation, TransformError> {
    let offset = FixedOffset::east_opt(resp.timezone_offset)
        .ok_or(TransformError::InvalidOffset(resp.timezone_offset))?;

    let forecasts = resp
        .hourly
        .iter()
        .map(|w| to_snapshot_weather(w, offset))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SnapshotLocation {
        name: location.name.clone(),
        slug: location.slug.clone(),
        lat: resp.lat,
        lon: resp.lon,
        latest: to_snapshot_weather(&resp.current, offset)?,
        forecasts,
    })
}

pub fn to_snapshot_weather(
    w: &ProviderWeather,
    offset: FixedOffset,
) -> Result<SnapshotWeather, TransformError> {
    let timestamp = DateTime::from_timestamp(w.dt, 0)
        .ok_or(TransformError::InvalidTimestamp(w.dt))?
        .with_timezone(&offset);

    let details = w
        .weather
        .iter()
        .map(|c| SnapshotConditionDetail {
            summary: c.main.clone(),
            description: c.description.clone(),
        })
        .collect();

    Ok(SnapshotWeather {
        timestamp,
        temp: w.temp,
        temp_feels_like: w.feels_like,
        humidity: w.humidity,
        clouds: w.clouds,
        wind_speed: w.wind_speed,
        wind_gust: w.wind_gust,
        wind_degree: w.wind_deg,
        precipitation_percent: w.pop,
        details,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderCondition;

    fn provider_weather(dt: i64) -> ProviderWeather {
        ProviderWeather {
            dt,
            temp: 45.97,
            feels_like: 38.91,
            humidity: 86.0,
            clouds: 90.0,
            wind_speed: 17.25,
            wind_gust: 21.59,
            wind_deg: 230.0,
            pop: 0.47,
            weather: vec![
                ProviderCondition {
                    main: "Clouds".into(),
                    description: "overcast clouds".into(),
                },
                ProviderCondition {
                    main: "Rain".into(),
                    description: "light rain".into(),
                },
            ],
        }
    }

    fn response(hourly: Vec<ProviderWeather>) -> OneCallResponse {
        OneCallResponse {
            lat: 37.7693,
            lon: -122.4332,
            timezone: "America/Los_Angeles".into(),
            timezone_offset: -28_800,
            current: provider_weather(1_640_564_736),
            hourly,
        }
    }

    fn sf() -> Location {
        Location {
            name: "SF".into(),
            slug: "sf".into(),
            lat: 37.7749,
            lon: -122.4194,
        }
    }

    #[test]
    fn latest_is_rendered_in_provider_offset() {
        let loc = to_snapshot_location(&sf(), &response(vec![])).unwrap();

        assert_eq!(loc.latest.timestamp.to_rfc3339(), "2021-12-26T16:25:36-08:00");
        assert_eq!(loc.latest.timestamp.timestamp(), 1_640_564_736);
    }

    #[test]
    fn coordinates_come_from_response() {
        let loc = to_snapshot_location(&sf(), &response(vec![])).unwrap();

        assert_eq!(loc.name, "SF");
        assert_eq!(loc.slug, "sf");
        assert_eq!(loc.lat, 37.7693);
        assert_eq!(loc.lon, -122.4332);
    }

    #[test]
    fn empty_hourly_yields_empty_forecasts() {
        let loc = to_snapshot_location(&sf(), &response(vec![])).unwrap();
        assert!(loc.forecasts.is_empty());
        assert_eq!(loc.latest.temp, 45.97);
    }

    #[test]
    fn hourly_entries_keep_order_and_values() {
        let hourly = vec![
            provider_weather(1_640_563_200),
            provider_weather(1_640_566_800),
        ];
        let loc = to_snapshot_location(&sf(), &response(hourly)).unwrap();

        assert_eq!(loc.forecasts.len(), 2);
        let first = &loc.forecasts[0];
        assert_eq!(first.timestamp.to_rfc3339(), "2021-12-26T16:00:00-08:00");
        assert_eq!(
            loc.forecasts[1].timestamp.to_rfc3339(),
            "2021-12-26T17:00:00-08:00"
        );
        assert_eq!(first.temp_feels_like, 38.91);
        assert_eq!(first.wind_gust, 21.59);
        assert_eq!(first.wind_degree, 230.0);
        assert_eq!(first.precipitation_percent, 0.47);
        assert_eq!(first.details.len(), 2);
        assert_eq!(first.details[0].summary, "Clouds");
        assert_eq!(first.details[1].description, "light rain");
    }

    #[test]
    fn no_conditions_yields_empty_details() {
        let mut w = provider_weather(0);
        w.weather.clear();

        let out = to_snapshot_weather(&w, FixedOffset::east_opt(0).unwrap()).unwrap();
        assert!(out.details.is_empty());
        assert_eq!(out.timestamp.to_rfc3339(), "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        let mut resp = response(vec![]);
        resp.timezone_offset = 90_000;

        let err = to_snapshot_location(&sf(), &resp).unwrap_err();
        assert_eq!(err, TransformError::InvalidOffset(90_000));
    }

    #[test]
    fn out_of_range_timestamp_is_rejected() {
        let resp = response(vec![provider_weather(i64::MAX)]);

        let err = to_snapshot_location(&sf(), &resp).unwrap_err();
        assert_eq!(err, TransformError::InvalidTimestamp(i64::MAX));
    }
}
