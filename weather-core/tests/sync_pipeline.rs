//! End-to-end sync against a mock provider and an in-memory bucket.

use std::sync::Arc;

use object_store::{ObjectStore, ObjectStoreExt, memory::InMemory, path::Path};
use weathergrid_core::{
    Config, ObjectStoreWriter, OpenWeatherClient, Snapshot, SyncEngine, SyncError,
    writer::LATEST_KEY,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn onecall_body(lat: f64, lon: f64, hourly: usize) -> serde_json::Value {
    let hour = |i: usize| {
        serde_json::json!({
            "dt": 1640563200 + 3600 * i as i64,
            "temp": 45.0 + i as f64,
            "feels_like": 40.0,
            "humidity": 80,
            "clouds": 75,
            "wind_speed": 10.5,
            "wind_deg": 220,
            "wind_gust": 15.0,
            "pop": 0.2,
            "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d"}]
        })
    };

    serde_json::json!({
        "lat": lat,
        "lon": lon,
        "timezone": "America/Los_Angeles",
        "timezone_offset": -28800,
        "current": {
            "dt": 1640564736,
            "temp": 45.97,
            "feels_like": 44.56,
            "humidity": 86,
            "clouds": 90,
            "wind_speed": 1.01,
            "wind_deg": 183,
            "weather": []
        },
        "hourly": (0..hourly).map(hour).collect::<Vec<_>>()
    })
}

fn config() -> Config {
    Config::from_json_str(
        r#"{
            "openweathermap_api_key": "KEY",
            "snapshots_bucket_name": "bucket",
            "groups": [
                {"name": "Bay Area", "slug": "bay-area", "locations": [
                    {"name": "SF", "slug": "sf", "lat": 37.7749, "lon": -122.4194},
                    {"name": "SF-dup", "slug": "sf-dup", "lat": 37.7749, "lon": -122.4194}
                ]},
                {"name": "Coast", "slug": "coast", "locations": [
                    {"name": "Santa Cruz", "slug": "santa-cruz", "lat": 36.9741, "lon": -122.0308}
                ]}
            ]
        }"#,
    )
    .unwrap()
}

async fn mount_location(server: &MockServer, lat: &str, lon: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/data/2.5/onecall"))
        .and(query_param("lat", lat))
        .and(query_param("lon", lon))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_sync_writes_snapshot_and_alias() {
    let server = MockServer::start().await;
    mount_location(&server, "37.774900", "-122.419400", onecall_body(37.7749, -122.4194, 3)).await;
    mount_location(&server, "36.974100", "-122.030800", onecall_body(36.9741, -122.0308, 0)).await;

    let cfg = config();
    assert_eq!(cfg.unique_coordinates(), 2);

    let store = Arc::new(InMemory::new());
    let provider = OpenWeatherClient::new(cfg.openweathermap_api_key.clone())
        .unwrap()
        .with_base_url(server.uri());
    let engine = SyncEngine::new(
        Box::new(provider),
        Box::new(ObjectStoreWriter::new(store.clone())),
    );

    let snap = engine.sync(&cfg.groups).await.unwrap();

    assert_eq!(snap.groups.len(), 2);
    assert_eq!(snap.groups[0].locations.len(), 2);
    assert_eq!(snap.groups[0].locations[0].forecasts.len(), 3);
    assert_eq!(snap.groups[0].locations[1].slug, "sf-dup");
    assert_eq!(
        snap.groups[0].locations[0].forecasts,
        snap.groups[0].locations[1].forecasts
    );

    let santa_cruz = &snap.groups[1].locations[0];
    assert!(santa_cruz.forecasts.is_empty());
    assert!(santa_cruz.latest.details.is_empty());
    assert_eq!(
        santa_cruz.latest.timestamp.to_rfc3339(),
        "2021-12-26T16:25:36-08:00"
    );

    let latest = store.get(&Path::from(LATEST_KEY)).await.unwrap();
    let stored: Snapshot = serde_json::from_slice(&latest.bytes().await.unwrap()).unwrap();
    assert_eq!(stored, snap);
}

#[tokio::test]
async fn test_sync_fetch_failure_leaves_bucket_empty() {
    let server = MockServer::start().await;
    mount_location(&server, "37.774900", "-122.419400", onecall_body(37.7749, -122.4194, 1)).await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/onecall"))
        .and(query_param("lat", "36.974100"))
        .respond_with(ResponseTemplate::new(503).set_body_string("service unavailable"))
        .mount(&server)
        .await;

    let cfg = config();
    let store = Arc::new(InMemory::new());
    let provider = OpenWeatherClient::new(cfg.openweathermap_api_key.clone())
        .unwrap()
        .with_base_url(server.uri());
    let engine = SyncEngine::new(
        Box::new(provider),
        Box::new(ObjectStoreWriter::new(store.clone())),
    );

    let err = engine.sync(&cfg.groups).await.unwrap_err();

    assert!(matches!(&err, SyncError::Fetch { location, .. } if location == "Santa Cruz"));
    let msg = format!("{:#}", anyhow::Error::from(err));
    assert_eq!(
        msg,
        "getting weather for Santa Cruz: unexpected status code 503: service unavailable"
    );
    assert!(store.get(&Path::from(LATEST_KEY)).await.is_err());
}
