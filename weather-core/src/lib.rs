//! Core library for the `weathergrid` sync job.
//!
//! This crate defines:
//! - Configuration of location groups
//! - The OpenWeatherMap One Call client behind a provider trait
//! - The snapshot document model and its construction from provider data
//! - The sync engine and snapshot writers
//!
//! It is used by `weathergrid-cli`, but can also be driven by other binaries or schedulers.

pub mod config;
pub mod model;
pub mod provider;
pub mod sync;
pub mod transform;
pub mod writer;

pub use config::{Config, Location, LocationGroup};
pub use model::{
    SCHEMA_VERSION, Snapshot, SnapshotConditionDetail, SnapshotGroup, SnapshotLocation,
    SnapshotWeather,
};
pub use provider::{
    Exclude, OneCallResponse, OpenWeatherClient, ProviderError, Units, WeatherProvider,
};
pub use sync::{SyncEngine, SyncError};
pub use writer::{ObjectStoreWriter, SnapshotWriter, WriteError};
