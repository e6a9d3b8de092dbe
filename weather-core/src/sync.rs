use std::collections::{HashMap, hash_map::Entry};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::{
    config::LocationGroup,
    model::{Snapshot, SnapshotGroup},
    provider::{ProviderError, SYNC_EXCLUDES, Units, WeatherProvider},
    transform::{TransformError, to_snapshot_location},
    writer::{SnapshotWriter, WriteError},
};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("getting weather for {location}")]
    Fetch {
        location: String,
        #[source]
        source: ProviderError,
    },
    #[error("converting weather for {location}")]
    Transform {
        location: String,
        #[source]
        source: TransformError,
    },
    #[error("writing weather")]
    Write(#[source] WriteError),
    #[error("sync cancelled while {step}")]
    Cancelled { step: String },
}

/// Fetches weather for every configured location and hands one snapshot to the writer.
#[derive(Debug)]
pub struct SyncEngine {
    provider: Box<dyn WeatherProvider>,
    writer: Box<dyn SnapshotWriter>,
}

impl SyncEngine {
    pub fn new(provider: Box<dyn WeatherProvider>, writer: Box<dyn SnapshotWriter>) -> Self {
        Self { provider, writer }
    }

    pub async fn sync(&self, groups: &[LocationGroup]) -> Result<Snapshot, SyncError> {
        self.sync_with_cancel(groups, &CancellationToken::new()).await
    }

    /// Run one sync. Locations sharing identical coordinates are fetched once.
    ///
    /// The first failure aborts the run. Nothing is written unless every
    /// location was fetched and converted.
    pub async fn sync_with_cancel(
        &self,
        groups: &[LocationGroup],
        cancel: &CancellationToken,
    ) -> Result<Snapshot, SyncError> {
        let mut cache = HashMap::new();
        let mut out = Snapshot::new();

        for g in groups {
            log::info!("processing group. group={}", g.name);
            let mut group = SnapshotGroup {
                name: g.name.clone(),
                slug: g.slug.clone(),
                locations: Vec::with_capacity(g.locations.len()),
            };

            for loc in &g.locations {
                log::debug!("processing location. group={} location={}", g.name, loc.name);

                let resp = match cache.entry(loc.coordinate_key()) {
                    Entry::Occupied(entry) => {
                        log::debug!("reusing cached weather. location={}", loc.name);
                        entry.into_mut()
                    }
                    Entry::Vacant(entry) => {
                        log::info!("getting weather. group={} location={}", g.name, loc.name);
                        let fetched = tokio::select! {
                            biased;
                            _ = cancel.cancelled() => {
                                return Err(SyncError::Cancelled {
                                    step: format!("getting weather for {}", loc.name),
                                });
                            }
                            res = self.provider.fetch_weather(
                                loc.lat,
                                loc.lon,
                                SYNC_EXCLUDES,
                                Units::Imperial,
                            ) => res,
                        };
                        let fetched = fetched.map_err(|source| SyncError::Fetch {
                            location: loc.name.clone(),
                            source,
                        })?;
                        entry.insert(fetched)
                    }
                };

                let snap_loc =
                    to_snapshot_location(loc, resp).map_err(|source| SyncError::Transform {
                        location: loc.name.clone(),
                        source,
                    })?;
                group.locations.push(snap_loc);
            }

            out.groups.push(group);
        }

        log::info!(
            "writing snapshot. groups={} locations={} fetches={}",
            out.groups.len(),
            out.location_count(),
            cache.len()
        );
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(SyncError::Cancelled {
                    step: "writing snapshot".to_string(),
                });
            }
            res = self.writer.write(&out) => res.map_err(SyncError::Write)?,
        }

        log::info!("done");

        Ok(out)
    }
}
