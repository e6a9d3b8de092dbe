//! Persisting snapshots to object storage.
//!
//! Every run writes a new timestamp-named object and then refreshes a stable
//! "latest" alias that records which object it was copied from.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use object_store::{
    Attribute, Attributes, ObjectStore, PutOptions, PutPayload, aws::AmazonS3Builder,
    local::LocalFileSystem, path::Path,
};
use std::{fmt::Debug, sync::Arc};
use thiserror::Error;

use crate::model::Snapshot;

/// Key of the alias object that always holds the most recent snapshot.
pub const LATEST_KEY: &str = "snapshot_latest_default.json";
/// Metadata entry on the alias naming the snapshot object it was copied from.
pub const SNAPSHOT_OBJECT_METADATA: &str = "snapshot_object";

const CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("marshaling snapshot")]
    Serialize(#[source] serde_json::Error),
    #[error("putting snapshot object `{key}`")]
    Put {
        key: String,
        #[source]
        source: object_store::Error,
    },
    #[error("updating latest snapshot alias from `{key}`")]
    Alias {
        key: String,
        #[source]
        source: object_store::Error,
    },
}

/// Destination for completed snapshots.
#[async_trait]
pub trait SnapshotWriter: Send + Sync + Debug {
    async fn write(&self, snapshot: &Snapshot) -> Result<(), WriteError>;
}

/// Key for a snapshot written at `now`, e.g. `snapshot_20211227002536_default.json`.
pub fn snapshot_key(now: DateTime<Utc>) -> String {
    format!("snapshot_{}_default.json", now.format("%Y%m%d%H%M%S"))
}

#[derive(Debug, Clone)]
pub struct ObjectStoreWriter {
    store: Arc<dyn ObjectStore>,
    now: fn() -> DateTime<Utc>,
    // Local filesystem stores reject object attributes.
    attributes: bool,
}

impl ObjectStoreWriter {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            now: Utc::now,
            attributes: true,
        }
    }

    /// S3 bucket writer. Region and credentials come from the standard `AWS_*` env vars.
    pub fn s3(bucket: &str) -> Result<Self, object_store::Error> {
        let store = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .build()?;

        Ok(Self::new(Arc::new(store)))
    }

    /// Writer rooted at a local directory, which must already exist.
    ///
    /// Files carry no content type or alias metadata.
    pub fn local(dir: &std::path::Path) -> Result<Self, object_store::Error> {
        let store = LocalFileSystem::new_with_prefix(dir)?;
        Ok(Self {
            attributes: false,
            ..Self::new(Arc::new(store))
        })
    }

    /// Replace the clock used to name snapshot objects.
    pub fn with_clock(mut self, now: fn() -> DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Write the snapshot and refresh the latest alias, returning the snapshot's key.
    pub async fn write_snapshot(&self, snapshot: &Snapshot) -> Result<String, WriteError> {
        let key = snapshot_key((self.now)());
        let blob = Bytes::from(serde_json::to_vec(snapshot).map_err(WriteError::Serialize)?);

        log::info!("putting snapshot object. key={key}");
        self.store
            .put_opts(
                &Path::from(key.as_str()),
                PutPayload::from(blob.clone()),
                self.put_options(None),
            )
            .await
            .map_err(|source| WriteError::Put {
                key: key.clone(),
                source,
            })?;

        log::info!("updating latest snapshot alias. source={key} dest={LATEST_KEY}");
        self.store
            .put_opts(
                &Path::from(LATEST_KEY),
                PutPayload::from(blob),
                self.put_options(Some(&key)),
            )
            .await
            .map_err(|source| WriteError::Alias {
                key: key.clone(),
                source,
            })?;

        Ok(key)
    }

    fn put_options(&self, source_key: Option<&str>) -> PutOptions {
        let mut attributes = Attributes::new();
        if self.attributes {
            attributes.insert(Attribute::ContentType, CONTENT_TYPE.into());
            if let Some(source_key) = source_key {
                attributes.insert(
                    Attribute::Metadata(SNAPSHOT_OBJECT_METADATA.into()),
                    source_key.to_string().into(),
                );
            }
        }

        PutOptions {
            attributes,
            ..Default::default()
        }
    }
}

#[async_trait]
impl SnapshotWriter for ObjectStoreWriter {
    async fn write(&self, snapshot: &Snapshot) -> Result<(), WriteError> {
        let key = self.write_snapshot(snapshot).await?;
        log::debug!("snapshot written. key={key}");
        Ok(())
    }
}
