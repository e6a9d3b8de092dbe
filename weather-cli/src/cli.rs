use anyhow::{Context, bail};
use clap::Parser;
use std::{path::PathBuf, time::Duration};
use tokio_util::sync::CancellationToken;
use weathergrid_core::{Config, ObjectStoreWriter, OpenWeatherClient, Snapshot, SyncEngine};

/// Fetch current and hourly weather for every configured location and store a snapshot.
#[derive(Debug, Parser)]
#[command(name = "weathergrid", version, about = "Weather snapshot sync job")]
pub struct Cli {
    /// Path to the JSON (or .toml) configuration document.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write snapshots to this directory instead of the configured bucket.
    #[arg(long, value_name = "DIR")]
    pub local_dir: Option<PathBuf>,

    /// Override `snapshots_bucket_name` from the configuration.
    #[arg(long, value_name = "NAME", conflicts_with = "local_dir")]
    pub bucket: Option<String>,

    /// Abort the run after this many seconds.
    #[arg(long, value_name = "SECS", default_value_t = 300)]
    pub timeout: u64,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => Config::default_path()?,
        };
        log::info!("loading config. path={}", config_path.display());
        let config = Config::load(&config_path)?;
        config.validate().context("Invalid configuration")?;

        let writer = match &self.local_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir).with_context(|| {
                    format!("Failed to create snapshot directory: {}", dir.display())
                })?;
                log::info!("writing snapshots locally. dir={}", dir.display());
                ObjectStoreWriter::local(dir)?
            }
            None => {
                let bucket = self
                    .bucket
                    .as_deref()
                    .unwrap_or(config.snapshots_bucket_name.as_str());
                if bucket.trim().is_empty() {
                    bail!("No snapshot bucket configured.\nHint: set snapshots_bucket_name, or pass --bucket or --local-dir.");
                }
                log::info!("writing snapshots to bucket. bucket={bucket}");
                ObjectStoreWriter::s3(bucket)
                    .with_context(|| format!("Failed to configure bucket '{bucket}'"))?
            }
        };

        let provider = OpenWeatherClient::new(config.openweathermap_api_key.clone())?;
        let engine = SyncEngine::new(Box::new(provider), Box::new(writer));

        log::info!(
            "starting sync. groups={} unique_coordinates={}",
            config.groups.len(),
            config.unique_coordinates()
        );

        let cancel = CancellationToken::new();
        let watchdog = spawn_cancel_watchdog(cancel.clone(), Duration::from_secs(self.timeout));
        let result = engine.sync_with_cancel(&config.groups, &cancel).await;
        watchdog.abort();

        let snapshot = result.context("syncing weather")?;
        println!("{}", summary(&snapshot));

        Ok(())
    }
}

fn summary(snapshot: &Snapshot) -> String {
    format!(
        "Synced {} locations with {} forecasts.",
        snapshot.location_count(),
        snapshot.forecast_count()
    )
}

/// Cancel the run on Ctrl-C or once `timeout` elapses.
fn spawn_cancel_watchdog(
    cancel: CancellationToken,
    timeout: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => log::warn!("interrupted, cancelling sync"),
            _ = tokio::time::sleep(timeout) => log::warn!("timed out after {timeout:?}, cancelling sync"),
        }
        cancel.cancel();
    })
}
