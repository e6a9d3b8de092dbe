use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

/// A configured place to fetch weather for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub slug: String,
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    /// Cache key for coordinate dedup. Exact equality on the configured values.
    pub fn coordinate_key(&self) -> (u64, u64) {
        // Adding 0.0 folds -0.0 into 0.0 so the key agrees with `==`.
        ((self.lat + 0.0).to_bits(), (self.lon + 0.0).to_bits())
    }
}

/// A named collection of locations. Grouping has no effect on fetching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationGroup {
    pub name: String,
    pub slug: String,
    pub locations: Vec<Location>,
}

/// Top-level job configuration.
///
/// Example JSON:
/// ```json
/// {
///   "openweathermap_api_key": "...",
///   "snapshots_bucket_name": "weather-snapshots",
///   "groups": [
///     {"name": "Bay Area", "slug": "bay-area", "locations": [
///       {"name": "San Francisco", "slug": "sf", "lat": 37.7749, "lon": -122.4194}
///     ]}
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub openweathermap_api_key: String,
    #[serde(default)]
    pub snapshots_bucket_name: String,
    pub groups: Vec<LocationGroup>,
}

impl Config {
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("Failed to parse JSON configuration")
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }

    /// Load config from disk. `.toml` files are read as TOML, everything else as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let cfg = if is_toml {
            Self::from_toml_str(&contents)
        } else {
            Self::from_json_str(&contents)
        };

        cfg.with_context(|| format!("Failed to load config file: {}", path.display()))
    }

    /// Path to the default config file.
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weathergrid", "weathergrid")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.json"))
    }

    /// Reject configurations that cannot produce a snapshot, before any fetch happens.
    pub fn validate(&self) -> Result<()> {
        if self.openweathermap_api_key.trim().is_empty() {
            bail!("openweathermap_api_key is empty");
        }
        if self.groups.is_empty() {
            bail!("No location groups configured");
        }

        let mut group_slugs = HashSet::new();
        for group in &self.groups {
            if group.name.trim().is_empty() || group.slug.trim().is_empty() {
                bail!("Group '{}' must have a non-empty name and slug", group.name);
            }
            if !group_slugs.insert(group.slug.as_str()) {
                bail!("Duplicate group slug '{}'", group.slug);
            }
            if group.locations.is_empty() {
                bail!("Group '{}' has no locations", group.name);
            }

            let mut location_slugs = HashSet::new();
            for loc in &group.locations {
                if loc.name.trim().is_empty() || loc.slug.trim().is_empty() {
                    bail!(
                        "Location '{}' in group '{}' must have a non-empty name and slug",
                        loc.name,
                        group.name
                    );
                }
                if !location_slugs.insert(loc.slug.as_str()) {
                    bail!("Duplicate location slug '{}' in group '{}'", loc.slug, group.name);
                }
                if !loc.lat.is_finite() || !(-90.0..=90.0).contains(&loc.lat) {
                    bail!("Location '{}' has invalid latitude {}", loc.name, loc.lat);
                }
                if !loc.lon.is_finite() || !(-180.0..=180.0).contains(&loc.lon) {
                    bail!("Location '{}' has invalid longitude {}", loc.name, loc.lon);
                }
            }
        }

        Ok(())
    }

    /// Number of distinct coordinates, i.e. the number of provider fetches a sync will make.
    pub fn unique_coordinates(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|g| g.locations.iter())
            .map(Location::coordinate_key)
            .collect::<HashSet<_>>()
            .len()
    }
}
