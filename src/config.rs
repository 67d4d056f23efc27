use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::construct::FRAMEWORK_PACKAGE;
use crate::error::Result;

pub const ENV_PREFIX: &str = "RESTABLE";

/// Runtime settings, read from an optional file and then from `RESTABLE_*`
/// environment variables (`RESTABLE_OVERLAY__POOL_SIZE=2` for nested keys).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub framework_package: String,
    /// Target qualifier string used when a query does not give one.
    pub qualifiers: String,
    pub log_filter: String,
    pub cache_path: Option<PathBuf>,
    pub overlay: OverlaySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            framework_package: FRAMEWORK_PACKAGE.to_string(),
            qualifiers: String::new(),
            log_filter: String::from("info"),
            cache_path: None,
            overlay: OverlaySettings::default(),
        }
    }
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );
        Ok(builder.build()?.try_deserialize()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
    pub pool_size: Option<usize>,
    pub merge_timeout_secs: u64,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            pool_size: None,
            merge_timeout_secs: 300,
        }
    }
}

impl OverlaySettings {
    /// The configured size, or half the available cores kept within 1..=4.
    pub fn pool_size(&self) -> usize {
        self.pool_size.filter(|size| *size > 0).unwrap_or_else(default_pool_size)
    }
    pub fn merge_timeout(&self) -> Duration {
        Duration::from_secs(self.merge_timeout_secs)
    }
}

pub fn default_pool_size() -> usize {
    let cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    (cores / 2).clamp(1, 4)
}
