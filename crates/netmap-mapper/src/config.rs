//! Mapper configuration.
//!
//! Loaded from the `[mapper]`, `[discover]` and `[scanner]` sections of the
//! config file, with `NETMAP__SECTION__KEY` environment overrides.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use netmap_core::config::{default_data_dir, load_section};
use netmap_core::types::ScanMode;
use netmap_discover::{DiscoverConfig, ScannerConfig};

use crate::coordinator::CoordinatorSettings;
use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct MapperConfig {
    /// Directory holding the history documents. Defaults to the platform
    /// data directory.
    #[serde(default)]
    pub history_dir: Option<PathBuf>,

    /// Seconds between automatic topology rebuilds. 0 disables them.
    #[serde(default = "default_topology_refresh_secs")]
    pub topology_refresh_secs: u64,

    #[serde(default)]
    pub default_scan_mode: ScanMode,
}

fn default_topology_refresh_secs() -> u64 {
    60
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            history_dir: None,
            topology_refresh_secs: default_topology_refresh_secs(),
            default_scan_mode: ScanMode::Standard,
        }
    }
}

/// Every section the `netmap` binary reads.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub mapper: MapperConfig,
    pub discover: DiscoverConfig,
    pub scanner: ScannerConfig,
}

impl AppConfig {
    pub fn load(file_prefix: &str) -> Result<Self> {
        Ok(Self {
            mapper: load_section(file_prefix, "mapper")?,
            discover: load_section(file_prefix, "discover")?,
            scanner: load_section(file_prefix, "scanner")?,
        })
    }

    pub fn history_dir(&self) -> PathBuf {
        self.mapper
            .history_dir
            .clone()
            .unwrap_or_else(default_data_dir)
    }

    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        let refresh = self.mapper.topology_refresh_secs;
        CoordinatorSettings {
            discover: self.discover.clone(),
            scanner: self.scanner.to_configuration(),
            history_dir: self.history_dir(),
            topology_refresh: (refresh > 0).then(|| Duration::from_secs(refresh)),
            default_scan_mode: self.mapper.default_scan_mode,
        }
    }
}
