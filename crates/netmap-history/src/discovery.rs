//! Discovery history: the last known host set.

use std::path::{Path, PathBuf};

use netmap_core::types::{sort_hosts_by_ip, DiscoveredHost};

use crate::store::{JsonDocument, Result};

pub const DISCOVERY_HISTORY_FILE: &str = "discovery-history.json";

/// Persists the merged host list of the most recent discovery sweep.
pub struct DiscoveryHistoryStore {
    doc: JsonDocument<Vec<DiscoveredHost>>,
}

impl DiscoveryHistoryStore {
    /// Store backed by `{dir}/discovery-history.json`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            doc: JsonDocument::new(dir.into().join(DISCOVERY_HISTORY_FILE)),
        }
    }

    pub fn path(&self) -> &Path {
        self.doc.path()
    }

    /// Previously persisted hosts, sorted by IP. Empty when missing or corrupt.
    pub fn load(&self) -> Vec<DiscoveredHost> {
        let mut hosts = self.doc.read();
        sort_hosts_by_ip(&mut hosts);
        hosts
    }

    /// Replace the persisted host set. Failures are logged, never returned.
    pub fn save(&self, hosts: &[DiscoveredHost]) {
        self.doc.write(&hosts.to_vec());
    }

    pub fn try_save(&self, hosts: &[DiscoveredHost]) -> Result<()> {
        self.doc.try_write(&hosts.to_vec())
    }
}
