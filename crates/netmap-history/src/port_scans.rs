//! Port-scan history: the most recent scan per host address.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use netmap_core::types::PortScanRecord;

use crate::store::JsonDocument;

pub const PORT_SCAN_HISTORY_FILE: &str = "port-scan-history.json";

/// Map from IP address to the last scan of that address.
pub struct PortScanHistoryStore {
    doc: JsonDocument<BTreeMap<String, PortScanRecord>>,
}

impl PortScanHistoryStore {
    /// Store backed by `{dir}/port-scan-history.json`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            doc: JsonDocument::new(dir.into().join(PORT_SCAN_HISTORY_FILE)),
        }
    }

    pub fn path(&self) -> &Path {
        self.doc.path()
    }

    pub fn load(&self) -> BTreeMap<String, PortScanRecord> {
        self.doc.read()
    }

    pub fn get(&self, ip_address: &str) -> Option<PortScanRecord> {
        self.doc.read().remove(ip_address)
    }

    /// Store `record` as the latest scan of its address.
    pub fn record(&self, record: PortScanRecord) {
        self.doc.update(|entries| {
            entries.insert(record.ip_address.clone(), record);
        });
    }

    /// Drop the entry for `ip_address`. Returns whether one existed.
    pub fn remove(&self, ip_address: &str) -> bool {
        self.doc.update(|entries| entries.remove(ip_address).is_some())
    }

    /// Drop every listed address in one write. Returns how many existed.
    pub fn remove_all<'a>(&self, ip_addresses: impl IntoIterator<Item = &'a str>) -> usize {
        let ips: Vec<&str> = ip_addresses.into_iter().collect();
        if ips.is_empty() {
            return 0;
        }
        self.doc.update(|entries| {
            ips.iter()
                .filter(|ip| entries.remove(**ip).is_some())
                .count()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use netmap_core::types::{DiscoveredPort, ScanMode};

    fn record(ip: &str, ports: &[u16]) -> PortScanRecord {
        PortScanRecord {
            ip_address: ip.to_string(),
            mode: ScanMode::Standard,
            scanned_at: Utc::now(),
            ports: ports.iter().map(|p| DiscoveredPort::open_tcp(*p)).collect(),
        }
    }

    #[test]
    fn record_replaces_previous_scan() {
        let dir = tempfile::tempdir().unwrap();
        let store = PortScanHistoryStore::new(dir.path());

        store.record(record("10.0.0.5", &[22]));
        store.record(record("10.0.0.5", &[22, 80]));
        store.record(record("10.0.0.9", &[443]));

        assert_eq!(store.load().len(), 2);
        assert_eq!(store.get("10.0.0.5").unwrap().ports.len(), 2);
    }

    #[test]
    fn remove_by_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = PortScanHistoryStore::new(dir.path());
        store.record(record("10.0.0.5", &[22]));

        assert!(store.remove("10.0.0.5"));
        assert!(!store.remove("10.0.0.5"));
        assert!(store.get("10.0.0.5").is_none());
    }

    #[test]
    fn remove_all_counts_existing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = PortScanHistoryStore::new(dir.path());
        store.record(record("10.0.0.1", &[22]));
        store.record(record("10.0.0.2", &[22]));

        assert_eq!(store.remove_all(["10.0.0.1", "10.0.0.3"]), 1);
        assert_eq!(store.load().keys().collect::<Vec<_>>(), vec!["10.0.0.2"]);
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = PortScanHistoryStore::new(dir.path().join("never-created"));
        assert!(store.load().is_empty());
    }
}
