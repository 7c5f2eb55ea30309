//! netmap-history: Best-effort persistence of discovery and port-scan state.
//!
//! Missing or corrupt documents load as empty state; write failures are
//! logged rather than returned. Each store serializes its own reads and
//! writes.

pub mod discovery;
pub mod port_scans;
pub mod store;

pub use discovery::DiscoveryHistoryStore;
pub use port_scans::PortScanHistoryStore;
pub use store::HistoryError;
