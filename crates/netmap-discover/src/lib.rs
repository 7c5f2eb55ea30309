//! netmap-discover: Local network host discovery and TCP port scanning.
//!
//! Reads the OS ARP table, pings candidate addresses, inspects interfaces
//! and default routes, and merges sightings with discovery history. The
//! port scanner probes a host with non-blocking TCP connects.

pub mod arp;
pub mod backend;
pub mod config;
pub mod diff;
pub mod error;
pub mod icmp;
pub mod interfaces;
pub mod orchestrator;
pub mod process;
pub mod scanner;

pub use backend::{HostSighting, SweepBackend, SystemBackend};
pub use config::{DiscoverConfig, ScannerConfig};
pub use error::{DiscoverError, ScanError};
pub use orchestrator::DiscoveryOrchestrator;
pub use scanner::{PortScanReport, PortScanner, PortScannerConfiguration};
