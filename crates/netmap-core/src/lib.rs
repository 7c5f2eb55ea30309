//! netmap-core: Shared types, events, configuration, and error handling.
//!
//! This crate provides the foundational types used across the netmap crates:
//! - Host, port, and topology types for discovery snapshots
//! - Port-scan job states and export status
//! - Coordinator events for observers
//! - Configuration loading
//! - Common error types

pub mod config;
pub mod error;
pub mod events;
pub mod timestamp;
pub mod types;

pub use error::NetmapError;
pub use types::{
    DiscoveredHost, DiscoveredPort, DiscoverySnapshot, EdgeRelationship, HostId,
    NetworkDiscoveryDelta, NetworkTopologyGraph, PortScanJobState, ScanMode, TopologyEdge,
};
