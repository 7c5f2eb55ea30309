//! netmap-mapper: Mapping coordinator for the netmap discovery engine.
//!
//! Owns the current host list, topology, per-host port-scan job states and
//! export status. Drives discovery sweeps, targeted port scans, topology
//! rebuilds and exports as cancellable background tasks, and publishes
//! changes as [`netmap_core::events::CoordinatorEvent`]s.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod sample;

pub use config::{AppConfig, MapperConfig};
pub use coordinator::{Coordinator, CoordinatorHandle, CoordinatorSettings, CoordinatorSnapshot};
pub use error::CoordinatorError;
