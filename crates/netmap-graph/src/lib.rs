//! netmap-graph: Topology synthesis and snapshot export.
//!
//! Builds the derived network graph (local, gateway and host nodes joined
//! by `arp`, `gateway` and `uplink` edges) and renders snapshots as JSON,
//! CSV, Graphviz DOT or Mermaid.

pub mod error;
pub mod export;
pub mod topology;

pub use error::ExportError;
pub use export::{render, write_export, write_export_with, ExportSnapshot};
pub use topology::build_topology;
