//! Snapshot export.
//!
//! Four deterministic renderings of a host/topology snapshot: JSON, CSV,
//! Graphviz DOT and Mermaid. An empty snapshot is rejected before anything
//! is written.

pub mod csv;
pub mod dot;
pub mod json;
pub mod mermaid;

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use netmap_core::types::{DiscoveredHost, ExportKind, NetworkTopologyGraph};

use crate::error::{ExportError, Result};

/// Immutable input to an export.
#[derive(Debug, Clone)]
pub struct ExportSnapshot {
    pub hosts: Vec<DiscoveredHost>,
    pub topology: NetworkTopologyGraph,
    pub generated_at: DateTime<Utc>,
}

impl ExportSnapshot {
    pub fn new(hosts: Vec<DiscoveredHost>, topology: NetworkTopologyGraph) -> Self {
        Self {
            hosts,
            topology,
            generated_at: Utc::now(),
        }
    }

    /// Graph nodes to draw: the topology's nodes, or the bare hosts when no
    /// topology has been built yet.
    pub fn graph_nodes(&self) -> &[DiscoveredHost] {
        if self.topology.nodes.is_empty() {
            &self.hosts
        } else {
            &self.topology.nodes
        }
    }
}

/// Render `snapshot` in the given format.
pub fn render(kind: ExportKind, snapshot: &ExportSnapshot) -> Result<String> {
    if snapshot.hosts.is_empty() {
        return Err(ExportError::EmptySnapshot);
    }

    match kind {
        ExportKind::Json => json::render(snapshot),
        ExportKind::Csv => csv::render(snapshot),
        ExportKind::Dot => Ok(dot::render(snapshot)),
        ExportKind::Mermaid => Ok(mermaid::render(snapshot)),
    }
}

/// Render and write to `destination`. Nothing is written on failure to
/// render.
pub fn write_export(kind: ExportKind, snapshot: &ExportSnapshot, destination: &Path) -> Result<()> {
    write_export_with(kind, snapshot, destination, || false)
}

/// Like [`write_export`], but the body goes to a temporary file next to
/// `destination` and only replaces it if `cancelled` still returns false.
pub fn write_export_with(
    kind: ExportKind,
    snapshot: &ExportSnapshot,
    destination: &Path,
    cancelled: impl Fn() -> bool,
) -> Result<()> {
    let body = render(kind, snapshot)?;

    let dir = destination
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    staged.write_all(body.as_bytes())?;
    staged.flush()?;

    if cancelled() {
        tracing::debug!(kind = %kind, path = %destination.display(), "Export superseded; discarding");
        return Err(ExportError::Cancelled);
    }
    staged.persist(destination).map_err(|e| e.error)?;

    tracing::info!(
        kind = %kind,
        path = %destination.display(),
        hosts = snapshot.hosts.len(),
        edges = snapshot.topology.edge_count(),
        "Export written"
    );
    Ok(())
}

/// IP address, then the hostname if there is one. Unescaped.
pub(crate) fn node_label(host: &DiscoveredHost, separator: &str) -> String {
    match host.hostname.as_deref() {
        Some(name) if !name.is_empty() => format!("{}{separator}{name}", host.ip_address),
        _ => host.ip_address.clone(),
    }
}

/// Fill class of a node, keyed on its hostname.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeRole {
    Gateway,
    Local,
    Other,
}

impl NodeRole {
    pub(crate) fn of(host: &DiscoveredHost) -> Self {
        let name = host.hostname.as_deref().unwrap_or_default().to_lowercase();
        if name.contains("gateway") {
            Self::Gateway
        } else if name.contains("local") {
            Self::Local
        } else {
            Self::Other
        }
    }

    pub(crate) fn fill(&self) -> &'static str {
        match self {
            Self::Gateway => "#f4a261",
            Self::Local => "#2a9d8f",
            Self::Other => "#e9ecef",
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_is_rejected_in_every_format() {
        let dir = tempfile::tempdir().unwrap();
        let empty = ExportSnapshot::new(Vec::new(), NetworkTopologyGraph::default());

        for kind in [ExportKind::Json, ExportKind::Csv, ExportKind::Dot, ExportKind::Mermaid] {
            let path = dir.path().join(format!("out.{}", kind.extension()));
            let err = write_export(kind, &empty, &path).unwrap_err();
            assert!(matches!(err, ExportError::EmptySnapshot));
            assert!(!path.exists());
        }
    }

    #[test]
    fn write_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.json");
        let err = write_export(ExportKind::Json, &fixtures::snapshot(), &path).unwrap_err();
        assert!(matches!(err, ExportError::WriteFailed(_)));
    }

    #[test]
    fn cancelled_export_leaves_destination_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        std::fs::write(&path, "previous").unwrap();

        let err = write_export_with(ExportKind::Json, &fixtures::snapshot(), &path, || true).unwrap_err();
        assert!(matches!(err, ExportError::Cancelled));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous");
        // The staged file is cleaned up.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn export_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.dot");
        std::fs::write(&path, "stale").unwrap();

        let snapshot = fixtures::snapshot();
        write_export(ExportKind::Dot, &snapshot, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), render(ExportKind::Dot, &snapshot).unwrap());
    }

    #[test]
    fn writes_every_format() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = fixtures::snapshot();
        for kind in [ExportKind::Json, ExportKind::Csv, ExportKind::Dot, ExportKind::Mermaid] {
            let path = dir.path().join(format!("out.{}", kind.extension()));
            write_export(kind, &snapshot, &path).unwrap();
            let written = std::fs::read_to_string(&path).unwrap();
            assert_eq!(written, render(kind, &snapshot).unwrap());
        }
    }

    #[test]
    fn roles_follow_hostname() {
        let snapshot = fixtures::snapshot();
        let roles: Vec<NodeRole> = snapshot.graph_nodes().iter().map(NodeRole::of).collect();
        assert_eq!(roles, vec![NodeRole::Gateway, NodeRole::Other, NodeRole::Local]);
    }
}
