//! JSON export: a metadata block plus the full host and topology payload.
//!
//! Built through `serde_json::Value`, whose object maps keep keys sorted,
//! so output is byte-stable for a given snapshot.

use netmap_core::timestamp;
use serde_json::json;

use super::ExportSnapshot;
use crate::error::Result;

pub fn render(snapshot: &ExportSnapshot) -> Result<String> {
    let document = json!({
        "metadata": {
            "generated_at": timestamp::format(&snapshot.generated_at),
            "host_count": snapshot.hosts.len(),
            "edge_count": snapshot.topology.edge_count(),
        },
        "hosts": serde_json::to_value(&snapshot.hosts)?,
        "topology": serde_json::to_value(&snapshot.topology)?,
    });

    let mut body = serde_json::to_string_pretty(&document)?;
    body.push('\n');
    Ok(body)
}
