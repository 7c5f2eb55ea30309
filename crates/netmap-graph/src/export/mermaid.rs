//! Mermaid flowchart export.

use std::fmt::Write;

use netmap_core::types::{EdgeRelationship, HostId};

use super::{node_label, ExportSnapshot, NodeRole};

fn node_ref(id: &HostId) -> String {
    format!("n{}", id.0.simple())
}

fn class_name(role: NodeRole) -> &'static str {
    match role {
        NodeRole::Gateway => "gateway",
        NodeRole::Local => "local",
        NodeRole::Other => "host",
    }
}

fn arrow(relationship: EdgeRelationship) -> &'static str {
    match relationship {
        EdgeRelationship::Uplink => "==>",
        EdgeRelationship::Gateway => "-.->",
        EdgeRelationship::Arp => "-->",
    }
}

pub fn render(snapshot: &ExportSnapshot) -> String {
    let mut out = String::from("flowchart LR\n");

    for node in snapshot.graph_nodes() {
        let label = node_label(node, "<br/>").replace('"', "#quot;");
        let _ = writeln!(
            out,
            "    {}[\"{}\"]:::{}",
            node_ref(&node.id),
            label,
            class_name(NodeRole::of(node)),
        );
    }

    for edge in &snapshot.topology.edges {
        let _ = writeln!(
            out,
            "    {} {}|{}| {}",
            node_ref(&edge.source),
            arrow(edge.relationship),
            edge.relationship.as_str().to_uppercase(),
            node_ref(&edge.target),
        );
    }

    for role in [NodeRole::Gateway, NodeRole::Local, NodeRole::Other] {
        let _ = writeln!(out, "    classDef {} fill:{}", class_name(role), role.fill());
    }

    out
}
