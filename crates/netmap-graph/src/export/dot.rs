//! Graphviz DOT export.

use std::fmt::Write;

use netmap_core::types::EdgeRelationship;

use super::{node_label, ExportSnapshot, NodeRole};

struct EdgeStyle {
    color: &'static str,
    penwidth: &'static str,
    style: &'static str,
}

fn edge_style(relationship: EdgeRelationship) -> EdgeStyle {
    match relationship {
        EdgeRelationship::Uplink => EdgeStyle {
            color: "#264653",
            penwidth: "2.5",
            style: "solid",
        },
        EdgeRelationship::Gateway => EdgeStyle {
            color: "#e76f51",
            penwidth: "1.5",
            style: "dashed",
        },
        EdgeRelationship::Arp => EdgeStyle {
            color: "#8d99ae",
            penwidth: "1.0",
            style: "dotted",
        },
    }
}

pub fn render(snapshot: &ExportSnapshot) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "digraph netmap {{");
    let _ = writeln!(out, "    rankdir=LR;");
    let _ = writeln!(
        out,
        "    node [shape=box, style=\"rounded,filled\", fontname=\"Helvetica\"];"
    );

    for node in snapshot.graph_nodes() {
        let _ = writeln!(
            out,
            "    \"{}\" [label=\"{}\", fillcolor=\"{}\"];",
            node.id,
            escape(&node_label(node, "\n")),
            NodeRole::of(node).fill(),
        );
    }

    for edge in &snapshot.topology.edges {
        let style = edge_style(edge.relationship);
        let _ = writeln!(
            out,
            "    \"{}\" -> \"{}\" [label=\"{}\", color=\"{}\", penwidth={}, style={}];",
            edge.source, edge.target, edge.relationship, style.color, style.penwidth, style.style,
        );
    }

    out.push_str("}\n");
    out
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::fixtures;

    #[test]
    fn test_structure() {
        let snapshot = fixtures::snapshot();
        let body = render(&snapshot);

        assert!(body.starts_with("digraph netmap {\n"));
        assert!(body.ends_with("}\n"));
        assert_eq!(body.matches(" -> ").count(), 3);
        assert_eq!(body.matches("fillcolor=").count(), 3);
    }

    #[test]
    fn test_labels_and_styles() {
        let body = render(&fixtures::snapshot());
        assert!(body.contains(r##"label="192.168.1.1\nGateway (en0)", fillcolor="#f4a261""##));
        assert!(body.contains(r##"label="192.168.1.20\nnas, \"main\"", fillcolor="#e9ecef""##));
        assert!(body.contains(r##"label="uplink", color="#264653", penwidth=2.5, style=solid"##));
        assert!(body.contains("style=dashed"));
        assert!(body.contains("style=dotted"));
    }
}
