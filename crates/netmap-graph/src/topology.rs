//! Topology synthesis.
//!
//! Derives a graph from discovered hosts plus local interface and gateway
//! context. Each usable interface contributes a "local" node, each default
//! gateway on such an interface a "gateway" node. Hosts tagged with an
//! interface hang off that interface's local node (`arp`) and gateway
//! (`gateway`); local and gateway nodes are joined by an `uplink`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use netmap_core::types::{
    sort_hosts_by_ip, DiscoveredHost, EdgeRelationship, GatewayInfo, HostId, InterfaceSnapshot,
    NetworkTopologyGraph, TopologyEdge,
};

pub const LOCAL_ROLE: &str = "local";
pub const GATEWAY_ROLE: &str = "gateway";

pub fn local_label(interface: &str) -> String {
    format!("Local ({interface})")
}

pub fn gateway_label(interface: &str) -> String {
    format!("Gateway ({interface})")
}

/// Build the topology graph.
///
/// An existing host whose address matches a local interface or gateway is
/// reused (keeping its id) and relabeled; otherwise a node is synthesized
/// with a stable id derived from role, interface and address. `seen_at`
/// stamps synthesized nodes.
///
/// Output nodes are sorted by IP; edges are unique and sorted.
pub fn build_topology(
    hosts: &[DiscoveredHost],
    interfaces: &[InterfaceSnapshot],
    gateways: &[GatewayInfo],
    seen_at: DateTime<Utc>,
) -> NetworkTopologyGraph {
    let mut nodes: Vec<DiscoveredHost> = hosts.to_vec();
    let mut by_ip: HashMap<String, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, h)| (h.ip_address.clone(), i))
        .collect();

    let mut locals: BTreeMap<String, HostId> = BTreeMap::new();
    for iface in interfaces.iter().filter(|i| i.is_usable()) {
        let Some(ip) = iface.ipv4 else { continue };
        if locals.contains_key(&iface.name) {
            continue;
        }
        let id = claim_node(
            &mut nodes,
            &mut by_ip,
            LOCAL_ROLE,
            &iface.name,
            &ip.to_string(),
            local_label(&iface.name),
            seen_at,
        );
        locals.insert(iface.name.clone(), id);
    }

    let mut uplinked: BTreeMap<String, HostId> = BTreeMap::new();
    for gateway in gateways {
        let Some(local_id) = locals.get(&gateway.interface_name) else {
            continue;
        };
        if uplinked.contains_key(&gateway.interface_name) {
            continue;
        }
        let ip = gateway.gateway_ip.to_string();
        if by_ip.get(&ip).is_some_and(|&i| &nodes[i].id == local_id) {
            continue;
        }
        let id = claim_node(
            &mut nodes,
            &mut by_ip,
            GATEWAY_ROLE,
            &gateway.interface_name,
            &ip,
            gateway_label(&gateway.interface_name),
            seen_at,
        );
        uplinked.insert(gateway.interface_name.clone(), id);
    }

    let mut edges: BTreeSet<TopologyEdge> = BTreeSet::new();

    for host in hosts {
        let Some(iface) = host.interface_name.as_deref() else {
            continue;
        };
        let Some(&index) = by_ip.get(&host.ip_address) else {
            continue;
        };
        let host_id = nodes[index].id;

        if let Some(&local_id) = locals.get(iface) {
            if local_id != host_id {
                edges.insert(TopologyEdge {
                    source: local_id,
                    target: host_id,
                    relationship: EdgeRelationship::Arp,
                });
            }
        }
        if let Some(&gateway_id) = uplinked.get(iface) {
            if gateway_id != host_id {
                edges.insert(TopologyEdge {
                    source: gateway_id,
                    target: host_id,
                    relationship: EdgeRelationship::Gateway,
                });
            }
        }
    }

    for (iface, &gateway_id) in &uplinked {
        if let Some(&local_id) = locals.get(iface) {
            edges.insert(TopologyEdge {
                source: local_id,
                target: gateway_id,
                relationship: EdgeRelationship::Uplink,
            });
        }
    }

    sort_hosts_by_ip(&mut nodes);

    tracing::debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        local_nodes = locals.len(),
        gateway_nodes = uplinked.len(),
        "Topology built"
    );

    NetworkTopologyGraph {
        nodes,
        edges: edges.into_iter().collect(),
    }
}

fn claim_node(
    nodes: &mut Vec<DiscoveredHost>,
    by_ip: &mut HashMap<String, usize>,
    role: &str,
    interface: &str,
    ip: &str,
    label: String,
    seen_at: DateTime<Utc>,
) -> HostId {
    let index = match by_ip.get(ip) {
        Some(&i) => i,
        None => {
            let mut node = DiscoveredHost::new(ip, seen_at);
            node.id = HostId::synthesized(role, interface, ip);
            nodes.push(node);
            by_ip.insert(ip.to_string(), nodes.len() - 1);
            nodes.len() - 1
        }
    };

    let node = &mut nodes[index];
    node.hostname = Some(label);
    node.interface_name = Some(interface.to_string());
    node.id
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn host(ip: &str, iface: Option<&str>) -> DiscoveredHost {
        let mut h = DiscoveredHost::new(ip, Utc::now());
        h.interface_name = iface.map(String::from);
        h
    }

    fn en0() -> InterfaceSnapshot {
        InterfaceSnapshot {
            name: "en0".to_string(),
            ipv4: Some(Ipv4Addr::new(192, 168, 1, 23)),
            netmask: Some(Ipv4Addr::new(255, 255, 255, 0)),
            is_up: true,
            is_loopback: false,
        }
    }

    fn lo0() -> InterfaceSnapshot {
        InterfaceSnapshot {
            name: "lo0".to_string(),
            ipv4: Some(Ipv4Addr::LOCALHOST),
            netmask: Some(Ipv4Addr::new(255, 0, 0, 0)),
            is_up: true,
            is_loopback: true,
        }
    }

    fn gateway() -> GatewayInfo {
        GatewayInfo {
            interface_name: "en0".to_string(),
            gateway_ip: Ipv4Addr::new(192, 168, 1, 1),
        }
    }

    fn count(graph: &NetworkTopologyGraph, relationship: EdgeRelationship) -> usize {
        graph
            .edges
            .iter()
            .filter(|e| e.relationship == relationship)
            .count()
    }

    #[test]
    fn test_synthesizes_local_and_gateway() {
        let hosts = vec![
            host("192.168.1.40", Some("en0")),
            host("192.168.1.50", Some("en0")),
            host("10.9.0.1", None),
        ];
        let graph = build_topology(&hosts, &[en0(), lo0()], &[gateway()], Utc::now());

        assert_eq!(graph.node_count(), 5);
        let ips: Vec<&str> = graph.nodes.iter().map(|n| n.ip_address.as_str()).collect();
        assert_eq!(
            ips,
            vec!["10.9.0.1", "192.168.1.1", "192.168.1.23", "192.168.1.40", "192.168.1.50"]
        );

        let local = graph.nodes.iter().find(|n| n.ip_address == "192.168.1.23").unwrap();
        assert_eq!(local.hostname.as_deref(), Some("Local (en0)"));
        assert_eq!(local.id, HostId::synthesized("local", "en0", "192.168.1.23"));

        assert_eq!(count(&graph, EdgeRelationship::Arp), 2);
        assert_eq!(count(&graph, EdgeRelationship::Gateway), 2);
        assert_eq!(count(&graph, EdgeRelationship::Uplink), 1);
    }

    #[test]
    fn test_reuses_discovered_gateway() {
        let router = host("192.168.1.1", Some("en0"));
        let graph = build_topology(&[router.clone()], &[en0()], &[gateway()], Utc::now());

        let gw = graph.node(&router.id).unwrap();
        assert_eq!(gw.hostname.as_deref(), Some("Gateway (en0)"));
        assert_eq!(graph.node_count(), 2);
        // local -> router by ARP plus the uplink; no self-edge from the gateway
        assert_eq!(count(&graph, EdgeRelationship::Arp), 1);
        assert_eq!(count(&graph, EdgeRelationship::Gateway), 0);
        assert_eq!(count(&graph, EdgeRelationship::Uplink), 1);
    }

    #[test]
    fn test_gateway_without_local_interface_is_ignored() {
        let orphan = GatewayInfo {
            interface_name: "utun3".to_string(),
            gateway_ip: Ipv4Addr::new(10, 8, 0, 1),
        };
        let graph = build_topology(&[host("192.168.1.40", Some("en0"))], &[en0()], &[orphan], Utc::now());
        assert_eq!(graph.node_count(), 2);
        assert_eq!(count(&graph, EdgeRelationship::Uplink), 0);
    }

    #[test]
    fn test_edges_unique_and_endpoints_present() {
        let hosts = vec![host("192.168.1.40", Some("en0")), host("192.168.1.50", Some("en0"))];
        let now = Utc::now();
        let first = build_topology(&hosts, &[en0()], &[gateway(), gateway()], now);
        let second = build_topology(&hosts, &[en0()], &[gateway(), gateway()], now);

        assert_eq!(first.edges, second.edges);
        let unique: BTreeSet<_> = first.edges.iter().collect();
        assert_eq!(unique.len(), first.edges.len());
        for edge in &first.edges {
            assert!(first.node(&edge.source).is_some());
            assert!(first.node(&edge.target).is_some());
        }
    }

    #[test]
    fn test_no_context_yields_edgeless_graph() {
        let hosts = vec![host("10.0.0.2", Some("eth0")), host("10.0.0.1", None)];
        let graph = build_topology(&hosts, &[], &[], Utc::now());
        assert_eq!(graph, NetworkTopologyGraph::seed(&hosts));
    }
}
