//! Bundled demonstration dataset.
//!
//! A small home network behind one router: the local machine, the gateway
//! and a handful of devices, some with scanned services.

use std::net::Ipv4Addr;

use chrono::{DateTime, Duration, Utc};

use netmap_core::types::{
    DiscoveredHost, DiscoveredPort, GatewayInfo, HostId, InterfaceSnapshot,
    NetworkTopologyGraph, ScanMode, ServiceDescriptor,
};
use netmap_graph::build_topology;

const INTERFACE: &str = "en0";

struct SampleDevice {
    ip: &'static str,
    hostname: Option<&'static str>,
    mac: &'static str,
    ports: &'static [(u16, Option<(&'static str, &'static str)>)],
}

const DEVICES: &[SampleDevice] = &[
    SampleDevice {
        ip: "192.168.50.1",
        hostname: Some("router.lan"),
        mac: "f0:9f:c2:10:20:01",
        ports: &[(53, None), (80, Some(("lighttpd", "1.4.59"))), (443, None)],
    },
    SampleDevice {
        ip: "192.168.50.12",
        hostname: Some("nas.lan"),
        mac: "00:11:32:ab:cd:12",
        ports: &[(22, Some(("OpenSSH", "9.6"))), (445, Some(("Samba", "4.19")))],
    },
    SampleDevice {
        ip: "192.168.50.31",
        hostname: Some("living-room-tv"),
        mac: "a8:23:fe:44:55:31",
        ports: &[(8008, None), (8443, None)],
    },
    SampleDevice {
        ip: "192.168.50.44",
        hostname: None,
        mac: "3c:22:fb:9a:0b:44",
        ports: &[],
    },
    SampleDevice {
        ip: "192.168.50.57",
        hostname: Some("printer.lan"),
        mac: "9c:93:4e:12:34:57",
        ports: &[(631, Some(("CUPS", "2.4"))), (9100, None)],
    },
];

/// Hosts and topology of the demonstration network, stamped relative to
/// `now`. Host ids are stable across calls.
pub fn sample_dataset(now: DateTime<Utc>) -> (Vec<DiscoveredHost>, NetworkTopologyGraph) {
    let hosts: Vec<DiscoveredHost> = DEVICES
        .iter()
        .enumerate()
        .map(|(i, device)| {
            let mut host = DiscoveredHost::new(device.ip, now - Duration::minutes(i as i64));
            host.id = HostId::synthesized("sample", INTERFACE, device.ip);
            host.hostname = device.hostname.map(String::from);
            host.mac_address = Some(device.mac.to_string());
            host.interface_name = Some(INTERFACE.to_string());
            host.services = device
                .ports
                .iter()
                .map(|(port, descriptor)| DiscoveredPort {
                    service: descriptor.map(|(product, version)| ServiceDescriptor {
                        product: Some(product.to_string()),
                        version: Some(version.to_string()),
                        extra_info: None,
                    }),
                    ..DiscoveredPort::open_tcp(*port)
                })
                .collect();
            if !host.services.is_empty() {
                host.last_port_scan = Some(now - Duration::hours(1));
                host.last_port_scan_mode = Some(ScanMode::Standard);
            }
            host
        })
        .collect();

    let interfaces = [InterfaceSnapshot {
        name: INTERFACE.to_string(),
        ipv4: Some(Ipv4Addr::new(192, 168, 50, 23)),
        netmask: Some(Ipv4Addr::new(255, 255, 255, 0)),
        is_up: true,
        is_loopback: false,
    }];
    let gateways = [GatewayInfo {
        interface_name: INTERFACE.to_string(),
        gateway_ip: Ipv4Addr::new(192, 168, 50, 1),
    }];

    let topology = build_topology(&hosts, &interfaces, &gateways, now);
    (hosts, topology)
}

#[cfg(test)]
mod tests {
    use super::*;
    use netmap_core::types::EdgeRelationship;

    #[test]
    fn test_sample_topology() {
        let (hosts, topology) = sample_dataset(Utc::now());
        assert_eq!(hosts.len(), 5);
        // the local machine is synthesized; the router is reused as gateway
        assert_eq!(topology.node_count(), 6);
        assert_eq!(
            topology
                .edges
                .iter()
                .filter(|e| e.relationship == EdgeRelationship::Uplink)
                .count(),
            1
        );
        let router = topology
            .nodes
            .iter()
            .find(|n| n.ip_address == "192.168.50.1")
            .unwrap();
        assert_eq!(router.hostname.as_deref(), Some("Gateway (en0)"));
    }

    #[test]
    fn test_sample_ids_stable() {
        let (a, _) = sample_dataset(Utc::now());
        let (b, _) = sample_dataset(Utc::now());
        assert_eq!(
            a.iter().map(|h| h.id).collect::<Vec<_>>(),
            b.iter().map(|h| h.id).collect::<Vec<_>>()
        );
    }
}
