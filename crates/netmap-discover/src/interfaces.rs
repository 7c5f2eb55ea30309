//! Local interface and default-gateway inspection.
//!
//! Interfaces come from `ifconfig`, falling back to the OS interface list
//! read through `pnet` when the utility is missing. Gateways come from
//! `netstat -rn`, falling back to `/proc/net/route`. Both queries degrade to
//! an empty list when every source fails.

use std::net::Ipv4Addr;

use netmap_core::types::{GatewayInfo, InterfaceSnapshot};
use pnet::datalink::NetworkInterface;
use pnet::ipnetwork::IpNetwork;

use crate::config::DiscoverConfig;
use crate::process;

const PROC_NET_ROUTE: &str = "/proc/net/route";

// ── ifconfig ──────────────────────────────────────────────────────

/// Parse `ifconfig` output into one snapshot per interface with an IPv4
/// address. Understands both the BSD block format
/// (`en0: flags=8863<UP,BROADCAST,...>` / `inet 192.168.1.10 netmask 0xffffff00`)
/// and legacy net-tools output (`inet addr:10.0.0.5  Mask:255.255.255.0`).
pub fn parse_ifconfig(output: &str) -> Vec<InterfaceSnapshot> {
    let mut interfaces = Vec::new();
    let mut current: Option<InterfaceSnapshot> = None;

    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }

        if !line.starts_with(char::is_whitespace) {
            if let Some(done) = current.take() {
                interfaces.push(done);
            }
            let Some(name) = line.split_whitespace().next() else {
                continue;
            };
            let mut snapshot = InterfaceSnapshot {
                name: name.trim_end_matches(':').to_string(),
                ipv4: None,
                netmask: None,
                is_up: false,
                is_loopback: false,
            };
            if let Some(flags) = bracketed_flags(line) {
                apply_flags(&mut snapshot, flags.split(','));
            }
            if line.contains("Local Loopback") {
                snapshot.is_loopback = true;
            }
            current = Some(snapshot);
            continue;
        }

        let Some(snapshot) = current.as_mut() else {
            continue;
        };
        let tokens: Vec<&str> = line.split_whitespace().collect();

        // net-tools status line: "UP BROADCAST RUNNING MULTICAST  MTU:1500"
        if tokens.first() == Some(&"UP") {
            apply_flags(snapshot, tokens.iter().copied());
            continue;
        }

        if tokens.first() == Some(&"inet") && snapshot.ipv4.is_none() {
            snapshot.ipv4 = tokens
                .get(1)
                .map(|t| t.trim_start_matches("addr:"))
                .and_then(|t| t.parse().ok());
            snapshot.netmask = tokens
                .iter()
                .position(|t| *t == "netmask")
                .and_then(|i| tokens.get(i + 1))
                .and_then(|t| parse_netmask(t))
                .or_else(|| {
                    tokens
                        .iter()
                        .find_map(|t| t.strip_prefix("Mask:"))
                        .and_then(parse_netmask)
                });
        }
    }

    if let Some(done) = current.take() {
        interfaces.push(done);
    }

    interfaces
        .into_iter()
        .filter(|i| i.ipv4.is_some_and(|ip| !ip.is_unspecified()))
        .collect()
}

fn bracketed_flags(line: &str) -> Option<&str> {
    let start = line.find('<')?;
    let end = line[start..].find('>')? + start;
    Some(&line[start + 1..end])
}

fn apply_flags<'a>(snapshot: &mut InterfaceSnapshot, flags: impl Iterator<Item = &'a str>) {
    for flag in flags {
        match flag.trim() {
            "UP" => snapshot.is_up = true,
            "LOOPBACK" => snapshot.is_loopback = true,
            _ => {}
        }
    }
}

/// `0xffffff00` or `255.255.255.0`.
fn parse_netmask(raw: &str) -> Option<Ipv4Addr> {
    match raw.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16).ok().map(Ipv4Addr::from),
        None => raw.parse().ok(),
    }
}

/// Convert `pnet` interface records, one snapshot per interface carrying
/// its first non-zero IPv4 network. Interfaces without one are skipped.
pub fn snapshots_from_datalink(interfaces: &[NetworkInterface]) -> Vec<InterfaceSnapshot> {
    interfaces
        .iter()
        .filter_map(|iface| {
            let network = iface.ips.iter().find_map(|network| match network {
                IpNetwork::V4(v4) if !v4.ip().is_unspecified() => Some(*v4),
                _ => None,
            })?;
            Some(InterfaceSnapshot {
                name: iface.name.clone(),
                ipv4: Some(network.ip()),
                netmask: Some(network.mask()),
                is_up: iface.is_up(),
                is_loopback: iface.is_loopback(),
            })
        })
        .collect()
}

// ── Routing table ─────────────────────────────────────────────────

/// Parse `netstat -rn` output into default IPv4 routes.
///
/// Only the IPv4 section is considered (parsing stops at `Internet6`). The
/// interface column is located from the header (`Netif` on BSD, `Iface` on
/// Linux). Routes whose gateway is not an IPv4 address (`link#4`) are
/// skipped and duplicates collapse.
pub fn parse_netstat_routes(output: &str) -> Vec<GatewayInfo> {
    let mut gateways = Vec::new();
    let mut columns: Option<(usize, usize)> = None;

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("Internet6") {
            break;
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        if tokens.first() == Some(&"Destination") {
            let gateway_col = tokens.iter().position(|t| *t == "Gateway");
            let iface_col = tokens
                .iter()
                .position(|t| matches!(*t, "Netif" | "Iface" | "Interface"));
            columns = gateway_col.zip(iface_col);
            continue;
        }

        let Some((gateway_col, iface_col)) = columns else {
            continue;
        };
        if !matches!(tokens.first(), Some(&"default") | Some(&"0.0.0.0") | Some(&"0.0.0.0/0")) {
            continue;
        }

        let Some(gateway_ip) = tokens
            .get(gateway_col)
            .and_then(|g| g.parse::<Ipv4Addr>().ok())
        else {
            continue;
        };
        let Some(interface_name) = tokens.get(iface_col) else {
            continue;
        };

        let info = GatewayInfo {
            interface_name: interface_name.to_string(),
            gateway_ip,
        };
        if !gateways.contains(&info) {
            gateways.push(info);
        }
    }

    gateways
}

/// Parse Linux `/proc/net/route`. Addresses are little-endian hex.
pub fn parse_proc_net_route(contents: &str) -> Vec<GatewayInfo> {
    let mut gateways = Vec::new();

    for line in contents.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 || fields[1] != "00000000" {
            continue;
        }
        let Ok(raw) = u32::from_str_radix(fields[2], 16) else {
            continue;
        };
        let gateway_ip = Ipv4Addr::from(raw.to_le_bytes());
        if gateway_ip.is_unspecified() {
            continue;
        }

        let info = GatewayInfo {
            interface_name: fields[0].to_string(),
            gateway_ip,
        };
        if !gateways.contains(&info) {
            gateways.push(info);
        }
    }

    gateways
}

// ── Queries ───────────────────────────────────────────────────────

/// Enumerate local interfaces. Empty on any failure.
///
/// Falls back to the OS interface list when `ifconfig` is unavailable.
pub async fn fetch_interfaces(config: &DiscoverConfig) -> Vec<InterfaceSnapshot> {
    match process::run_checked(&config.ifconfig_command, &[]).await {
        Ok(output) => return parse_ifconfig(&output),
        Err(e) => tracing::debug!(error = %e, "ifconfig unavailable, reading OS interface list"),
    }

    match tokio::task::spawn_blocking(pnet::datalink::interfaces).await {
        Ok(interfaces) => {
            let snapshots = snapshots_from_datalink(&interfaces);
            if snapshots.is_empty() {
                tracing::warn!("No interface with an IPv4 address found");
            }
            snapshots
        }
        Err(e) => {
            tracing::warn!(error = %e, "Interface enumeration failed");
            Vec::new()
        }
    }
}

/// Resolve default gateways. Empty on any failure.
///
/// Falls back to `/proc/net/route` when `netstat` is unavailable.
pub async fn resolve_gateways(config: &DiscoverConfig) -> Vec<GatewayInfo> {
    match process::run_checked(&config.netstat_command, &["-rn".to_string()]).await {
        Ok(output) => return parse_netstat_routes(&output),
        Err(e) => tracing::debug!(error = %e, "netstat unavailable, trying {}", PROC_NET_ROUTE),
    }

    match tokio::fs::read_to_string(PROC_NET_ROUTE).await {
        Ok(contents) => parse_proc_net_route(&contents),
        Err(e) => {
            tracing::warn!(error = %e, "Gateway resolution failed");
            Vec::new()
        }
    }
}
