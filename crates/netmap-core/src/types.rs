//! Core domain types for the netmap engine.
//!
//! Hosts, ports, topology graphs, discovery deltas, and port-scan job
//! states. Every component exchanges these as owned values; only the
//! mapping coordinator holds the authoritative copies.

use std::cmp::Ordering;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timestamp;

/// Namespace UUID for deterministic IDs of synthesized topology nodes.
const NETMAP_NS: Uuid = Uuid::from_bytes([
    0x3f, 0x1c, 0x8e, 0x52, 0x6a, 0x0d, 0x4b, 0x7e, 0x9c, 0x21, 0x5d, 0xe4, 0x70, 0x8a, 0xb3, 0x16,
]);

// ── Host identity ─────────────────────────────────────────────────

/// Opaque identifier of a host. Stable across sweeps for the same IP.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct HostId(pub Uuid);

impl HostId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Deterministic ID for a synthesized node so that rebuilding a
    /// topology from the same input yields the same node IDs.
    pub fn synthesized(role: &str, interface: &str, ip: &str) -> Self {
        Self(Uuid::new_v5(
            &NETMAP_NS,
            format!("{role}:{interface}:{ip}").as_bytes(),
        ))
    }
}

impl Default for HostId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Ports ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Tcp,
    Udp,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PortState {
    Open,
    Closed,
    Filtered,
    Unknown,
}

impl fmt::Display for PortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Filtered => "filtered",
            Self::Unknown => "unknown",
        })
    }
}

/// Product/version details for a service. Not populated by connect
/// probing, only carried through from history and sample data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub product: Option<String>,
    pub version: Option<String>,
    pub extra_info: Option<String>,
}

/// A port found on a host. Only open probe results become ports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscoveredPort {
    pub port: u16,
    pub transport: Transport,
    pub state: PortState,
    pub service: Option<ServiceDescriptor>,
}

impl DiscoveredPort {
    pub fn open_tcp(port: u16) -> Self {
        Self {
            port,
            transport: Transport::Tcp,
            state: PortState::Open,
            service: None,
        }
    }
}

/// Port-scan probing mode.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Unprivileged TCP connect probing.
    #[default]
    Standard,
    /// Raw-socket probing. Requested through configuration but never
    /// available: every attempt fails with a privilege error.
    Enhanced,
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Standard => "standard",
            Self::Enhanced => "enhanced",
        })
    }
}

// ── Hosts ─────────────────────────────────────────────────────────

/// A host on the local network segment, keyed by IP within a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscoveredHost {
    pub id: HostId,
    pub ip_address: String,
    pub hostname: Option<String>,
    pub mac_address: Option<String>,
    pub interface_name: Option<String>,
    #[serde(with = "timestamp")]
    pub last_seen: DateTime<Utc>,
    #[serde(default)]
    pub services: Vec<DiscoveredPort>,
    #[serde(default, with = "timestamp::option")]
    pub last_port_scan: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_port_scan_mode: Option<ScanMode>,
    /// Consecutive sweeps in which the host was not sighted.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub missed_sweeps: u32,
}

impl DiscoveredHost {
    /// A freshly sighted host with a new random ID.
    pub fn new(ip_address: impl Into<String>, seen_at: DateTime<Utc>) -> Self {
        Self {
            id: HostId::new(),
            ip_address: ip_address.into(),
            hostname: None,
            mac_address: None,
            interface_name: None,
            last_seen: seen_at,
            services: Vec::new(),
            last_port_scan: None,
            last_port_scan_mode: None,
            missed_sweeps: 0,
        }
    }

    /// Whether the identity-bearing fields differ from `other`.
    pub fn identity_changed(&self, other: &DiscoveredHost) -> bool {
        self.hostname != other.hostname
            || self.mac_address != other.mac_address
            || self.interface_name != other.interface_name
    }
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

/// Order IP strings numerically (IPv4 before IPv6), falling back to
/// string order for anything that does not parse.
pub fn compare_ips(a: &str, b: &str) -> Ordering {
    match (IpAddr::from_str(a), IpAddr::from_str(b)) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

pub fn sort_hosts_by_ip(hosts: &mut [DiscoveredHost]) {
    hosts.sort_by(|a, b| compare_ips(&a.ip_address, &b.ip_address));
}

// ── Interfaces and gateways ───────────────────────────────────────

/// One OS network interface as reported by the interface inspector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InterfaceSnapshot {
    pub name: String,
    pub ipv4: Option<Ipv4Addr>,
    pub netmask: Option<Ipv4Addr>,
    pub is_up: bool,
    pub is_loopback: bool,
}

impl InterfaceSnapshot {
    /// Up, non-loopback, and carrying an address.
    pub fn is_usable(&self) -> bool {
        self.is_up && !self.is_loopback && self.ipv4.is_some()
    }

    pub fn prefix_len(&self) -> Option<u8> {
        self.netmask.map(|m| u32::from(m).count_ones() as u8)
    }
}

/// A default route: the gateway reachable through an interface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GatewayInfo {
    pub interface_name: String,
    pub gateway_ip: Ipv4Addr,
}

// ── Topology ──────────────────────────────────────────────────────

/// Why two nodes are connected in the derived graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum EdgeRelationship {
    Arp,
    Gateway,
    Uplink,
}

impl EdgeRelationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Arp => "arp",
            Self::Gateway => "gateway",
            Self::Uplink => "uplink",
        }
    }
}

impl fmt::Display for EdgeRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopologyEdge {
    pub source: HostId,
    pub target: HostId,
    pub relationship: EdgeRelationship,
}

/// Hosts (including synthesized local and gateway nodes) plus typed,
/// deduplicated edges whose endpoints are always present in `nodes`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NetworkTopologyGraph {
    pub nodes: Vec<DiscoveredHost>,
    pub edges: Vec<TopologyEdge>,
}

impl NetworkTopologyGraph {
    /// An edge-less graph over the given hosts.
    pub fn seed(hosts: &[DiscoveredHost]) -> Self {
        let mut nodes = hosts.to_vec();
        sort_hosts_by_ip(&mut nodes);
        Self {
            nodes,
            edges: Vec::new(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: &HostId) -> Option<&DiscoveredHost> {
        self.nodes.iter().find(|n| &n.id == id)
    }
}

// ── Discovery ─────────────────────────────────────────────────────

/// Difference between two host snapshots, keyed by IP.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NetworkDiscoveryDelta {
    pub added: Vec<DiscoveredHost>,
    pub updated: Vec<DiscoveredHost>,
    pub removed: Vec<DiscoveredHost>,
}

impl NetworkDiscoveryDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Output of one discovery sweep.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DiscoverySnapshot {
    pub hosts: Vec<DiscoveredHost>,
    pub topology: NetworkTopologyGraph,
    pub delta: NetworkDiscoveryDelta,
}

// ── Port-scan jobs ────────────────────────────────────────────────

/// Progress of a running port scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanProgress {
    pub completed: usize,
    pub total: usize,
    /// Most recently resolved port.
    pub last_port: Option<u16>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl ScanProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed as f64 / self.total as f64
    }
}

/// Per-host lifecycle of a port-scan request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PortScanJobState {
    #[default]
    Idle,
    Running {
        progress: ScanProgress,
    },
    Completed {
        #[serde(with = "timestamp")]
        finished_at: DateTime<Utc>,
    },
    Failed {
        message: String,
    },
    Cancelled,
}

impl PortScanJobState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }
}

/// The most recent scan of one host, as kept in port-scan history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortScanRecord {
    pub ip_address: String,
    pub mode: ScanMode,
    #[serde(with = "timestamp")]
    pub scanned_at: DateTime<Utc>,
    pub ports: Vec<DiscoveredPort>,
}

// ── Export ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Json,
    Csv,
    Dot,
    Mermaid,
}

impl ExportKind {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Dot => "dot",
            Self::Mermaid => "mmd",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Dot => "dot",
            Self::Mermaid => "mermaid",
        })
    }
}

impl FromStr for ExportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "dot" | "graphviz" => Ok(Self::Dot),
            "mermaid" | "mmd" => Ok(Self::Mermaid),
            _ => Err(format!(
                "Invalid export format: {s}. Choose: json, csv, dot, mermaid"
            )),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExportStatus {
    #[default]
    Idle,
    Running {
        kind: ExportKind,
    },
    Completed {
        kind: ExportKind,
        path: String,
    },
    Failed {
        kind: ExportKind,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(ip: &str) -> DiscoveredHost {
        DiscoveredHost::new(ip, Utc::now())
    }

    #[test]
    fn host_serialization_roundtrip() {
        let mut h = host("10.0.1.42");
        h.hostname = Some("nas.local".to_string());
        h.services.push(DiscoveredPort::open_tcp(445));
        h.last_port_scan = Some(Utc::now());
        h.last_port_scan_mode = Some(ScanMode::Standard);

        let json = serde_json::to_string(&h).unwrap();
        let back: DiscoveredHost = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, h.id);
        assert_eq!(back.ip_address, "10.0.1.42");
        assert_eq!(back.services, h.services);
        assert_eq!(back.last_port_scan_mode, Some(ScanMode::Standard));
        assert!(!json.contains("missed_sweeps"));
    }

    #[test]
    fn host_without_optional_fields_deserializes() {
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000000",
            "ip_address": "10.0.0.5",
            "hostname": null,
            "mac_address": null,
            "interface_name": "en0",
            "last_seen": "2024-01-15T10:30:00Z"
        }"#;
        let h: DiscoveredHost = serde_json::from_str(json).unwrap();
        assert!(h.services.is_empty());
        assert_eq!(h.last_port_scan, None);
        assert_eq!(h.missed_sweeps, 0);
    }

    #[test]
    fn edge_relationship_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&EdgeRelationship::Uplink).unwrap(),
            "\"uplink\""
        );
        assert_eq!(EdgeRelationship::Arp.to_string(), "arp");
    }

    #[test]
    fn ip_ordering_is_numeric() {
        let mut hosts = vec![host("10.0.0.10"), host("10.0.0.9"), host("10.0.0.100")];
        sort_hosts_by_ip(&mut hosts);
        let ips: Vec<_> = hosts.iter().map(|h| h.ip_address.as_str()).collect();
        assert_eq!(ips, vec!["10.0.0.9", "10.0.0.10", "10.0.0.100"]);
    }

    #[test]
    fn unparseable_ips_sort_last() {
        assert_eq!(compare_ips("10.0.0.1", "not-an-ip"), Ordering::Less);
        assert_eq!(compare_ips("b", "a"), Ordering::Greater);
    }

    #[test]
    fn synthesized_ids_are_deterministic() {
        let a = HostId::synthesized("local", "en0", "192.168.1.10");
        let b = HostId::synthesized("local", "en0", "192.168.1.10");
        let c = HostId::synthesized("gateway", "en0", "192.168.1.10");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn job_state_tagging() {
        let json = serde_json::to_string(&PortScanJobState::Cancelled).unwrap();
        assert_eq!(json, r#"{"state":"cancelled"}"#);
        assert!(!PortScanJobState::Idle.is_running());
    }

    #[test]
    fn interface_prefix_len() {
        let iface = InterfaceSnapshot {
            name: "en0".to_string(),
            ipv4: Some(Ipv4Addr::new(192, 168, 1, 10)),
            netmask: Some(Ipv4Addr::new(255, 255, 255, 0)),
            is_up: true,
            is_loopback: false,
        };
        assert_eq!(iface.prefix_len(), Some(24));
        assert!(iface.is_usable());
    }

    #[test]
    fn export_kind_parsing() {
        assert_eq!("DOT".parse::<ExportKind>().unwrap(), ExportKind::Dot);
        assert_eq!("mmd".parse::<ExportKind>().unwrap(), ExportKind::Mermaid);
        assert!("xml".parse::<ExportKind>().is_err());
        assert_eq!(ExportKind::Mermaid.extension(), "mmd");
    }

    #[test]
    fn scan_progress_fraction() {
        let p = ScanProgress {
            completed: 3,
            total: 12,
            last_port: Some(80),
            updated_at: Utc::now(),
        };
        assert!((p.fraction() - 0.25).abs() < f64::EPSILON);
    }
}
