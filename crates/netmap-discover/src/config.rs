//! Configuration for discovery sweeps and port scanning.

use std::time::Duration;

use serde::Deserialize;

use crate::scanner::{PortScannerConfiguration, DEFAULT_PORTS};

/// Discovery configuration.
///
/// Loaded from the `netmap.toml` `[discover]` section or
/// `NETMAP__DISCOVER__*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverConfig {
    /// ARP table dump utility (default: "arp").
    #[serde(default = "default_arp_command")]
    pub arp_command: String,

    #[serde(default = "default_arp_args")]
    pub arp_args: Vec<String>,

    /// ICMP echo utility (default: "ping").
    #[serde(default = "default_ping_command")]
    pub ping_command: String,

    /// Arguments for a single one-second echo. The target is appended.
    #[serde(default = "default_ping_args")]
    pub ping_args: Vec<String>,

    /// Hard limit on one ping process, in milliseconds.
    #[serde(default = "default_ping_timeout_ms")]
    pub ping_timeout_ms: u64,

    /// Interface enumeration utility (default: "ifconfig").
    #[serde(default = "default_ifconfig_command")]
    pub ifconfig_command: String,

    /// Routing table dump utility (default: "netstat", run with `-rn`).
    #[serde(default = "default_netstat_command")]
    pub netstat_command: String,

    /// Addresses pinged concurrently per batch.
    #[serde(default = "default_icmp_batch_size")]
    pub icmp_batch_size: usize,

    /// Consecutive missed sweeps before a host is evicted. 1 evicts a host
    /// the first time it is absent from both ARP and ICMP results.
    #[serde(default = "default_eviction_missed_sweeps")]
    pub eviction_missed_sweeps: u32,

    /// Also ping every host address of each local interface's subnet.
    #[serde(default)]
    pub sweep_local_subnets: bool,

    /// Subnets with more host addresses than this are not swept.
    #[serde(default = "default_max_subnet_hosts")]
    pub max_subnet_hosts: usize,
}

/// Port scanner configuration (`[scanner]` section).
#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfig {
    /// Ports to probe, in order. Empty selects the built-in list.
    #[serde(default)]
    pub ports: Vec<u16>,

    /// Per-probe connect timeout in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,

    /// Probes per batch.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Pause between batches in milliseconds.
    #[serde(default = "default_batch_pause_ms")]
    pub batch_pause_ms: u64,
}

impl ScannerConfig {
    /// Immutable per-scan configuration derived from these settings.
    pub fn to_configuration(&self) -> PortScannerConfiguration {
        let ports = if self.ports.is_empty() {
            DEFAULT_PORTS.to_vec()
        } else {
            self.ports.clone()
        };
        PortScannerConfiguration {
            ports,
            timeout: Duration::from_millis(self.timeout_ms),
            max_concurrency: self.max_concurrency,
            batch_pause: Duration::from_millis(self.batch_pause_ms),
        }
    }
}

fn default_arp_command() -> String {
    "arp".to_string()
}

fn default_arp_args() -> Vec<String> {
    vec!["-a".to_string()]
}

fn default_ping_command() -> String {
    "ping".to_string()
}

fn default_ping_args() -> Vec<String> {
    let args: &[&str] = if cfg!(target_os = "macos") {
        &["-c", "1", "-t", "1"]
    } else {
        &["-c", "1", "-W", "1"]
    };
    args.iter().map(|a| a.to_string()).collect()
}

fn default_ping_timeout_ms() -> u64 {
    1500
}

fn default_ifconfig_command() -> String {
    "ifconfig".to_string()
}

fn default_netstat_command() -> String {
    "netstat".to_string()
}

fn default_icmp_batch_size() -> usize {
    32
}

fn default_eviction_missed_sweeps() -> u32 {
    1
}

fn default_max_subnet_hosts() -> usize {
    254
}

fn default_probe_timeout_ms() -> u64 {
    750
}

fn default_max_concurrency() -> usize {
    32
}

fn default_batch_pause_ms() -> u64 {
    5
}

impl Default for DiscoverConfig {
    fn default() -> Self {
        Self {
            arp_command: default_arp_command(),
            arp_args: default_arp_args(),
            ping_command: default_ping_command(),
            ping_args: default_ping_args(),
            ping_timeout_ms: default_ping_timeout_ms(),
            ifconfig_command: default_ifconfig_command(),
            netstat_command: default_netstat_command(),
            icmp_batch_size: default_icmp_batch_size(),
            eviction_missed_sweeps: default_eviction_missed_sweeps(),
            sweep_local_subnets: false,
            max_subnet_hosts: default_max_subnet_hosts(),
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            ports: Vec::new(),
            timeout_ms: default_probe_timeout_ms(),
            max_concurrency: default_max_concurrency(),
            batch_pause_ms: default_batch_pause_ms(),
        }
    }
}
