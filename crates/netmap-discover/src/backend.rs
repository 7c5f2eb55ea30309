//! Sweep backends: where ARP, ICMP, interface and route data come from.
//!
//! [`SystemBackend`] shells out to the host utilities configured in
//! [`DiscoverConfig`]. Tests substitute fixed data through the
//! [`SweepBackend`] trait.

use std::future::Future;

use netmap_core::types::{GatewayInfo, InterfaceSnapshot};

use crate::config::DiscoverConfig;
use crate::error::Result;
use crate::{arp, icmp, interfaces, process};

/// One host observed by an ARP or ICMP sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSighting {
    pub ip_address: String,
    pub hostname: Option<String>,
    pub mac_address: Option<String>,
    pub interface_name: Option<String>,
}

impl HostSighting {
    /// A sighting that carries only an address (ICMP replies).
    pub fn bare(ip_address: impl Into<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            hostname: None,
            mac_address: None,
            interface_name: None,
        }
    }
}

pub trait SweepBackend: Send + Sync {
    /// Entries of the OS ARP table.
    fn arp_scan(&self) -> impl Future<Output = Result<Vec<HostSighting>>> + Send;

    /// Addresses that answer one ICMP echo.
    fn icmp_sweep(
        &self,
        addresses: Vec<String>,
    ) -> impl Future<Output = Result<Vec<HostSighting>>> + Send;

    fn interfaces(&self) -> impl Future<Output = Vec<InterfaceSnapshot>> + Send;

    fn gateways(&self) -> impl Future<Output = Vec<GatewayInfo>> + Send;
}

/// Backend that runs the configured system utilities.
#[derive(Debug, Clone, Default)]
pub struct SystemBackend {
    config: DiscoverConfig,
}

impl SystemBackend {
    pub fn new(config: DiscoverConfig) -> Self {
        Self { config }
    }
}

impl SweepBackend for SystemBackend {
    async fn arp_scan(&self) -> Result<Vec<HostSighting>> {
        let output = process::run_checked(&self.config.arp_command, &self.config.arp_args).await?;
        let sightings = arp::parse_arp_table(&output);
        tracing::debug!(entries = sightings.len(), "ARP table read");
        Ok(sightings)
    }

    async fn icmp_sweep(&self, addresses: Vec<String>) -> Result<Vec<HostSighting>> {
        icmp::icmp_sweep(&self.config, &addresses).await
    }

    async fn interfaces(&self) -> Vec<InterfaceSnapshot> {
        interfaces::fetch_interfaces(&self.config).await
    }

    async fn gateways(&self) -> Vec<GatewayInfo> {
        interfaces::resolve_gateways(&self.config).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::DiscoverError;

    #[tokio::test]
    async fn arp_exit_failure_is_an_error() {
        let backend = SystemBackend::new(DiscoverConfig {
            arp_command: "sh".to_string(),
            arp_args: vec!["-c".to_string(), "exit 1".to_string()],
            ..DiscoverConfig::default()
        });
        let err = backend.arp_scan().await.unwrap_err();
        assert!(matches!(err, DiscoverError::CommandFailed { code: 1, .. }));
    }

    #[tokio::test]
    async fn arp_output_is_parsed() {
        let backend = SystemBackend::new(DiscoverConfig {
            arp_command: "echo".to_string(),
            arp_args: vec!["? (10.0.0.1) at aa:bb:cc:dd:ee:ff [ether] on eth0".to_string()],
            ..DiscoverConfig::default()
        });
        let sightings = backend.arp_scan().await.unwrap();
        assert_eq!(sightings.len(), 1);
        assert_eq!(sightings[0].ip_address, "10.0.0.1");
    }
}
