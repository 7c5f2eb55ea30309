//! Discovery orchestration.
//!
//! One sweep: load history, read the ARP table, ping the union of ARP and
//! previously known addresses, merge, diff against history, persist. Any
//! sub-scan failure aborts the sweep before history is touched.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use ipnet::Ipv4Net;
use netmap_core::types::{compare_ips, DiscoverySnapshot, NetworkTopologyGraph};
use netmap_history::DiscoveryHistoryStore;

use crate::backend::SweepBackend;
use crate::config::DiscoverConfig;
use crate::diff;
use crate::error::Result;

pub struct DiscoveryOrchestrator<B> {
    backend: Arc<B>,
    history: Arc<DiscoveryHistoryStore>,
    config: DiscoverConfig,
}

impl<B: SweepBackend> DiscoveryOrchestrator<B> {
    pub fn new(backend: Arc<B>, history: Arc<DiscoveryHistoryStore>, config: DiscoverConfig) -> Self {
        Self {
            backend,
            history,
            config,
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Run one discovery sweep.
    pub async fn run(&self) -> Result<DiscoverySnapshot> {
        let started = Instant::now();
        let previous = self.history.load();

        let arp = self.backend.arp_scan().await?;

        let mut targets: Vec<String> = arp
            .iter()
            .map(|s| s.ip_address.clone())
            .chain(previous.iter().map(|h| h.ip_address.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if self.config.sweep_local_subnets {
            targets.extend(self.subnet_targets().await);
            targets.sort_by(|a, b| compare_ips(a, b));
            targets.dedup();
        } else {
            targets.sort_by(|a, b| compare_ips(a, b));
        }

        let icmp = self.backend.icmp_sweep(targets.clone()).await?;

        let hosts = diff::merge_sightings(
            &previous,
            &arp,
            &icmp,
            Utc::now(),
            self.config.eviction_missed_sweeps,
        );
        let delta = diff::compute_delta(&previous, &hosts);

        self.history.save(&hosts);

        tracing::info!(
            arp_entries = arp.len(),
            ping_targets = targets.len(),
            icmp_responders = icmp.len(),
            hosts = hosts.len(),
            added = delta.added.len(),
            updated = delta.updated.len(),
            removed = delta.removed.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Discovery sweep completed"
        );

        Ok(DiscoverySnapshot {
            topology: NetworkTopologyGraph::seed(&hosts),
            hosts,
            delta,
        })
    }

    /// Host addresses of each usable interface's subnet, own address
    /// excluded. Subnets larger than `max_subnet_hosts` are skipped.
    async fn subnet_targets(&self) -> Vec<String> {
        let mut targets = Vec::new();

        for iface in self.backend.interfaces().await {
            if !iface.is_usable() {
                continue;
            }
            let (Some(ip), Some(prefix)) = (iface.ipv4, iface.prefix_len()) else {
                continue;
            };
            let Ok(net) = Ipv4Net::new(ip, prefix) else {
                continue;
            };

            let size = subnet_host_count(prefix);
            if size > self.config.max_subnet_hosts as u64 {
                tracing::debug!(
                    interface = %iface.name,
                    subnet = %net.trunc(),
                    hosts = size,
                    "Subnet too large to sweep"
                );
                continue;
            }

            targets.extend(
                net.hosts()
                    .filter(|h| *h != ip)
                    .map(|h: Ipv4Addr| h.to_string()),
            );
        }

        targets
    }
}

fn subnet_host_count(prefix: u8) -> u64 {
    match prefix {
        32 => 1,
        31 => 2,
        p => (1u64 << (32 - p as u32)) - 2,
    }
}
