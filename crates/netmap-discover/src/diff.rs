//! Change detection: merge sweep sightings into the known host set and diff
//! successive host snapshots.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use netmap_core::types::{sort_hosts_by_ip, DiscoveredHost, NetworkDiscoveryDelta};

use crate::backend::HostSighting;

/// Fold ARP and ICMP sightings into `previous`.
///
/// ARP sightings refresh hostname, MAC and interface (keeping the previous
/// value when the table entry omits one). Any sighting resets the miss
/// counter and stamps `seen_at`. Hosts seen by neither sweep accumulate a
/// miss and are dropped once they reach `eviction_threshold` misses.
///
/// The result is ordered by IP and never contains duplicate addresses.
pub fn merge_sightings(
    previous: &[DiscoveredHost],
    arp: &[HostSighting],
    icmp: &[HostSighting],
    seen_at: DateTime<Utc>,
    eviction_threshold: u32,
) -> Vec<DiscoveredHost> {
    let mut merged: HashMap<String, DiscoveredHost> = previous
        .iter()
        .map(|h| (h.ip_address.clone(), h.clone()))
        .collect();
    let mut sighted: HashSet<String> = HashSet::new();

    for sighting in arp {
        let host = merged
            .entry(sighting.ip_address.clone())
            .or_insert_with(|| DiscoveredHost::new(&sighting.ip_address, seen_at));
        if sighting.hostname.is_some() {
            host.hostname = sighting.hostname.clone();
        }
        if sighting.mac_address.is_some() {
            host.mac_address = sighting.mac_address.clone();
        }
        if sighting.interface_name.is_some() {
            host.interface_name = sighting.interface_name.clone();
        }
        sighted.insert(sighting.ip_address.clone());
    }

    for sighting in icmp {
        merged
            .entry(sighting.ip_address.clone())
            .or_insert_with(|| DiscoveredHost::new(&sighting.ip_address, seen_at));
        sighted.insert(sighting.ip_address.clone());
    }

    let threshold = eviction_threshold.max(1);
    let mut hosts: Vec<DiscoveredHost> = merged
        .into_values()
        .filter_map(|mut host| {
            if sighted.contains(&host.ip_address) {
                host.last_seen = seen_at;
                host.missed_sweeps = 0;
                return Some(host);
            }
            host.missed_sweeps += 1;
            (host.missed_sweeps < threshold).then_some(host)
        })
        .collect();

    sort_hosts_by_ip(&mut hosts);
    hosts
}

/// Compare two host snapshots keyed by IP.
///
/// - added: in `current` only
/// - updated: in both, with a different hostname, MAC or interface
/// - removed: in `previous` only
///
/// Each list keeps IP order. A host never appears in more than one list.
pub fn compute_delta(previous: &[DiscoveredHost], current: &[DiscoveredHost]) -> NetworkDiscoveryDelta {
    let before: HashMap<&str, &DiscoveredHost> = previous
        .iter()
        .map(|h| (h.ip_address.as_str(), h))
        .collect();
    let now: HashSet<&str> = current.iter().map(|h| h.ip_address.as_str()).collect();

    let mut delta = NetworkDiscoveryDelta::default();

    for host in current {
        match before.get(host.ip_address.as_str()) {
            None => delta.added.push(host.clone()),
            Some(old) if old.identity_changed(host) => delta.updated.push(host.clone()),
            Some(_) => {}
        }
    }

    delta.removed = previous
        .iter()
        .filter(|h| !now.contains(h.ip_address.as_str()))
        .cloned()
        .collect();

    sort_hosts_by_ip(&mut delta.added);
    sort_hosts_by_ip(&mut delta.updated);
    sort_hosts_by_ip(&mut delta.removed);
    delta
}
