//! CSV export: one row per host, or one row per (host, service) pair.

use ::csv::{QuoteStyle, WriterBuilder};
use netmap_core::timestamp;
use netmap_core::types::{sort_hosts_by_ip, DiscoveredHost};

use super::ExportSnapshot;
use crate::error::{ExportError, Result};

pub const HEADER: [&str; 9] = [
    "ip_address",
    "host_name",
    "mac_address",
    "interface",
    "last_seen",
    "port",
    "protocol",
    "service_product",
    "service_version",
];

pub fn render(snapshot: &ExportSnapshot) -> Result<String> {
    let mut hosts: Vec<DiscoveredHost> = snapshot.hosts.clone();
    sort_hosts_by_ip(&mut hosts);

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(vec![]);
    writer.write_record(HEADER)?;

    for host in &hosts {
        let base = [
            host.ip_address.clone(),
            host.hostname.clone().unwrap_or_default(),
            host.mac_address.clone().unwrap_or_default(),
            host.interface_name.clone().unwrap_or_default(),
            timestamp::format(&host.last_seen),
        ];

        if host.services.is_empty() {
            writer.write_record(base.iter().map(String::as_str).chain(["", "", "", ""]))?;
            continue;
        }

        for service in &host.services {
            let descriptor = service.service.as_ref();
            let port = service.port.to_string();
            writer.write_record(base.iter().map(String::as_str).chain([
                port.as_str(),
                service.transport.as_str(),
                descriptor.and_then(|d| d.product.as_deref()).unwrap_or(""),
                descriptor.and_then(|d| d.version.as_deref()).unwrap_or(""),
            ]))?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::FailedToEncode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::FailedToEncode(e.to_string()))
}
