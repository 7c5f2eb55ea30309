//! ICMP reachability sweep.
//!
//! Each address gets one echo request from the system `ping` utility.
//! Pings run in fixed-size concurrent batches, each bounded by a hard
//! timeout so a stuck process cannot stall the sweep.

use std::time::Duration;

use netmap_core::types::compare_ips;
use tokio::process::Command;
use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::backend::HostSighting;
use crate::config::DiscoverConfig;
use crate::error::{DiscoverError, Result};

/// Extract `(transmitted, received)` from a ping summary line such as
/// `1 packets transmitted, 1 packets received, 0.0% packet loss` or
/// `1 packets transmitted, 1 received, 0% packet loss, time 0ms`.
pub fn parse_ping_summary(output: &str) -> Option<(u32, u32)> {
    let line = output.lines().find(|l| l.contains("transmitted"))?;

    let mut transmitted = None;
    let mut received = None;
    for part in line.split(',') {
        let part = part.trim();
        let count = part
            .split_whitespace()
            .next()
            .and_then(|n| n.parse::<u32>().ok());
        if part.contains("transmitted") {
            transmitted = count;
        } else if part.contains("received") {
            received = count;
        }
    }

    Some((transmitted?, received?))
}

/// A host answered iff exactly one echo went out and one reply came back.
pub fn host_replied(output: &str) -> bool {
    parse_ping_summary(output) == Some((1, 1))
}

/// Ping every address. Returns responders ordered by address.
///
/// Fails only if the ping utility itself cannot be launched; unreachable
/// hosts and timed-out processes are simply absent from the result.
pub async fn icmp_sweep(config: &DiscoverConfig, addresses: &[String]) -> Result<Vec<HostSighting>> {
    let limit = Duration::from_millis(config.ping_timeout_ms);
    let mut responders = Vec::new();

    for batch in addresses.chunks(config.icmp_batch_size.max(1)) {
        let mut set = JoinSet::new();
        for ip in batch {
            let program = config.ping_command.clone();
            let args = config.ping_args.clone();
            let ip = ip.clone();
            set.spawn(async move { ping_once(&program, &args, ip, limit).await });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(Some(ip))) => responders.push(HostSighting::bare(ip)),
                Ok(Ok(None)) => {}
                Ok(Err(e)) => return Err(e),
                Err(e) => tracing::warn!(error = %e, "Ping task failed"),
            }
        }
    }

    responders.sort_by(|a, b| compare_ips(&a.ip_address, &b.ip_address));
    tracing::debug!(
        targets = addresses.len(),
        responders = responders.len(),
        "ICMP sweep finished"
    );
    Ok(responders)
}

async fn ping_once(program: &str, args: &[String], ip: String, limit: Duration) -> Result<Option<String>> {
    let child = Command::new(program)
        .args(args)
        .arg(&ip)
        .kill_on_drop(true)
        .output();

    match timeout(limit, child).await {
        Err(_) => {
            tracing::trace!(ip = %ip, "Ping timed out");
            Ok(None)
        }
        Ok(Err(source)) => Err(DiscoverError::CommandLaunch {
            command: program.to_string(),
            source,
        }),
        Ok(Ok(output)) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            Ok(host_replied(&stdout).then_some(ip))
        }
    }
}
