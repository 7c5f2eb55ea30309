//! CLI entry point for the netmap local network mapper.
//!
//! Results are written to stdout as JSON; logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};

use netmap_core::events::{CoordinatorEvent, EventPayload};
use netmap_core::types::{ExportKind, ExportStatus, PortScanJobState, ScanMode};
use netmap_discover::{SweepBackend, SystemBackend};
use netmap_history::PortScanHistoryStore;
use netmap_mapper::{AppConfig, Coordinator, CoordinatorHandle};

#[derive(Parser)]
#[command(name = "netmap")]
#[command(about = "Local network discovery, port scanning and topology export")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: netmap).
    #[arg(short, long, default_value = "netmap", global = true)]
    config: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List local interfaces and default gateways.
    Interfaces,
    /// Run one discovery sweep and print hosts, topology and delta.
    Discover,
    /// Scan one host's TCP ports.
    Scan {
        /// Host name or IP address.
        target: String,
        /// Comma-separated ports (default: configured list).
        #[arg(long, value_delimiter = ',')]
        ports: Vec<u16>,
        /// Request the privileged scan mode.
        #[arg(long)]
        enhanced: bool,
    },
    /// Export the current map.
    Export {
        /// Output format: json, csv, dot, mermaid.
        #[arg(short, long, default_value = "json")]
        format: ExportKind,
        /// Destination file (default: netmap-export.<ext> in the working directory).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Export the bundled sample network instead of live data.
        #[arg(long)]
        sample: bool,
        /// Use the last persisted hosts instead of sweeping first.
        #[arg(long)]
        no_discover: bool,
    },
    /// Sweep periodically and stream coordinator events as JSON lines.
    Watch {
        /// Seconds between discovery sweeps.
        #[arg(long, default_value_t = 300)]
        interval_secs: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.json {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).json().init();
    } else {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    }

    let mut config = AppConfig::load(&cli.config)?;
    tracing::debug!(history_dir = %config.history_dir().display(), "Configuration loaded");

    match cli.command {
        Command::Interfaces => {
            let backend = SystemBackend::new(config.discover.clone());
            let (interfaces, gateways) = tokio::join!(backend.interfaces(), backend.gateways());
            print_json(&serde_json::json!({
                "interfaces": interfaces,
                "gateways": gateways,
            }))?;
        }
        Command::Discover => {
            let (handle, mut events) = start(&config, None);
            run_discovery(&handle, &mut events).await?;
            print_json(&handle.snapshot().await?)?;
            handle.shutdown().await?;
        }
        Command::Scan {
            target,
            ports,
            enhanced,
        } => {
            if !ports.is_empty() {
                config.scanner.ports = ports;
            }
            let mode = if enhanced {
                ScanMode::Enhanced
            } else {
                config.mapper.default_scan_mode
            };

            let (handle, mut events) = start(&config, None);
            handle.run_port_scan(target.clone(), Some(mode)).await?;
            let state = wait_for(&mut events, |payload| match payload {
                EventPayload::JobStateChanged { ip_address, state }
                    if *ip_address == target && !state.is_running() =>
                {
                    Some(state.clone())
                }
                EventPayload::JobStateChanged { state, .. } => {
                    if let PortScanJobState::Running { progress } = state {
                        tracing::debug!(
                            completed = progress.completed,
                            total = progress.total,
                            percent = (progress.fraction() * 100.0).round(),
                            port = progress.last_port,
                            "Scan progress"
                        );
                    }
                    None
                }
                _ => None,
            })
            .await?;
            handle.shutdown().await?;

            match state {
                PortScanJobState::Completed { .. } => {
                    let history = PortScanHistoryStore::new(config.history_dir());
                    let record = history
                        .get(&target)
                        .ok_or_else(|| anyhow::anyhow!("Scan of {target} completed but no record was stored"))?;
                    print_json(&record)?;
                }
                PortScanJobState::Failed { message } => anyhow::bail!("Scan of {target} failed: {message}"),
                other => anyhow::bail!("Scan of {target} ended as {other:?}"),
            }
        }
        Command::Export {
            format,
            output,
            sample,
            no_discover,
        } => {
            let destination = output
                .unwrap_or_else(|| PathBuf::from(format!("netmap-export.{}", format.extension())));

            let (handle, mut events) = start(&config, None);
            if sample {
                handle.load_sample_data().await?;
            } else if !no_discover {
                run_discovery(&handle, &mut events).await?;
            }

            handle.export(format, destination).await?;
            let status = wait_for(&mut events, |payload| match payload {
                EventPayload::ExportStatusChanged { status }
                    if !matches!(status, ExportStatus::Running { .. }) =>
                {
                    Some(status.clone())
                }
                _ => None,
            })
            .await?;
            handle.shutdown().await?;

            match status {
                ExportStatus::Completed { path, .. } => {
                    print_json(&serde_json::json!({ "format": format, "path": path }))?;
                }
                ExportStatus::Failed { reason, .. } => anyhow::bail!("Export failed: {reason}"),
                other => anyhow::bail!("Unexpected export status: {other:?}"),
            }
        }
        Command::Watch { interval_secs } => {
            if interval_secs == 0 {
                anyhow::bail!("--interval-secs must be at least 1");
            }
            let refresh = config.coordinator_settings().topology_refresh;
            let (handle, mut events) = start(&config, refresh);
            watch(&handle, &mut events, Duration::from_secs(interval_secs)).await?;
            handle.shutdown().await?;
        }
    }

    Ok(())
}

/// Spawn a coordinator over the system backend and subscribe to it before
/// any command is sent.
fn start(
    config: &AppConfig,
    topology_refresh: Option<Duration>,
) -> (CoordinatorHandle, broadcast::Receiver<CoordinatorEvent>) {
    let mut settings = config.coordinator_settings();
    settings.topology_refresh = topology_refresh;
    let backend = Arc::new(SystemBackend::new(settings.discover.clone()));
    let (handle, _task) = Coordinator::spawn(backend, settings);
    let events = handle.subscribe();
    (handle, events)
}

/// Sweep, then wait for the topology built from the sweep's hosts.
async fn run_discovery(
    handle: &CoordinatorHandle,
    events: &mut broadcast::Receiver<CoordinatorEvent>,
) -> anyhow::Result<()> {
    handle.start_discovery().await?;

    let failure = wait_for(events, |payload| match payload {
        EventPayload::DiscoveryCompleted { .. } => Some(None),
        EventPayload::DiscoveryFailed { message } => Some(Some(message.clone())),
        _ => None,
    })
    .await?;
    if let Some(message) = failure {
        anyhow::bail!("Discovery failed: {message}");
    }

    wait_for(events, |payload| match payload {
        EventPayload::TopologyUpdated { .. } => Some(()),
        _ => None,
    })
    .await
}

async fn watch(
    handle: &CoordinatorHandle,
    events: &mut broadcast::Receiver<CoordinatorEvent>,
    every: Duration,
) -> anyhow::Result<()> {
    let mut sweeps = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                return Ok(());
            }
            _ = sweeps.tick() => handle.start_discovery().await?,
            received = events.recv() => match received {
                Ok(event) => println!("{}", serde_json::to_string(&event)?),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(()),
            },
        }
    }
}

/// Receive events until `select` picks one.
async fn wait_for<T>(
    events: &mut broadcast::Receiver<CoordinatorEvent>,
    mut select: impl FnMut(&EventPayload) -> Option<T>,
) -> anyhow::Result<T> {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(value) = select(&event.payload) {
                    return Ok(value);
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event stream lagged");
            }
            Err(broadcast::error::RecvError::Closed) => {
                anyhow::bail!("Coordinator stopped unexpectedly");
            }
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
