//! Mapping coordinator.
//!
//! A single task owns the authoritative host list, topology, job states and
//! export status. Callers talk to it through a [`CoordinatorHandle`];
//! discovery sweeps, port scans, topology rebuilds and exports run as
//! spawned tasks that report back over an internal channel. Only the
//! coordinator task mutates state, so no locks guard it.
//!
//! Observers subscribe to a broadcast stream of [`CoordinatorEvent`]s.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use netmap_core::events::{CoordinatorEvent, EventPayload};
use netmap_core::types::{
    DiscoveredHost, DiscoverySnapshot, ExportKind, ExportStatus, NetworkDiscoveryDelta,
    NetworkTopologyGraph, PortScanJobState, PortScanRecord, ScanMode, ScanProgress,
};
use netmap_discover::{
    DiscoverConfig, DiscoverError, DiscoveryOrchestrator, PortScanReport, PortScanner,
    PortScannerConfiguration, ScanError, SweepBackend,
};
use netmap_graph::{build_topology, write_export_with, ExportError, ExportSnapshot};
use netmap_history::{DiscoveryHistoryStore, PortScanHistoryStore};

use crate::error::{CoordinatorError, Result};
use crate::sample::sample_dataset;

const COMMAND_BUFFER: usize = 64;
const EVENT_BUFFER: usize = 1024;

/// Everything the coordinator needs besides its sweep backend.
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub discover: DiscoverConfig,
    pub scanner: PortScannerConfiguration,
    pub history_dir: PathBuf,
    /// Period of automatic topology rebuilds; `None` disables them.
    pub topology_refresh: Option<Duration>,
    pub default_scan_mode: ScanMode,
}

/// Point-in-time copy of coordinator state.
#[derive(Debug, Clone, Serialize)]
pub struct CoordinatorSnapshot {
    pub hosts: Vec<DiscoveredHost>,
    pub topology: NetworkTopologyGraph,
    pub discovery_running: bool,
    pub jobs: BTreeMap<String, PortScanJobState>,
    pub default_scan_mode: ScanMode,
    pub last_delta: NetworkDiscoveryDelta,
    pub export_status: ExportStatus,
    pub sample_active: bool,
}

// ── Handle ────────────────────────────────────────────────────────

enum Command {
    StartDiscovery,
    RefreshTopology,
    RunPortScan {
        ip_address: String,
        mode: Option<ScanMode>,
    },
    CancelPortScan {
        ip_address: String,
    },
    Export {
        kind: ExportKind,
        destination: PathBuf,
    },
    LoadSampleData,
    SetDefaultScanMode(ScanMode),
    Snapshot(oneshot::Sender<CoordinatorSnapshot>),
    Shutdown,
}

/// Cloneable entry point to a running coordinator.
#[derive(Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<CoordinatorEvent>,
}

impl CoordinatorHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.events.subscribe()
    }

    /// Start a discovery sweep unless one is already running.
    pub async fn start_discovery(&self) -> Result<()> {
        self.send(Command::StartDiscovery).await
    }

    /// Rebuild the topology from current hosts.
    pub async fn refresh_topology(&self) -> Result<()> {
        self.send(Command::RefreshTopology).await
    }

    /// Scan one host, replacing any scan of it already in flight. `None`
    /// uses the default scan mode.
    pub async fn run_port_scan(&self, ip_address: impl Into<String>, mode: Option<ScanMode>) -> Result<()> {
        self.send(Command::RunPortScan {
            ip_address: ip_address.into(),
            mode,
        })
        .await
    }

    pub async fn cancel_port_scan(&self, ip_address: impl Into<String>) -> Result<()> {
        self.send(Command::CancelPortScan {
            ip_address: ip_address.into(),
        })
        .await
    }

    /// Export the current snapshot, replacing any export in flight.
    pub async fn export(&self, kind: ExportKind, destination: impl Into<PathBuf>) -> Result<()> {
        self.send(Command::Export {
            kind,
            destination: destination.into(),
        })
        .await
    }

    pub async fn load_sample_data(&self) -> Result<()> {
        self.send(Command::LoadSampleData).await
    }

    pub async fn set_default_scan_mode(&self, mode: ScanMode) -> Result<()> {
        self.send(Command::SetDefaultScanMode(mode)).await
    }

    pub async fn snapshot(&self) -> Result<CoordinatorSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx)).await?;
        rx.await.map_err(|_| CoordinatorError::Stopped)
    }

    /// Cancel in-flight work and stop the coordinator task.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| CoordinatorError::Stopped)
    }
}

// ── Coordinator task ──────────────────────────────────────────────

enum Internal {
    DiscoveryFinished(std::result::Result<DiscoverySnapshot, DiscoverError>),
    TopologyBuilt {
        hosts_version: u64,
        topology: NetworkTopologyGraph,
    },
    ScanProgressed {
        ip_address: String,
        job_id: Uuid,
        progress: ScanProgress,
    },
    ScanFinished {
        ip_address: String,
        job_id: Uuid,
        outcome: std::result::Result<PortScanRecord, ScanError>,
    },
    ExportFinished {
        job_id: Uuid,
        kind: ExportKind,
        destination: PathBuf,
        result: std::result::Result<(), ExportError>,
    },
}

struct ScanTask {
    job_id: Uuid,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct ExportTask {
    job_id: Uuid,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct Coordinator<B> {
    hosts: Vec<DiscoveredHost>,
    topology: NetworkTopologyGraph,
    /// Bumped whenever `hosts` is replaced wholesale; topology builds of an
    /// older host set are discarded.
    hosts_version: u64,
    discovery_running: bool,
    jobs: HashMap<String, PortScanJobState>,
    scans: HashMap<String, ScanTask>,
    default_scan_mode: ScanMode,
    last_delta: NetworkDiscoveryDelta,
    export_status: ExportStatus,
    export_task: Option<ExportTask>,
    sample_active: bool,

    backend: Arc<B>,
    orchestrator: Arc<DiscoveryOrchestrator<B>>,
    scanner: Arc<PortScanner>,
    port_history: Arc<PortScanHistoryStore>,
    topology_refresh: Option<Duration>,

    commands: mpsc::Receiver<Command>,
    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,
    events: broadcast::Sender<CoordinatorEvent>,
}

impl<B: SweepBackend + 'static> Coordinator<B> {
    /// Spawn the coordinator task.
    pub fn spawn(backend: Arc<B>, settings: CoordinatorSettings) -> (CoordinatorHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_BUFFER);

        let discovery_history = Arc::new(DiscoveryHistoryStore::new(&settings.history_dir));
        let port_history = Arc::new(PortScanHistoryStore::new(&settings.history_dir));
        let orchestrator = Arc::new(DiscoveryOrchestrator::new(
            backend.clone(),
            discovery_history.clone(),
            settings.discover,
        ));

        let coordinator = Coordinator {
            hosts: Vec::new(),
            topology: NetworkTopologyGraph::default(),
            hosts_version: 0,
            discovery_running: false,
            jobs: HashMap::new(),
            scans: HashMap::new(),
            default_scan_mode: settings.default_scan_mode,
            last_delta: NetworkDiscoveryDelta::default(),
            export_status: ExportStatus::Idle,
            export_task: None,
            sample_active: false,
            backend,
            orchestrator,
            scanner: Arc::new(PortScanner::new(settings.scanner)),
            port_history,
            topology_refresh: settings.topology_refresh,
            commands: command_rx,
            internal_tx,
            internal_rx,
            events: events.clone(),
        };

        let handle = CoordinatorHandle {
            commands: command_tx,
            events,
        };
        (handle, tokio::spawn(coordinator.run(discovery_history)))
    }

    async fn run(mut self, discovery_history: Arc<DiscoveryHistoryStore>) {
        // Commands sent meanwhile queue up and see the restored state.
        self.restore(discovery_history).await;

        let mut ticker = self.topology_refresh.map(|period| {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });

        tracing::info!(
            topology_refresh_secs = self.topology_refresh.map(|d| d.as_secs()),
            default_scan_mode = %self.default_scan_mode,
            "Coordinator started"
        );
        if !self.hosts.is_empty() {
            self.refresh_topology();
        }

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(message) = self.internal_rx.recv() => self.handle_internal(message),
                _ = next_tick(&mut ticker) => {
                    if !self.hosts.is_empty() {
                        tracing::debug!("Periodic topology refresh");
                        self.refresh_topology();
                    }
                }
            }
        }

        for (_, task) in self.scans.drain() {
            task.cancel.cancel();
        }
        if let Some(task) = self.export_task.take() {
            task.cancel.cancel();
            task.handle.abort();
        }
        tracing::info!("Coordinator stopped");
    }

    /// Seed state with the last persisted host set.
    async fn restore(&mut self, discovery_history: Arc<DiscoveryHistoryStore>) {
        let port_history = self.port_history.clone();
        let loaded = tokio::task::spawn_blocking(move || {
            let mut hosts = discovery_history.load();
            if !hosts.is_empty() {
                hydrate_port_scans(&mut hosts, &port_history.load());
            }
            hosts
        })
        .await;

        let hosts = match loaded {
            Ok(hosts) if !hosts.is_empty() => hosts,
            Ok(_) => return,
            Err(e) => {
                tracing::warn!(error = %e, "History restore task failed");
                return;
            }
        };
        self.topology = NetworkTopologyGraph::seed(&hosts);
        self.hosts = hosts;
        tracing::info!(hosts = self.hosts.len(), "Restored hosts from history");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::StartDiscovery => self.start_discovery(),
            Command::RefreshTopology => self.refresh_topology(),
            Command::RunPortScan { ip_address, mode } => self.run_port_scan(ip_address, mode),
            Command::CancelPortScan { ip_address } => self.cancel_port_scan(&ip_address),
            Command::Export { kind, destination } => self.export(kind, destination),
            Command::LoadSampleData => self.load_sample_data(),
            Command::SetDefaultScanMode(mode) => {
                tracing::info!(mode = %mode, "Default scan mode changed");
                self.default_scan_mode = mode;
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Command::Shutdown => {}
        }
    }

    fn handle_internal(&mut self, message: Internal) {
        match message {
            Internal::DiscoveryFinished(result) => self.on_discovery_finished(result),
            Internal::TopologyBuilt {
                hosts_version,
                topology,
            } => self.on_topology_built(hosts_version, topology),
            Internal::ScanProgressed {
                ip_address,
                job_id,
                progress,
            } => {
                if self.is_current_scan(&ip_address, job_id) {
                    self.set_job_state(&ip_address, PortScanJobState::Running { progress });
                }
            }
            Internal::ScanFinished {
                ip_address,
                job_id,
                outcome,
            } => self.on_scan_finished(ip_address, job_id, outcome),
            Internal::ExportFinished {
                job_id,
                kind,
                destination,
                result,
            } => self.on_export_finished(job_id, kind, destination, result),
        }
    }

    fn emit(&self, payload: EventPayload) {
        // No subscribers is not an error.
        let _ = self.events.send(CoordinatorEvent::new(payload));
    }

    fn snapshot(&self) -> CoordinatorSnapshot {
        CoordinatorSnapshot {
            hosts: self.hosts.clone(),
            topology: self.topology.clone(),
            discovery_running: self.discovery_running,
            jobs: self
                .jobs
                .iter()
                .map(|(ip, state)| (ip.clone(), state.clone()))
                .collect(),
            default_scan_mode: self.default_scan_mode,
            last_delta: self.last_delta.clone(),
            export_status: self.export_status.clone(),
            sample_active: self.sample_active,
        }
    }

    // ── Discovery ─────────────────────────────────────────────────

    fn start_discovery(&mut self) {
        if self.discovery_running {
            tracing::debug!("Discovery already running");
            return;
        }
        self.discovery_running = true;
        self.emit(EventPayload::DiscoveryStarted);

        let orchestrator = self.orchestrator.clone();
        let history = self.port_history.clone();
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let result = match orchestrator.run().await {
                Ok(snapshot) => Ok(reconcile_port_history(history, snapshot).await),
                Err(e) => Err(e),
            };
            let _ = tx.send(Internal::DiscoveryFinished(result));
        });
    }

    fn on_discovery_finished(&mut self, result: std::result::Result<DiscoverySnapshot, DiscoverError>) {
        self.discovery_running = false;

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Discovery failed; keeping previous state");
                self.emit(EventPayload::DiscoveryFailed {
                    message: e.to_string(),
                });
                return;
            }
        };

        for removed in &snapshot.delta.removed {
            if !self.scans.contains_key(&removed.ip_address) {
                self.jobs.remove(&removed.ip_address);
            }
        }

        self.sample_active = false;
        self.topology = NetworkTopologyGraph::seed(&snapshot.hosts);
        self.hosts = snapshot.hosts;
        self.hosts_version += 1;
        self.last_delta = snapshot.delta;

        self.emit(EventPayload::DiscoveryCompleted {
            host_count: self.hosts.len(),
            delta: self.last_delta.clone(),
        });
        self.refresh_topology();
    }

    // ── Topology ──────────────────────────────────────────────────

    fn refresh_topology(&mut self) {
        if self.sample_active {
            tracing::debug!("Sample data active; topology refresh skipped");
            return;
        }

        let hosts = self.hosts.clone();
        let hosts_version = self.hosts_version;
        let backend = self.backend.clone();
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let (interfaces, gateways) = tokio::join!(backend.interfaces(), backend.gateways());
            let topology = build_topology(&hosts, &interfaces, &gateways, Utc::now());
            let _ = tx.send(Internal::TopologyBuilt {
                hosts_version,
                topology,
            });
        });
    }

    fn on_topology_built(&mut self, hosts_version: u64, mut topology: NetworkTopologyGraph) {
        if hosts_version != self.hosts_version || self.sample_active {
            tracing::debug!(hosts_version, current = self.hosts_version, "Discarding stale topology");
            return;
        }

        // Scans may have completed while the graph was being built.
        for node in topology.nodes.iter_mut() {
            if let Some(host) = self.hosts.iter().find(|h| h.id == node.id) {
                node.services = host.services.clone();
                node.last_port_scan = host.last_port_scan;
                node.last_port_scan_mode = host.last_port_scan_mode;
            }
        }

        self.topology = topology;
        self.emit(EventPayload::TopologyUpdated {
            node_count: self.topology.node_count(),
            edge_count: self.topology.edge_count(),
        });
    }

    // ── Port scans ────────────────────────────────────────────────

    fn run_port_scan(&mut self, ip_address: String, mode: Option<ScanMode>) {
        let mode = mode.unwrap_or(self.default_scan_mode);
        let previous = self.scans.remove(&ip_address);
        if let Some(previous) = &previous {
            tracing::info!(ip = %ip_address, "Cancelling previous scan");
            previous.cancel.cancel();
        }

        let job_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        self.set_job_state(
            &ip_address,
            PortScanJobState::Running {
                progress: ScanProgress {
                    completed: 0,
                    total: self.scanner.configuration().ports.len(),
                    last_port: None,
                    updated_at: Utc::now(),
                },
            },
        );

        let scanner = self.scanner.clone();
        let history = self.port_history.clone();
        let tx = self.internal_tx.clone();
        let token = cancel.clone();
        let target = ip_address.clone();

        let handle = tokio::spawn(async move {
            // At most one scan per host: let the replaced one unwind first.
            if let Some(previous) = previous {
                let _ = previous.handle.await;
            }

            let progress_tx = tx.clone();
            let progress_ip = target.clone();
            let result = scanner
                .scan(&target, mode, &token, move |progress| {
                    let _ = progress_tx.send(Internal::ScanProgressed {
                        ip_address: progress_ip.clone(),
                        job_id,
                        progress,
                    });
                })
                .await;

            let outcome = match result {
                Ok(_) if token.is_cancelled() => Err(ScanError::Cancelled),
                Ok(report) => Ok(persist_scan(&history, report).await),
                Err(e) => Err(e),
            };
            let _ = tx.send(Internal::ScanFinished {
                ip_address: target,
                job_id,
                outcome,
            });
        });

        self.scans.insert(
            ip_address,
            ScanTask {
                job_id,
                cancel,
                handle,
            },
        );
    }

    fn cancel_port_scan(&mut self, ip_address: &str) {
        match self.scans.get(ip_address) {
            Some(task) => {
                tracing::info!(ip = %ip_address, "Cancelling port scan");
                task.cancel.cancel();
            }
            None => tracing::debug!(ip = %ip_address, "No scan in flight"),
        }
    }

    fn is_current_scan(&self, ip_address: &str, job_id: Uuid) -> bool {
        self.scans
            .get(ip_address)
            .is_some_and(|task| task.job_id == job_id)
    }

    fn on_scan_finished(
        &mut self,
        ip_address: String,
        job_id: Uuid,
        outcome: std::result::Result<PortScanRecord, ScanError>,
    ) {
        if !self.is_current_scan(&ip_address, job_id) {
            tracing::debug!(ip = %ip_address, "Ignoring result of a replaced scan");
            return;
        }
        self.scans.remove(&ip_address);

        let state = match outcome {
            Ok(record) => {
                for host in self.hosts.iter_mut().filter(|h| h.ip_address == ip_address) {
                    apply_scan_record(host, &record);
                }
                for node in self.topology.nodes.iter_mut().filter(|n| n.ip_address == ip_address) {
                    apply_scan_record(node, &record);
                }
                PortScanJobState::Completed {
                    finished_at: record.scanned_at,
                }
            }
            Err(ScanError::Cancelled) => PortScanJobState::Cancelled,
            Err(e) => {
                tracing::warn!(ip = %ip_address, error = %e, "Port scan failed");
                PortScanJobState::Failed {
                    message: e.to_string(),
                }
            }
        };
        self.set_job_state(&ip_address, state);
    }

    fn set_job_state(&mut self, ip_address: &str, state: PortScanJobState) {
        self.jobs.insert(ip_address.to_string(), state.clone());
        self.emit(EventPayload::JobStateChanged {
            ip_address: ip_address.to_string(),
            state,
        });
    }

    // ── Export ────────────────────────────────────────────────────

    fn export(&mut self, kind: ExportKind, destination: PathBuf) {
        if let Some(previous) = self.export_task.take() {
            tracing::info!("Cancelling previous export");
            previous.cancel.cancel();
            previous.handle.abort();
        }

        let job_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let snapshot = ExportSnapshot::new(self.hosts.clone(), self.topology.clone());
        self.set_export_status(ExportStatus::Running { kind });

        let tx = self.internal_tx.clone();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let path = destination.clone();
            // Aborting this task does not stop the blocking writer; the token does.
            let result = tokio::task::spawn_blocking(move || {
                write_export_with(kind, &snapshot, &path, || token.is_cancelled())
            })
            .await
            .unwrap_or_else(|e| Err(ExportError::FailedToEncode(e.to_string())));
            let _ = tx.send(Internal::ExportFinished {
                job_id,
                kind,
                destination,
                result,
            });
        });

        self.export_task = Some(ExportTask {
            job_id,
            cancel,
            handle,
        });
    }

    fn on_export_finished(
        &mut self,
        job_id: Uuid,
        kind: ExportKind,
        destination: PathBuf,
        result: std::result::Result<(), ExportError>,
    ) {
        if self.export_task.as_ref().map(|t| t.job_id) != Some(job_id) {
            return;
        }
        self.export_task = None;

        let status = match result {
            Ok(()) => ExportStatus::Completed {
                kind,
                path: destination.display().to_string(),
            },
            Err(e) => {
                tracing::warn!(kind = %kind, error = %e, "Export failed");
                ExportStatus::Failed {
                    kind,
                    reason: e.to_string(),
                }
            }
        };
        self.set_export_status(status);
    }

    fn set_export_status(&mut self, status: ExportStatus) {
        self.export_status = status.clone();
        self.emit(EventPayload::ExportStatusChanged { status });
    }

    // ── Sample data ───────────────────────────────────────────────

    fn load_sample_data(&mut self) {
        let (hosts, topology) = sample_dataset(Utc::now());

        self.sample_active = true;
        self.hosts = hosts;
        self.topology = topology;
        self.hosts_version += 1;
        self.last_delta = NetworkDiscoveryDelta::default();

        tracing::info!(hosts = self.hosts.len(), "Sample data loaded");
        self.emit(EventPayload::SampleDataLoaded {
            host_count: self.hosts.len(),
        });
        self.emit(EventPayload::TopologyUpdated {
            node_count: self.topology.node_count(),
            edge_count: self.topology.edge_count(),
        });
    }
}

/// Record a finished scan in history and return the record.
async fn persist_scan(history: &Arc<PortScanHistoryStore>, report: PortScanReport) -> PortScanRecord {
    let record = PortScanRecord {
        ip_address: report.target,
        mode: report.mode,
        scanned_at: Utc::now(),
        ports: report.open_ports,
    };

    let history = history.clone();
    let stored = record.clone();
    if let Err(e) = tokio::task::spawn_blocking(move || history.record(stored)).await {
        tracing::warn!(error = %e, "Port-scan history write task failed");
    }
    record
}

/// Drop recorded scans of evicted hosts, then carry the remaining records
/// onto the sweep's hosts.
async fn reconcile_port_history(
    history: Arc<PortScanHistoryStore>,
    mut snapshot: DiscoverySnapshot,
) -> DiscoverySnapshot {
    let evicted: Vec<String> = snapshot
        .delta
        .removed
        .iter()
        .map(|h| h.ip_address.clone())
        .collect();

    let loaded = tokio::task::spawn_blocking(move || {
        if !evicted.is_empty() {
            history.remove_all(evicted.iter().map(String::as_str));
        }
        history.load()
    })
    .await;

    match loaded {
        Ok(records) => hydrate_port_scans(&mut snapshot.hosts, &records),
        Err(e) => tracing::warn!(error = %e, "Port-scan history task failed"),
    }
    snapshot
}

/// Carry the last recorded scan of each host onto its record, unless the
/// host already holds a newer one.
fn hydrate_port_scans(hosts: &mut [DiscoveredHost], records: &BTreeMap<String, PortScanRecord>) {
    for host in hosts.iter_mut() {
        let Some(record) = records.get(&host.ip_address) else {
            continue;
        };
        if host.last_port_scan.map_or(true, |at| at < record.scanned_at) {
            apply_scan_record(host, record);
        }
    }
}

fn apply_scan_record(host: &mut DiscoveredHost, record: &PortScanRecord) {
    host.services = record.ports.clone();
    host.last_port_scan = Some(record.scanned_at);
    host.last_port_scan_mode = Some(record.mode);
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
