//! TCP connect port scanner.
//!
//! Each probe opens a non-blocking socket and starts a connect. An
//! immediate success is `open`; an in-progress connect is handed to the
//! tokio reactor and awaited for writability under the probe timeout, then
//! `SO_ERROR` decides between open, closed and filtered.
//!
//! Ports are probed in batches of `max_concurrency`. The scanner waits for
//! a whole batch before starting the next, so at most `max_concurrency`
//! sockets are ever connecting at once.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use netmap_core::types::{DiscoveredPort, ScanMode, ScanProgress};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::ScanError;

/// Well-known TCP service ports probed when no list is configured.
pub const DEFAULT_PORTS: &[u16] = &[
    20, 21, 22, 23, 25, 37, 43, 53, 79, 80, 81, 88, 110, 111, 113, 119, 135, 139, 143, 179, 389,
    427, 443, 445, 465, 513, 514, 515, 548, 554, 587, 631, 636, 873, 902, 989, 990, 993, 995,
    1025, 1080, 1194, 1433, 1521, 1701, 1723, 1883, 2049, 2082, 2083, 2222, 2375, 2376, 3000,
    3001, 3128, 3268, 3306, 3389, 3689, 4443, 5000, 5001, 5060, 5222, 5432, 5601, 5900, 5984,
    6379, 6443, 7000, 7547, 8000, 8008, 8080, 8081, 8443, 8883, 8888, 9000, 9090, 9100, 9200,
    11211, 27017, 32400, 49152, 62078,
];

/// Immutable settings for one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortScannerConfiguration {
    /// Ports in probe order.
    pub ports: Vec<u16>,
    /// Per-probe connect timeout.
    pub timeout: Duration,
    /// Probes per batch.
    pub max_concurrency: usize,
    /// Pause inserted between batches.
    pub batch_pause: Duration,
}

impl Default for PortScannerConfiguration {
    fn default() -> Self {
        Self {
            ports: DEFAULT_PORTS.to_vec(),
            timeout: Duration::from_millis(750),
            max_concurrency: 32,
            batch_pause: Duration::from_millis(5),
        }
    }
}

/// How a single probe resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Open,
    /// Connection actively refused.
    Closed,
    /// No answer within the timeout.
    Filtered,
    /// Resolution or socket failure.
    Error(String),
}

/// Result of a completed scan.
#[derive(Debug, Clone)]
pub struct PortScanReport {
    pub target: String,
    pub mode: ScanMode,
    /// Open ports, ascending, no duplicates.
    pub open_ports: Vec<DiscoveredPort>,
    pub probed: usize,
    pub closed: usize,
    pub filtered: usize,
    pub errors: usize,
    /// Highest number of probes outstanding at once.
    pub peak_in_flight: usize,
    pub duration: Duration,
}

pub struct PortScanner {
    config: PortScannerConfiguration,
}

impl PortScanner {
    pub fn new(config: PortScannerConfiguration) -> Self {
        Self { config }
    }

    pub fn configuration(&self) -> &PortScannerConfiguration {
        &self.config
    }

    /// Scan `target`, calling `on_progress` once per resolved probe.
    ///
    /// Cancellation is checked before each batch, during the pause between
    /// batches and before each result is recorded. Probes already in flight when the token fires are left to
    /// finish in the background so their sockets close normally.
    pub async fn scan<F>(
        &self,
        target: &str,
        mode: ScanMode,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<PortScanReport, ScanError>
    where
        F: FnMut(ScanProgress) + Send,
    {
        if mode == ScanMode::Enhanced {
            return Err(ScanError::PrivilegesRequired);
        }
        if self.config.max_concurrency == 0 {
            return Err(ScanError::InvalidConfiguration(
                "max_concurrency must be at least 1".to_string(),
            ));
        }

        let started = Instant::now();
        let total = self.config.ports.len();
        let gauge = Arc::new(InFlightGauge::default());

        let mut completed = 0;
        let mut report = PortScanReport {
            target: target.to_string(),
            mode,
            open_ports: Vec::new(),
            probed: 0,
            closed: 0,
            filtered: 0,
            errors: 0,
            peak_in_flight: 0,
            duration: Duration::ZERO,
        };

        tracing::info!(
            target = %target,
            ports = total,
            max_concurrency = self.config.max_concurrency,
            "Starting port scan"
        );

        for (index, batch) in self.config.ports.chunks(self.config.max_concurrency).enumerate() {
            if cancel.is_cancelled() {
                return Err(ScanError::Cancelled);
            }
            if index > 0 && !self.config.batch_pause.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.config.batch_pause) => {}
                    _ = cancel.cancelled() => return Err(ScanError::Cancelled),
                }
            }

            let mut set = JoinSet::new();
            for &port in batch {
                let target = target.to_string();
                let gauge = gauge.clone();
                let timeout = self.config.timeout;
                set.spawn(async move {
                    let _slot = gauge.enter();
                    (port, probe(&target, port, timeout).await)
                });
            }

            while let Some(joined) = set.join_next().await {
                if cancel.is_cancelled() {
                    set.detach_all();
                    return Err(ScanError::Cancelled);
                }

                completed += 1;
                let last_port = match joined {
                    Ok((port, outcome)) => {
                        report.probed += 1;
                        match outcome {
                            ProbeOutcome::Open => report.open_ports.push(DiscoveredPort::open_tcp(port)),
                            ProbeOutcome::Closed => report.closed += 1,
                            ProbeOutcome::Filtered => report.filtered += 1,
                            ProbeOutcome::Error(cause) => {
                                tracing::debug!(target = %target, port, cause = %cause, "Probe error");
                                report.errors += 1;
                            }
                        }
                        Some(port)
                    }
                    Err(e) => {
                        tracing::warn!(target = %target, error = %e, "Probe task failed");
                        report.errors += 1;
                        None
                    }
                };

                on_progress(ScanProgress {
                    completed,
                    total,
                    last_port,
                    updated_at: Utc::now(),
                });
            }
        }

        report.open_ports.sort_by_key(|p| p.port);
        report.open_ports.dedup_by_key(|p| p.port);
        report.peak_in_flight = gauge.peak();
        report.duration = started.elapsed();

        tracing::info!(
            target = %target,
            open = report.open_ports.len(),
            closed = report.closed,
            filtered = report.filtered,
            errors = report.errors,
            peak_in_flight = report.peak_in_flight,
            duration_ms = report.duration.as_millis() as u64,
            "Port scan complete"
        );

        Ok(report)
    }
}

/// Resolve `target:port` and run one connect probe.
pub async fn probe(target: &str, port: u16, timeout: Duration) -> ProbeOutcome {
    let addr = match tokio::net::lookup_host((target, port)).await {
        Ok(mut addrs) => match addrs.next() {
            Some(addr) => addr,
            None => return ProbeOutcome::Error(format!("{target} resolved to no addresses")),
        },
        Err(e) => return ProbeOutcome::Error(format!("resolve {target}: {e}")),
    };

    match start_connect(addr) {
        Ok(Connect::Established) => ProbeOutcome::Open,
        Ok(Connect::Pending(socket)) => await_connect(socket, timeout).await,
        Err(e) => classify(&e),
    }
}

enum Connect {
    Established,
    Pending(Socket),
}

fn start_connect(addr: SocketAddr) -> io::Result<Connect> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_nonblocking(true)?;

    match socket.connect(&addr.into()) {
        Ok(()) => Ok(Connect::Established),
        Err(e) if connect_in_progress(&e) => Ok(Connect::Pending(socket)),
        Err(e) => Err(e),
    }
}

async fn await_connect(socket: Socket, timeout: Duration) -> ProbeOutcome {
    let stream = match tokio::net::TcpStream::from_std(socket.into()) {
        Ok(stream) => stream,
        Err(e) => return ProbeOutcome::Error(e.to_string()),
    };

    match tokio::time::timeout(timeout, stream.writable()).await {
        Err(_) => ProbeOutcome::Filtered,
        Ok(Err(e)) => classify(&e),
        Ok(Ok(())) => match stream.take_error() {
            Ok(None) => ProbeOutcome::Open,
            Ok(Some(e)) | Err(e) => classify(&e),
        },
    }
}

#[cfg(unix)]
fn connect_in_progress(e: &io::Error) -> bool {
    e.raw_os_error() == Some(libc::EINPROGRESS) || e.kind() == io::ErrorKind::WouldBlock
}

#[cfg(not(unix))]
fn connect_in_progress(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
}

fn classify(e: &io::Error) -> ProbeOutcome {
    match e.kind() {
        io::ErrorKind::ConnectionRefused => ProbeOutcome::Closed,
        io::ErrorKind::TimedOut => ProbeOutcome::Filtered,
        _ => ProbeOutcome::Error(e.to_string()),
    }
}

/// Counts probes currently connecting and remembers the maximum.
#[derive(Default)]
struct InFlightGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlightGauge {
    fn enter(self: &Arc<Self>) -> InFlightSlot {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlightSlot(self.clone())
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct InFlightSlot(Arc<InFlightGauge>);

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netmap_core::types::PortState;
    use std::collections::HashSet;

    async fn closed_port() -> u16 {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    fn scanner(ports: Vec<u16>, max_concurrency: usize) -> PortScanner {
        PortScanner::new(PortScannerConfiguration {
            ports,
            timeout: Duration::from_millis(500),
            max_concurrency,
            batch_pause: Duration::from_millis(1),
        })
    }

    #[test]
    fn default_list_is_unique() {
        let unique: HashSet<_> = DEFAULT_PORTS.iter().collect();
        assert_eq!(unique.len(), DEFAULT_PORTS.len());
        assert!(DEFAULT_PORTS.len() >= 85);
    }

    #[tokio::test]
    async fn reports_exactly_the_listening_ports() {
        let mut listeners = Vec::new();
        let mut open = Vec::new();
        for _ in 0..3 {
            let l = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            open.push(l.local_addr().unwrap().port());
            listeners.push(l);
        }
        let mut closed = Vec::new();
        for _ in 0..2 {
            closed.push(closed_port().await);
        }

        let mut ports = closed.clone();
        ports.extend(open.iter().rev());
        ports.push(open[0]);

        let mut updates = 0;
        let report = scanner(ports.clone(), 2)
            .scan("127.0.0.1", ScanMode::Standard, &CancellationToken::new(), |_| updates += 1)
            .await
            .unwrap();

        open.sort_unstable();
        let found: Vec<u16> = report.open_ports.iter().map(|p| p.port).collect();
        assert_eq!(found, open);
        assert!(report.open_ports.iter().all(|p| p.state == PortState::Open));
        assert_eq!(report.closed, 2);
        assert_eq!(updates, ports.len());
    }

    #[tokio::test]
    async fn open_and_closed_on_loopback() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open = listener.local_addr().unwrap().port();
        let closed = closed_port().await;

        let report = scanner(vec![open, closed], 32)
            .scan("127.0.0.1", ScanMode::Standard, &CancellationToken::new(), |_| {})
            .await
            .unwrap();

        assert_eq!(report.open_ports, vec![DiscoveredPort::open_tcp(open)]);
    }

    #[tokio::test]
    async fn enhanced_mode_requires_privileges() {
        let err = scanner(vec![80], 4)
            .scan("127.0.0.1", ScanMode::Enhanced, &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err, ScanError::PrivilegesRequired);
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let mut updates = 0;
        let err = scanner(vec![1, 2, 3], 1)
            .scan("127.0.0.1", ScanMode::Standard, &token, |_| updates += 1)
            .await
            .unwrap_err();
        assert_eq!(err, ScanError::Cancelled);
        assert_eq!(updates, 0);
    }

    #[tokio::test]
    async fn cancellation_between_results() {
        let token = CancellationToken::new();
        let ports: Vec<u16> = vec![closed_port().await; 10];
        let trigger = token.clone();

        let mut updates = 0;
        let err = scanner(ports, 1)
            .scan("127.0.0.1", ScanMode::Standard, &token, |_| {
                updates += 1;
                if updates == 3 {
                    trigger.cancel();
                }
            })
            .await
            .unwrap_err();

        assert_eq!(err, ScanError::Cancelled);
        assert_eq!(updates, 3);
    }

    #[tokio::test]
    async fn cancellation_during_batch_pause() {
        let closed = closed_port().await;
        let scanner = PortScanner::new(PortScannerConfiguration {
            ports: vec![closed, closed, closed],
            timeout: Duration::from_millis(500),
            max_concurrency: 1,
            batch_pause: Duration::from_secs(30),
        });

        let token = CancellationToken::new();
        let trigger = token.clone();
        let mut updates = 0;
        let scan = scanner.scan("127.0.0.1", ScanMode::Standard, &token, |_| {
            updates += 1;
            let trigger = trigger.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                trigger.cancel();
            });
        });

        let err = tokio::time::timeout(Duration::from_secs(5), scan)
            .await
            .expect("scan kept sleeping after cancellation")
            .unwrap_err();
        assert_eq!(err, ScanError::Cancelled);
        assert_eq!(updates, 1);
    }

    #[tokio::test]
    async fn unresolvable_target_is_a_per_probe_error() {
        let report = scanner(vec![80, 443], 2)
            .scan("netmap-host.invalid", ScanMode::Standard, &CancellationToken::new(), |_| {})
            .await
            .unwrap();
        assert!(report.open_ports.is_empty());
        assert_eq!(report.errors, 2);
    }

    #[tokio::test]
    async fn in_flight_probes_never_exceed_batch_size() {
        // TEST-NET-1: never routable, so probes time out or fail fast.
        let ports: Vec<u16> = (20_000..20_200).collect();
        let scanner = PortScanner::new(PortScannerConfiguration {
            ports,
            timeout: Duration::from_millis(50),
            max_concurrency: 16,
            batch_pause: Duration::ZERO,
        });

        let mut updates = 0;
        let report = scanner
            .scan("192.0.2.1", ScanMode::Standard, &CancellationToken::new(), |_| updates += 1)
            .await
            .unwrap();

        assert_eq!(updates, 200);
        assert!(report.peak_in_flight >= 1);
        assert!(report.peak_in_flight <= 16);
        assert!(report.open_ports.is_empty());
    }

    #[tokio::test]
    async fn zero_concurrency_is_rejected() {
        let err = scanner(vec![80], 0)
            .scan("127.0.0.1", ScanMode::Standard, &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidConfiguration(_)));
    }
}
