use crate::ports::PortSet;
use crate::services::ServiceLookup;
use crate::types::{ProbeOutcome, ResultSet, ScanReport};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("scan cancelled after {completed} of {total} ports")]
    Cancelled { completed: usize, total: usize },
}

/// Attempt one TCP connect to `host:port`, bounded by `timeout`.
///
/// Name resolution happens inside the same timeout. Every resolved address is
/// tried in turn, IPv6 included, so `::1` or a name that only resolves to IPv6
/// can be scanned. Refused, unreachable, unresolvable and timed-out attempts
/// all report `open = false`; nothing is read or written and the stream is
/// dropped as soon as the connect returns.
pub async fn probe(host: &str, port: u16, timeout: Duration) -> ProbeOutcome {
    let start = Instant::now();
    let open = match time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(_stream)) => true,
        Ok(Err(e)) => {
            trace!(port, error = %e, "connect failed");
            false
        }
        Err(_elapsed) => false,
    };
    trace!(port, open, latency_ms = start.elapsed().as_millis() as u64, "probe done");
    ProbeOutcome { port, open }
}

/// Scan every port in `ports` on `host` using asynchronous TCP connects with a concurrency limit.
///
/// - Limits in-flight connects using a `Semaphore` of `max_concurrency` permits.
/// - Uses `tokio::time::timeout` to bound each connect; there is no scan-wide deadline.
/// - Collects outcomes as they complete and annotates them from `services`.
///
/// Every port appears in the report exactly once. An empty port set yields an empty report.
/// Without a cancellation token the scan always runs to completion.
pub async fn scan_host(
    host: &str,
    ports: &PortSet,
    timeout: Duration,
    max_concurrency: usize,
    services: &ServiceLookup,
) -> Result<ScanReport, ScanError> {
    scan_host_internal(host, ports, timeout, max_concurrency, services, None).await
}

/// Variant that accepts a `CancellationToken` to allow external cancellation.
///
/// A cancelled scan aborts outstanding probes and returns no partial results.
pub async fn scan_host_with_cancel(
    host: &str,
    ports: &PortSet,
    timeout: Duration,
    max_concurrency: usize,
    services: &ServiceLookup,
    cancel: CancellationToken,
) -> Result<ScanReport, ScanError> {
    scan_host_internal(host, ports, timeout, max_concurrency, services, Some(&cancel)).await
}

async fn scan_host_internal(
    host: &str,
    ports: &PortSet,
    timeout: Duration,
    max_concurrency: usize,
    services: &ServiceLookup,
    cancel_opt: Option<&CancellationToken>,
) -> Result<ScanReport, ScanError> {
    let total = ports.len();
    let workers = max_concurrency.clamp(1, Semaphore::MAX_PERMITS);
    info!(host, ports = total, workers, timeout_ms = timeout.as_millis() as u64, "scan started");

    let sem = Arc::new(Semaphore::new(workers));
    let target: Arc<str> = Arc::from(host);
    let mut set = JoinSet::new();
    let mut port_of = HashMap::with_capacity(total);
    let mut results = ResultSet::new();

    let cancelled = async {
        match cancel_opt {
            Some(cancel) => cancel.cancelled().await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(cancelled);

    let start = Instant::now();
    for port in ports.iter() {
        let sem = sem.clone();
        let target = target.clone();
        let handle = set.spawn(async move {
            // Held until the probe finishes.
            let Ok(_permit) = sem.acquire_owned().await else {
                return ProbeOutcome { port, open: false };
            };
            probe(&target, port, timeout).await
        });
        port_of.insert(handle.id(), port);
    }

    loop {
        let joined = tokio::select! {
            biased;
            _ = &mut cancelled => {
                set.abort_all();
                let completed = results.len();
                info!(host, completed, total, "scan cancelled");
                return Err(ScanError::Cancelled { completed, total });
            }
            joined = set.join_next_with_id() => joined,
        };

        let outcome = match joined {
            None => break,
            Some(Ok((_, outcome))) => outcome,
            Some(Err(e)) => {
                let Some(&port) = port_of.get(&e.id()) else {
                    error!(error = %e, "probe task for unknown port failed");
                    continue;
                };
                error!(port, error = %e, "probe task failed; recording port as closed");
                ProbeOutcome { port, open: false }
            }
        };

        if outcome.open {
            debug!(port = outcome.port, "open");
        }
        results.insert(outcome.port, services.enrich(&outcome));
    }
    let elapsed = start.elapsed();

    let report = ScanReport {
        host: host.to_string(),
        elapsed,
        ports: results,
    };
    info!(
        host,
        open = report.open_count(),
        scanned = report.ports.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "scan finished"
    );
    Ok(report)
}
