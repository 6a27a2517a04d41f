//! Client-driven triggers: on-demand audits and the sequential batch driver

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::TriggerError;
use crate::fetch::Fetch;
use crate::persist::{AuditSink, PersistOutcome, RunLogRecord, persist_scan};
use crate::scanner::Scanner;
use crate::types::ScanResult;

/// A client and the site to audit for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientTarget {
    pub client_id: String,
    pub url: String,
}

impl ClientTarget {
    pub fn new(client_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            url: url.into(),
        }
    }
}

/// Lookup of clients and their websites
#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn active_clients(&self) -> Result<Vec<ClientTarget>, TriggerError>;

    async fn find_client(&self, client_id: &str) -> Result<Option<ClientTarget>, TriggerError>;
}

/// In-process [`ClientStore`]
#[derive(Debug, Default)]
pub struct MemoryClientStore {
    clients: Mutex<Vec<(ClientTarget, bool)>>,
}

impl MemoryClientStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(self, target: ClientTarget) -> Self {
        self.insert(target, true)
    }

    /// Known client that the scheduled run skips
    pub fn with_inactive_client(self, target: ClientTarget) -> Self {
        self.insert(target, false)
    }

    fn insert(self, target: ClientTarget, active: bool) -> Self {
        if let Ok(mut clients) = self.clients.lock() {
            clients.push((target, active));
        }
        self
    }

    fn snapshot(&self) -> Result<Vec<(ClientTarget, bool)>, TriggerError> {
        self.clients
            .lock()
            .map(|clients| clients.clone())
            .map_err(|_| TriggerError::Store("client store lock poisoned".to_string()))
    }
}

#[async_trait]
impl ClientStore for MemoryClientStore {
    async fn active_clients(&self) -> Result<Vec<ClientTarget>, TriggerError> {
        Ok(self
            .snapshot()?
            .into_iter()
            .filter_map(|(target, active)| active.then_some(target))
            .collect())
    }

    async fn find_client(&self, client_id: &str) -> Result<Option<ClientTarget>, TriggerError> {
        Ok(self
            .snapshot()?
            .into_iter()
            .map(|(target, _)| target)
            .find(|target| target.client_id == client_id))
    }
}

/// Result of an on-demand audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientAudit {
    pub result: ScanResult,
    pub persisted: PersistOutcome,
}

/// Resolve `client_id`, scan its site and persist the result.
pub async fn audit_client<F, C, S>(
    scanner: &Scanner<F>,
    store: &C,
    sink: &S,
    client_id: &str,
) -> Result<ClientAudit, TriggerError>
where
    F: Fetch,
    C: ClientStore + ?Sized,
    S: AuditSink + ?Sized,
{
    let target = store
        .find_client(client_id)
        .await?
        .ok_or_else(|| TriggerError::ClientNotFound(client_id.to_string()))?;

    let started = Instant::now();
    let result = scanner.scan_domain(&target.url).await?;
    let persisted = persist_scan(
        sink,
        &target.client_id,
        &target.url,
        &result,
        started.elapsed(),
    )
    .await;

    Ok(ClientAudit { result, persisted })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchOutcome {
    Succeeded {
        score: u8,
        issue_count: usize,
        warnings: Vec<String>,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub client_id: String,
    pub url: String,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

/// Per-target tally of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub entries: Vec<BatchEntry>,
}

/// Scan `targets` one after another, persisting each result.
///
/// A failing target is recorded and the batch moves on. `on_result` sees
/// every completed scan, in order.
pub async fn run_batch<F, S>(
    scanner: &Scanner<F>,
    sink: &S,
    targets: &[ClientTarget],
    mut on_result: impl FnMut(&ClientTarget, &ScanResult),
) -> BatchSummary
where
    F: Fetch,
    S: AuditSink + ?Sized,
{
    let mut summary = BatchSummary {
        total: targets.len(),
        ..BatchSummary::default()
    };

    for target in targets {
        let started = Instant::now();
        let outcome = match scanner.scan_domain(&target.url).await {
            Ok(result) => {
                let persisted = persist_scan(
                    sink,
                    &target.client_id,
                    &target.url,
                    &result,
                    started.elapsed(),
                )
                .await;
                on_result(target, &result);
                summary.succeeded += 1;
                BatchOutcome::Succeeded {
                    score: result.score,
                    issue_count: result.issues.len(),
                    warnings: persisted.warnings,
                }
            }
            Err(err) => {
                warn!(client_id = %target.client_id, url = %target.url, error = %err, "scan failed");
                let run = RunLogRecord::failure(&target.client_id, &err.to_string(), started.elapsed());
                if let Err(sink_err) = sink.record_run(&run).await {
                    warn!(client_id = %target.client_id, error = %sink_err, "failed to record run");
                }
                summary.failed += 1;
                BatchOutcome::Failed {
                    error: err.to_string(),
                }
            }
        };

        summary.entries.push(BatchEntry {
            client_id: target.client_id.clone(),
            url: target.url.clone(),
            outcome,
        });
    }

    info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "batch complete"
    );
    summary
}

/// Audit every active client in the store.
pub async fn run_scheduled<F, C, S>(
    scanner: &Scanner<F>,
    store: &C,
    sink: &S,
) -> Result<BatchSummary, TriggerError>
where
    F: Fetch,
    C: ClientStore + ?Sized,
    S: AuditSink + ?Sized,
{
    let clients = store.active_clients().await?;
    info!(clients = clients.len(), "starting scheduled audit");
    Ok(run_batch(scanner, sink, &clients, |_, _| {}).await)
}
