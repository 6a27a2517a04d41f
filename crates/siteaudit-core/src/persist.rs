//! Persistence records and the sink collaborators store them through
//!
//! The scanner never talks to a datastore. Callers turn a [`ScanResult`] into
//! rows with [`persist_scan`] and hand them to an [`AuditSink`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::SinkError;
use crate::types::{AuditIssue, Category, Evidence, ScanMeta, ScanResult, ScanStats, Severity};
use crate::url_utils::normalize_url;

/// `audit_type` of every row the scanner produces
pub const AUDIT_TYPE: &str = "technical";

/// Agent name written to the run log
pub const AGENT_NAME: &str = "technical-seo-audit";

/// One stored issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditIssueRecord {
    pub client_id: String,
    pub audit_type: String,
    pub url: String,
    pub severity: Severity,
    pub category: Category,
    pub title: String,
    pub description: String,
    pub recommendation: String,
    pub evidence: Evidence,
    pub is_fixed: bool,
}

impl AuditIssueRecord {
    pub fn from_issue(client_id: &str, issue: &AuditIssue) -> Self {
        Self {
            client_id: client_id.to_string(),
            audit_type: AUDIT_TYPE.to_string(),
            url: issue.url.clone(),
            severity: issue.severity,
            category: issue.category,
            title: issue.title.clone(),
            description: issue.description.clone(),
            recommendation: issue.recommendation.clone(),
            evidence: issue.evidence.clone(),
            is_fixed: false,
        }
    }
}

/// The `results` payload of a summary row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResults {
    pub score: u8,
    pub domain: String,
    pub scanned_at: DateTime<Utc>,
    pub stats: ScanStats,
    pub meta: ScanMeta,
    pub issue_count: usize,
}

/// One stored scan summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSummaryRecord {
    pub client_id: String,
    pub url: String,
    pub status: String,
    pub pages_scanned: u32,
    pub results: SummaryResults,
    pub completed_at: DateTime<Utc>,
}

impl AuditSummaryRecord {
    /// `url` is the target as it was scanned.
    pub fn from_result(
        client_id: &str,
        url: &str,
        result: &ScanResult,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            client_id: client_id.to_string(),
            url: normalize_url(url),
            status: "completed".to_string(),
            pages_scanned: 1,
            results: SummaryResults {
                score: result.score,
                domain: result.domain.clone(),
                scanned_at: result.scanned_at,
                stats: result.stats,
                meta: result.meta,
                issue_count: result.issues.len(),
            },
            completed_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Success,
    Failure,
}

/// Activity-log entry for one scan attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLogRecord {
    pub agent: String,
    pub client_id: String,
    pub outcome: RunOutcome,
    pub duration_ms: u64,
    pub summary: String,
    pub logged_at: DateTime<Utc>,
}

impl RunLogRecord {
    pub fn success(client_id: &str, result: &ScanResult, duration: Duration) -> Self {
        Self::new(
            client_id,
            RunOutcome::Success,
            duration,
            format!(
                "Scanned {}: score {}, {} issues",
                result.domain,
                result.score,
                result.issues.len()
            ),
        )
    }

    pub fn failure(client_id: &str, error: &str, duration: Duration) -> Self {
        Self::new(client_id, RunOutcome::Failure, duration, format!("Scan failed: {error}"))
    }

    fn new(client_id: &str, outcome: RunOutcome, duration: Duration, summary: String) -> Self {
        Self {
            agent: AGENT_NAME.to_string(),
            client_id: client_id.to_string(),
            outcome,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            summary,
            logged_at: Utc::now(),
        }
    }
}

/// Datastore collaborator. Implementations assign row identifiers.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Store issue rows, returning their ids in input order.
    async fn insert_issues(&self, rows: &[AuditIssueRecord]) -> Result<Vec<String>, SinkError>;

    async fn insert_summary(&self, row: &AuditSummaryRecord) -> Result<String, SinkError>;

    async fn record_run(&self, row: &RunLogRecord) -> Result<(), SinkError>;
}

/// What a [`persist_scan`] call managed to store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistOutcome {
    pub issue_ids: Vec<String>,
    pub summary_id: Option<String>,

    /// One entry per failed write
    pub warnings: Vec<String>,
}

impl PersistOutcome {
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Store issues, summary and run-log row for one scan.
///
/// Each write is attempted independently. A failed write is logged and
/// recorded as a warning; the scan itself still counts as successful.
pub async fn persist_scan<S>(
    sink: &S,
    client_id: &str,
    url: &str,
    result: &ScanResult,
    duration: Duration,
) -> PersistOutcome
where
    S: AuditSink + ?Sized,
{
    let mut outcome = PersistOutcome::default();

    let rows: Vec<AuditIssueRecord> = result
        .issues
        .iter()
        .map(|issue| AuditIssueRecord::from_issue(client_id, issue))
        .collect();
    if !rows.is_empty() {
        match sink.insert_issues(&rows).await {
            Ok(ids) => outcome.issue_ids = ids,
            Err(err) => {
                warn!(client_id, error = %err, rows = rows.len(), "failed to store audit issues");
                outcome.warnings.push(format!("issues not stored: {err}"));
            }
        }
    }

    let summary = AuditSummaryRecord::from_result(client_id, url, result, Utc::now());
    match sink.insert_summary(&summary).await {
        Ok(id) => outcome.summary_id = Some(id),
        Err(err) => {
            warn!(client_id, error = %err, "failed to store audit summary");
            outcome.warnings.push(format!("summary not stored: {err}"));
        }
    }

    let run = RunLogRecord::success(client_id, result, duration);
    if let Err(err) = sink.record_run(&run).await {
        warn!(client_id, error = %err, "failed to record run");
        outcome.warnings.push(format!("run log not stored: {err}"));
    }

    debug!(
        client_id,
        issues = outcome.issue_ids.len(),
        warnings = outcome.warnings.len(),
        "scan persisted"
    );
    outcome
}

#[derive(Debug, Default)]
struct Tables {
    issues: Vec<(String, AuditIssueRecord)>,
    summaries: Vec<(String, AuditSummaryRecord)>,
    runs: Vec<RunLogRecord>,
    next_id: u64,
}

impl Tables {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

/// In-process [`AuditSink`]
#[derive(Debug, Default)]
pub struct MemorySink {
    tables: Mutex<Tables>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issues(&self) -> Vec<(String, AuditIssueRecord)> {
        self.tables
            .lock()
            .map(|t| t.issues.clone())
            .unwrap_or_default()
    }

    pub fn summaries(&self) -> Vec<(String, AuditSummaryRecord)> {
        self.tables
            .lock()
            .map(|t| t.summaries.clone())
            .unwrap_or_default()
    }

    pub fn runs(&self) -> Vec<RunLogRecord> {
        self.tables.lock().map(|t| t.runs.clone()).unwrap_or_default()
    }

    fn with_tables<T>(&self, apply: impl FnOnce(&mut Tables) -> T) -> Result<T, SinkError> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| SinkError::Unavailable("memory sink lock poisoned".to_string()))?;
        Ok(apply(&mut tables))
    }
}

#[async_trait]
impl AuditSink for MemorySink {
    async fn insert_issues(&self, rows: &[AuditIssueRecord]) -> Result<Vec<String>, SinkError> {
        self.with_tables(|tables| {
            rows.iter()
                .map(|row| {
                    let id = tables.next_id("issue");
                    tables.issues.push((id.clone(), row.clone()));
                    id
                })
                .collect()
        })
    }

    async fn insert_summary(&self, row: &AuditSummaryRecord) -> Result<String, SinkError> {
        self.with_tables(|tables| {
            let id = tables.next_id("audit");
            tables.summaries.push((id.clone(), row.clone()));
            id
        })
    }

    async fn record_run(&self, row: &RunLogRecord) -> Result<(), SinkError> {
        self.with_tables(|tables| tables.runs.push(row.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::unreachable_result;
    use crate::scoring::score_issues;
    use serde_json::json;

    fn sample_result() -> ScanResult {
        let issues = vec![
            AuditIssue::new(Severity::Critical, Category::Seo, "Missing page title", "https://example.com"),
            AuditIssue::new(Severity::Low, Category::Seo, "Missing favicon", "https://example.com/favicon.ico")
                .evidence(json!({ "status": 404 })),
        ];
        let card = score_issues(&issues, 18);
        ScanResult {
            domain: "example.com".to_string(),
            scanned_at: Utc::now(),
            score: card.score,
            issues,
            stats: card.stats,
            meta: ScanMeta {
                response_time_ms: 420,
                http_status: 200,
                redirects: true,
                ssl: true,
            },
        }
    }

    /// Rejects the tables it is told to
    struct FailingSink {
        inner: MemorySink,
        fail_issues: bool,
        fail_summary: bool,
    }

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn insert_issues(&self, rows: &[AuditIssueRecord]) -> Result<Vec<String>, SinkError> {
            if self.fail_issues {
                return Err(SinkError::Rejected {
                    table: "audit_issues".to_string(),
                    message: "constraint violation".to_string(),
                });
            }
            self.inner.insert_issues(rows).await
        }

        async fn insert_summary(&self, row: &AuditSummaryRecord) -> Result<String, SinkError> {
            if self.fail_summary {
                return Err(SinkError::Unavailable("connection reset".to_string()));
            }
            self.inner.insert_summary(row).await
        }

        async fn record_run(&self, row: &RunLogRecord) -> Result<(), SinkError> {
            self.inner.record_run(row).await
        }
    }

    #[test]
    fn test_issue_record_fields() {
        let result = sample_result();
        let record = AuditIssueRecord::from_issue("client-7", &result.issues[1]);
        assert_eq!(record.client_id, "client-7");
        assert_eq!(record.audit_type, "technical");
        assert!(!record.is_fixed);
        assert_eq!(record.url, "https://example.com/favicon.ico");

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["severity"], "low");
        assert_eq!(value["category"], "seo");
        assert_eq!(value["evidence"]["status"], 404);
    }

    #[test]
    fn test_summary_results_are_camel_case() {
        let result = sample_result();
        let summary =
            AuditSummaryRecord::from_result("client-7", "example.com", &result, Utc::now());
        assert_eq!(summary.url, "https://example.com");
        assert_eq!(summary.status, "completed");
        assert_eq!(summary.pages_scanned, 1);

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["results"]["issueCount"], 2);
        assert_eq!(value["results"]["score"], 83);
        assert_eq!(value["results"]["stats"]["passedChecks"], 16);
        assert_eq!(value["results"]["meta"]["responseTimeMs"], 420);
        assert!(value["results"]["scannedAt"].is_string());
        assert!(value["completed_at"].is_string());
    }

    #[tokio::test]
    async fn test_persist_scan_stores_everything() {
        let sink = MemorySink::new();
        let result = sample_result();

        let outcome = persist_scan(
            &sink,
            "client-7",
            "example.com",
            &result,
            Duration::from_millis(1200),
        )
        .await;

        assert!(outcome.is_complete());
        assert_eq!(outcome.issue_ids.len(), 2);
        assert!(outcome.summary_id.is_some());
        assert_eq!(sink.issues().len(), 2);
        assert_eq!(sink.summaries().len(), 1);

        let runs = sink.runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].outcome, RunOutcome::Success);
        assert_eq!(runs[0].duration_ms, 1200);
        assert_eq!(runs[0].agent, AGENT_NAME);
        assert!(runs[0].summary.contains("score 83"));
    }

    #[tokio::test]
    async fn test_issue_insert_failure_is_a_warning() {
        let sink = FailingSink {
            inner: MemorySink::new(),
            fail_issues: true,
            fail_summary: false,
        };

        let outcome =
            persist_scan(&sink, "client-7", "example.com", &sample_result(), Duration::ZERO).await;

        assert!(!outcome.is_complete());
        assert!(outcome.issue_ids.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("audit_issues"));
        // The other writes still happen.
        assert!(outcome.summary_id.is_some());
        assert_eq!(sink.inner.runs().len(), 1);
    }

    #[tokio::test]
    async fn test_summary_failure_is_a_warning() {
        let sink = FailingSink {
            inner: MemorySink::new(),
            fail_issues: false,
            fail_summary: true,
        };

        let outcome =
            persist_scan(&sink, "client-7", "example.com", &sample_result(), Duration::ZERO).await;
        assert_eq!(outcome.issue_ids.len(), 2);
        assert_eq!(outcome.summary_id, None);
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_scan_is_persisted() {
        let sink = MemorySink::new();
        let result = unreachable_result("down.example".to_string(), "https://down.example");

        let outcome = persist_scan(&sink, "client-9", "down.example", &result, Duration::ZERO).await;

        assert!(outcome.is_complete());
        assert_eq!(sink.issues()[0].1.title, "Site unreachable");
        assert_eq!(sink.summaries()[0].1.results.score, 0);
    }

    #[test]
    fn test_summary_url_is_the_scanned_target() {
        let result = sample_result();
        let record =
            |url: &str| AuditSummaryRecord::from_result("client-7", url, &result, Utc::now()).url;

        assert_eq!(record("http://example.com/"), "http://example.com");
        assert_eq!(record("https://example.com/shop/"), "https://example.com/shop");
        assert_eq!(record("www.example.com"), "https://www.example.com");
    }
}
