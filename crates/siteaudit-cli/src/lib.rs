//! Helpers behind the `siteaudit` binary
//!
//! Kept in a library so they can be tested without running the CLI.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Write as FmtWrite;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use siteaudit_core::batch::{BatchOutcome, BatchSummary};
use siteaudit_core::persist::{AuditIssueRecord, AuditSummaryRecord, RunLogRecord};
use siteaudit_core::{AuditSink, ClientTarget, ScanResult, Severity, SinkError, normalize_domain};

const DIVIDER: &str = "─────────────────────────────────────────────────────────────";
const LABEL_WIDTH: usize = 16;

/// Domains listed in a text file: one per line, blanks and `#` comments skipped.
pub fn parse_domain_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// One batch target per domain, keyed by the normalized domain.
///
/// Later duplicates of an already listed domain are dropped.
pub fn targets_from_domains(domains: &[String]) -> Vec<ClientTarget> {
    let mut targets: Vec<ClientTarget> = Vec::new();
    for domain in domains {
        let client_id = normalize_domain(domain);
        if targets.iter().any(|t| t.client_id == client_id) {
            continue;
        }
        targets.push(ClientTarget::new(client_id, domain.trim()));
    }
    targets
}

fn push_section_header(buf: &mut String, icon: &str, title: &str) {
    let _ = writeln!(buf, "{DIVIDER}");
    let _ = writeln!(buf, "{icon} {title}");
    let _ = writeln!(buf, "{DIVIDER}");
}

fn push_key_value(buf: &mut String, label: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    let _ = writeln!(buf, "• {:<width$} : {}", label, value, width = LABEL_WIDTH);
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn severity_icon(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "🔴",
        Severity::High => "🟠",
        Severity::Medium => "🟡",
        Severity::Low => "🔵",
        Severity::Info => "⚪",
    }
}

/// Human-readable report for one scan, issues most severe first
pub fn render_report(result: &ScanResult) -> String {
    let mut buf = String::new();
    push_section_header(&mut buf, "🔍", &result.domain);

    let stats = &result.stats;
    push_key_value(&mut buf, "Score", &format!("{}/100", result.score));
    push_key_value(
        &mut buf,
        "Checks passed",
        &format!("{}/{}", stats.passed_checks, stats.total_checks),
    );

    if !result.is_unreachable() {
        push_key_value(
            &mut buf,
            "Response time",
            &format!("{} ms", result.meta.response_time_ms),
        );
        push_key_value(&mut buf, "HTTP status", &result.meta.http_status.to_string());
        push_key_value(&mut buf, "SSL", yes_no(result.meta.ssl));
        push_key_value(&mut buf, "HTTPS redirect", yes_no(result.meta.redirects));
    }

    let counts: Vec<String> = Severity::ALL
        .iter()
        .map(|&severity| format!("{} {severity}", stats.count(severity)))
        .collect();
    push_key_value(&mut buf, "Issues", &counts.join(", "));
    let _ = writeln!(buf);

    if result.issues.is_empty() {
        let _ = writeln!(buf, "✓ No issues found.");
        let _ = writeln!(buf);
        return buf;
    }

    for issue in result.issues_by_severity() {
        let _ = writeln!(
            buf,
            "{} [{}] {} ({})",
            severity_icon(issue.severity),
            issue.severity.as_str().to_uppercase(),
            issue.title,
            issue.category
        );
        if !issue.description.is_empty() {
            let _ = writeln!(buf, "    {}", issue.description);
        }
        if !issue.recommendation.is_empty() {
            let _ = writeln!(buf, "    ↳ {}", issue.recommendation);
        }
    }
    let _ = writeln!(buf);
    buf
}

/// Closing tally for a batch, with one line per failed target
pub fn render_batch_summary(summary: &BatchSummary) -> String {
    let mut buf = String::new();
    let _ = writeln!(
        buf,
        "Scanned {} site(s): {} succeeded, {} failed",
        summary.total, summary.succeeded, summary.failed
    );
    for entry in &summary.entries {
        match &entry.outcome {
            BatchOutcome::Failed { error } => {
                let _ = writeln!(buf, "  ✗ {}: {error}", entry.url);
            }
            BatchOutcome::Succeeded { warnings, .. } => {
                for warning in warnings {
                    let _ = writeln!(buf, "  ! {}: {warning}", entry.url);
                }
            }
        }
    }
    buf
}

#[derive(Serialize)]
struct RecordLine<'a, T> {
    table: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    row: &'a T,
}

#[derive(Debug)]
struct LineWriter<W> {
    out: W,
    next_id: u64,
}

/// [`AuditSink`] that appends every row to a JSON-lines file
#[derive(Debug)]
pub struct JsonLinesSink<W: Write + Send = BufWriter<File>> {
    inner: Mutex<LineWriter<W>>,
}

impl JsonLinesSink {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            inner: Mutex::new(LineWriter { out, next_id: 0 }),
        }
    }

    pub fn into_inner(self) -> Option<W> {
        self.inner.into_inner().ok().map(|writer| writer.out)
    }

    /// Write `rows` under `table`, assigning ids when `prefix` is given.
    fn append<T: Serialize>(
        &self,
        table: &str,
        prefix: Option<&str>,
        rows: &[T],
    ) -> Result<Vec<String>, SinkError> {
        let mut writer = self
            .inner
            .lock()
            .map_err(|_| SinkError::Unavailable("record writer lock poisoned".to_string()))?;
        let reject = |message: String| SinkError::Rejected {
            table: table.to_string(),
            message,
        };

        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            let id = prefix.map(|prefix| {
                writer.next_id += 1;
                format!("{prefix}-{}", writer.next_id)
            });
            let line = RecordLine {
                table,
                id: id.as_deref(),
                row,
            };
            let json = serde_json::to_string(&line).map_err(|e| reject(e.to_string()))?;
            writeln!(writer.out, "{json}").map_err(|e| reject(e.to_string()))?;
            ids.extend(id);
        }
        writer.out.flush().map_err(|e| reject(e.to_string()))?;
        Ok(ids)
    }
}

#[async_trait]
impl<W: Write + Send> AuditSink for JsonLinesSink<W> {
    async fn insert_issues(&self, rows: &[AuditIssueRecord]) -> Result<Vec<String>, SinkError> {
        self.append("audit_issues", Some("issue"), rows)
    }

    async fn insert_summary(&self, row: &AuditSummaryRecord) -> Result<String, SinkError> {
        self.append("audits", Some("audit"), std::slice::from_ref(row))?
            .pop()
            .ok_or_else(|| SinkError::Unavailable("no id assigned".to_string()))
    }

    async fn record_run(&self, row: &RunLogRecord) -> Result<(), SinkError> {
        self.append("agent_runs", None, std::slice::from_ref(row))
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use siteaudit_core::persist::persist_scan;
    use siteaudit_core::{AuditIssue, Category, ScanMeta, TOTAL_CHECKS, score_issues};
    use std::time::Duration;

    fn result_with(issues: Vec<AuditIssue>) -> ScanResult {
        let card = score_issues(&issues, TOTAL_CHECKS);
        ScanResult {
            domain: "example.com".to_string(),
            scanned_at: "2026-03-01T12:00:00Z".parse().unwrap(),
            score: card.score,
            issues,
            stats: card.stats,
            meta: ScanMeta {
                response_time_ms: 640,
                http_status: 200,
                redirects: true,
                ssl: false,
            },
        }
    }

    #[test]
    fn test_parse_domain_list() {
        let content = "# clients\nexample.com\n\n  https://www.example.org/  \n# paused\n";
        assert_eq!(
            parse_domain_list(content),
            vec!["example.com", "https://www.example.org/"]
        );
        assert!(parse_domain_list("\n# nothing\n").is_empty());
    }

    #[test]
    fn test_targets_are_deduplicated_by_domain() {
        let domains = vec![
            "example.com".to_string(),
            "https://www.example.com/".to_string(),
            "example.org".to_string(),
        ];
        let targets = targets_from_domains(&domains);
        assert_eq!(
            targets,
            vec![
                ClientTarget::new("example.com", "example.com"),
                ClientTarget::new("example.org", "example.org"),
            ]
        );
    }

    #[test]
    fn test_report_lists_issues_by_severity() {
        let result = result_with(vec![
            AuditIssue::new(Severity::Low, Category::Seo, "Missing favicon", "u"),
            AuditIssue::new(Severity::Critical, Category::Security, "SSL certificate invalid", "u")
                .description("The site could not be loaded securely over HTTPS.")
                .recommendation("Install a valid TLS certificate."),
        ]);

        let report = render_report(&result);
        assert!(report.contains("example.com"));
        assert!(report.contains("Score            : 83/100"));
        assert!(report.contains("Checks passed    : 16/18"));
        assert!(report.contains("SSL              : no"));
        assert!(report.contains("1 critical, 0 high, 0 medium, 1 low, 0 info"));

        let critical = report.find("[CRITICAL] SSL certificate invalid (security)").unwrap();
        let low = report.find("[LOW] Missing favicon (seo)").unwrap();
        assert!(critical < low);
        assert!(report.contains("    ↳ Install a valid TLS certificate."));
    }

    #[test]
    fn test_report_without_issues() {
        let report = render_report(&result_with(vec![]));
        assert!(report.contains("Score            : 100/100"));
        assert!(report.contains("✓ No issues found."));
    }

    #[test]
    fn test_batch_summary_lists_failures() {
        let summary = BatchSummary {
            total: 2,
            succeeded: 1,
            failed: 1,
            entries: vec![
                siteaudit_core::batch::BatchEntry {
                    client_id: "ok".to_string(),
                    url: "ok.example".to_string(),
                    outcome: BatchOutcome::Succeeded {
                        score: 90,
                        issue_count: 2,
                        warnings: vec![],
                    },
                },
                siteaudit_core::batch::BatchEntry {
                    client_id: "bad".to_string(),
                    url: " ".to_string(),
                    outcome: BatchOutcome::Failed {
                        error: "invalid domain".to_string(),
                    },
                },
            ],
        };

        let text = render_batch_summary(&summary);
        assert!(text.starts_with("Scanned 2 site(s): 1 succeeded, 1 failed"));
        assert!(text.contains("✗  : invalid domain"));
    }

    #[tokio::test]
    async fn test_json_lines_sink_writes_every_table() {
        let sink = JsonLinesSink::new(Vec::new());
        let result = result_with(vec![
            AuditIssue::new(Severity::High, Category::Seo, "Missing meta description", "u"),
            AuditIssue::new(Severity::Info, Category::Seo, "Missing llms.txt", "u"),
        ]);

        let outcome = persist_scan(
            &sink,
            "example.com",
            "example.com",
            &result,
            Duration::from_millis(5),
        )
        .await;
        assert!(outcome.is_complete());
        assert_eq!(outcome.issue_ids, vec!["issue-1", "issue-2"]);
        assert_eq!(outcome.summary_id.as_deref(), Some("audit-3"));

        let bytes = sink.into_inner().unwrap();
        let lines: Vec<serde_json::Value> = String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        let tables: Vec<&str> = lines.iter().map(|l| l["table"].as_str().unwrap()).collect();
        assert_eq!(tables, vec!["audit_issues", "audit_issues", "audits", "agent_runs"]);
        assert_eq!(lines[0]["row"]["client_id"], "example.com");
        assert_eq!(lines[0]["row"]["is_fixed"], false);
        assert_eq!(lines[2]["row"]["results"]["issueCount"], 2);
        assert!(lines[3].get("id").is_none());
    }

    #[tokio::test]
    async fn test_json_lines_sink_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.jsonl");
        let sink = JsonLinesSink::create(&path).unwrap();

        let result = result_with(vec![]);
        persist_scan(&sink, "example.com", "example.com", &result, Duration::ZERO).await;
        drop(sink);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
