//! Common types used across siteaudit

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// Measured values backing a finding, keyed by camelCase names.
pub type Evidence = Map<String, JsonValue>;

/// Severity of an audit issue, ordered by decreasing impact
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks indexing or makes the site unusable
    Critical,

    /// Strongly hurts rankings
    High,

    /// Recommended fix
    Medium,

    /// Nice to have
    Low,

    /// Informational, never counted as a failed check
    Info,
}

impl Severity {
    /// All severities, most severe first.
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    /// Points deducted from the health score per issue of this severity.
    pub fn weight(self) -> u32 {
        match self {
            Severity::Critical => 15,
            Severity::High => 10,
            Severity::Medium => 5,
            Severity::Low => 2,
            Severity::Info => 0,
        }
    }

    /// Whether an issue of this severity marks its check as failed.
    pub fn counts_as_failure(self) -> bool {
        self != Severity::Info
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Area of the site an issue belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Performance,
    Seo,
    Mobile,
    Schema,
    Links,
    Accessibility,
    Security,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Performance => "performance",
            Category::Seo => "seo",
            Category::Mobile => "mobile",
            Category::Schema => "schema",
            Category::Links => "links",
            Category::Accessibility => "accessibility",
            Category::Security => "security",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding produced by one check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditIssue {
    pub severity: Severity,
    pub category: Category,

    /// Short summary, stable per check type
    pub title: String,

    /// Detail text, may embed measured values
    pub description: String,

    /// Remediation advice
    pub recommendation: String,

    /// URL the issue pertains to
    pub url: String,

    #[serde(default)]
    pub evidence: Evidence,
}

impl AuditIssue {
    /// Create an issue with empty description, recommendation and evidence.
    pub fn new(
        severity: Severity,
        category: Category,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            title: title.into(),
            description: String::new(),
            recommendation: String::new(),
            url: url.into(),
            evidence: Evidence::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = recommendation.into();
        self
    }

    /// Attach evidence. Non-object values are stored under a `value` key.
    pub fn evidence(mut self, evidence: JsonValue) -> Self {
        self.evidence = match evidence {
            JsonValue::Object(map) => map,
            JsonValue::Null => Evidence::new(),
            other => {
                let mut map = Evidence::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        self
    }
}

/// Per-severity counts plus the pass/fail tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStats {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
    pub total_checks: usize,
    pub passed_checks: usize,
}

impl ScanStats {
    /// Number of issues that count as failed checks.
    pub fn failures(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }

    /// Total number of issues across all severities.
    pub fn issue_count(&self) -> usize {
        self.failures() + self.info
    }

    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
            Severity::Info => self.info,
        }
    }
}

/// Response metadata captured for the homepage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanMeta {
    pub response_time_ms: u64,
    pub http_status: u16,

    /// HTTP requests are redirected to HTTPS
    pub redirects: bool,

    /// HTTPS endpoint answered with a valid certificate
    pub ssl: bool,
}

/// Outcome of one scan. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    /// Hostname without scheme, `www.` prefix or trailing slash
    pub domain: String,
    pub scanned_at: DateTime<Utc>,
    pub score: u8,
    pub issues: Vec<AuditIssue>,
    pub stats: ScanStats,
    pub meta: ScanMeta,
}

impl ScanResult {
    /// Issues sorted most severe first, keeping check order within a severity.
    pub fn issues_by_severity(&self) -> Vec<&AuditIssue> {
        let mut issues: Vec<&AuditIssue> = self.issues.iter().collect();
        issues.sort_by_key(|issue| issue.severity);
        issues
    }

    /// Whether the scan short-circuited because the homepage never answered.
    pub fn is_unreachable(&self) -> bool {
        self.stats.total_checks == 1 && self.meta.http_status == 0
    }
}
