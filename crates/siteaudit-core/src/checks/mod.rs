//! The check battery
//!
//! Every check inspects one signal and appends zero or more issues. Checks
//! never read each other's findings, so they can run in any order.

pub mod discovery;
pub mod network;
pub mod on_page;
pub mod robots_txt;
pub mod sitemap;

use tokio::sync::mpsc;
use tracing::warn;

use crate::types::AuditIssue;
use crate::url_utils::{host_of, normalize_origin, with_scheme};

/// Number of distinct checks in the battery
pub const TOTAL_CHECKS: usize = 18;

/// Append-only handle concurrent checks report through
#[derive(Debug, Clone)]
pub struct IssueSender {
    tx: mpsc::UnboundedSender<AuditIssue>,
}

impl IssueSender {
    pub fn push(&self, issue: AuditIssue) {
        if let Err(err) = self.tx.send(issue) {
            warn!(title = %err.0.title, "issue dropped, accumulator already closed");
        }
    }

    pub fn extend(&self, issues: impl IntoIterator<Item = AuditIssue>) {
        for issue in issues {
            self.push(issue);
        }
    }
}

/// Single consumer side of the issue channel
#[derive(Debug)]
pub struct IssueAccumulator {
    rx: mpsc::UnboundedReceiver<AuditIssue>,
}

impl IssueAccumulator {
    /// Collect everything sent so far. Call after all writers have joined.
    pub fn drain(mut self) -> Vec<AuditIssue> {
        let mut issues = Vec::new();
        while let Ok(issue) = self.rx.try_recv() {
            issues.push(issue);
        }
        issues
    }
}

pub fn issue_channel() -> (IssueSender, IssueAccumulator) {
    let (tx, rx) = mpsc::unbounded_channel();
    (IssueSender { tx }, IssueAccumulator { rx })
}

/// The site a scan is pointed at, with derived probe URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteTarget {
    /// Homepage URL that was fetched
    pub page_url: String,

    /// Scheme + host + port of the homepage
    pub origin: String,

    /// Lowercased hostname, used for link classification
    pub host: Option<String>,
}

impl SiteTarget {
    pub fn new(page_url: &str) -> Self {
        Self {
            page_url: page_url.to_string(),
            origin: normalize_origin(page_url),
            host: host_of(page_url),
        }
    }

    /// URL of a well-known file at the site root
    pub fn resource(&self, path: &str) -> String {
        format!("{}/{}", self.origin, path.trim_start_matches('/'))
    }

    pub fn https_origin(&self) -> String {
        with_scheme(&self.origin, "https")
    }

    pub fn http_origin(&self) -> String {
        with_scheme(&self.origin, "http")
    }
}
