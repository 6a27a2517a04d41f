//! # siteaudit-core
//!
//! Core library for technical SEO audits of a website's homepage.
//!
//! This library provides:
//! - Timeout-bounded HTTP fetching behind the [`Fetch`] trait
//! - A fixed battery of network, discovery-file and on-page checks
//! - Severity-weighted health scoring
//! - Persistence records and the sequential batch driver used by callers
//!
//! ## Example
//!
//! ```no_run
//! use siteaudit_core::{Scanner, ScannerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let scanner = Scanner::new(ScannerConfig::default())?;
//! let result = scanner.scan_domain("example.com").await?;
//!
//! println!("{}: {}/100", result.domain, result.score);
//! for issue in result.issues_by_severity() {
//!     println!("[{}] {}", issue.severity, issue.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod checks;
pub mod config;
pub mod error;
pub mod fetch;
pub mod parser;
pub mod persist;
pub mod scanner;
pub mod scoring;
pub mod types;
pub mod url_utils;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use types::{AuditIssue, Category, Evidence, ScanMeta, ScanResult, ScanStats, Severity};

pub use batch::{BatchSummary, ClientStore, ClientTarget, audit_client, run_batch, run_scheduled};
pub use checks::TOTAL_CHECKS;
pub use config::ScannerConfig;
pub use error::{ConfigError, FetchError, ScanError, SinkError, TriggerError};
pub use fetch::{Fetch, FetchOptions, FetchResponse, HttpFetcher};
pub use persist::{AuditSink, MemorySink, PersistOutcome, persist_scan};
pub use scanner::Scanner;
pub use scoring::{ScoreCard, score_issues};
pub use url_utils::{normalize_domain, normalize_url};
