//! Scan orchestration and result assembly

use chrono::Utc;
use serde_json::json;
use std::time::Instant;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::checks::discovery::run_discovery_checks;
use crate::checks::network::{
    check_http_status, check_https_redirect, check_response_time, check_ssl,
};
use crate::checks::on_page::run_on_page_checks;
use crate::checks::{SiteTarget, TOTAL_CHECKS, issue_channel};
use crate::config::ScannerConfig;
use crate::error::ScanError;
use crate::fetch::{Fetch, FetchOptions, FetchResponse, HttpFetcher};
use crate::scoring::score_issues;
use crate::types::{AuditIssue, Category, ScanMeta, ScanResult, Severity};
use crate::url_utils::{http_fallback, normalize_domain, normalize_url};

/// Runs the check battery against one site at a time.
///
/// Holds no state between scans; the same scanner can be reused for a whole
/// batch.
#[derive(Debug, Clone)]
pub struct Scanner<F = HttpFetcher> {
    fetcher: F,
    config: ScannerConfig,
}

impl Scanner {
    /// Scanner backed by a real HTTP client.
    pub fn new(config: ScannerConfig) -> Result<Self, ScanError> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self { fetcher, config })
    }
}

impl<F: Fetch> Scanner<F> {
    pub fn with_fetcher(fetcher: F, config: ScannerConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Audit the site behind `input`, a bare domain or a URL.
    ///
    /// Only blank input is an error. Network failures end up as issues, and a
    /// homepage that can't be reached at all yields the unreachable result.
    pub async fn scan_domain(&self, input: &str) -> Result<ScanResult, ScanError> {
        if input.trim().is_empty() {
            return Err(ScanError::InvalidDomain(input.to_string()));
        }

        let domain = normalize_domain(input);
        let url = normalize_url(input);
        let span = info_span!("scan", %domain);

        Ok(self.run_scan(domain, url).instrument(span).await)
    }

    async fn run_scan(&self, domain: String, url: String) -> ScanResult {
        let started = Instant::now();

        let Some((page_url, homepage)) = self.fetch_homepage(&url).await else {
            warn!(%url, "site unreachable, skipping check battery");
            return unreachable_result(domain, &url);
        };

        let target = SiteTarget::new(&page_url);
        let (issues, accumulator) = issue_channel();

        let (ssl, redirects, ()) = tokio::join!(
            check_ssl(&self.fetcher, &target, &issues),
            check_https_redirect(&self.fetcher, &target, &issues),
            run_discovery_checks(&self.fetcher, &target, &issues)
        );

        let response_time_ms = homepage.elapsed_ms();
        issues.extend(check_response_time(response_time_ms, &page_url));
        issues.extend(check_http_status(homepage.status, &page_url));
        issues.extend(run_on_page_checks(&homepage.body, &target));
        drop(issues);

        let issues = accumulator.drain();
        let card = score_issues(&issues, TOTAL_CHECKS);

        info!(
            score = card.score,
            issues = issues.len(),
            passed = card.stats.passed_checks,
            duration_ms = started.elapsed().as_millis() as u64,
            "scan complete"
        );

        ScanResult {
            domain,
            scanned_at: Utc::now(),
            score: card.score,
            issues,
            stats: card.stats,
            meta: ScanMeta {
                response_time_ms,
                http_status: homepage.status,
                redirects,
                ssl,
            },
        }
    }

    /// GET the homepage, falling back from HTTPS to plain HTTP once.
    ///
    /// Returns the URL that answered together with its response.
    async fn fetch_homepage(&self, url: &str) -> Option<(String, FetchResponse)> {
        match self.fetcher.fetch_with_timeout(url, FetchOptions::default()).await {
            Ok(response) => return Some((url.to_string(), response)),
            Err(err) => debug!(%url, error = %err, "homepage fetch failed"),
        }

        let fallback = http_fallback(url)?;
        match self
            .fetcher
            .fetch_with_timeout(&fallback, FetchOptions::default())
            .await
        {
            Ok(response) => {
                info!(url = %fallback, "homepage only reachable over plain HTTP");
                Some((fallback, response))
            }
            Err(err) => {
                debug!(url = %fallback, error = %err, "homepage fallback failed");
                None
            }
        }
    }
}

/// The short-circuit result for a site whose homepage never answered.
pub fn unreachable_result(domain: String, url: &str) -> ScanResult {
    let issues = vec![
        AuditIssue::new(Severity::Critical, Category::Performance, "Site unreachable", url)
            .description(format!(
                "{url} could not be reached over HTTPS or HTTP, so no other checks were run."
            ))
            .recommendation("Check DNS, hosting and firewall settings so the homepage responds.")
            .evidence(json!({ "url": url })),
    ];
    let card = score_issues(&issues, 1);

    ScanResult {
        domain,
        scanned_at: Utc::now(),
        score: 0,
        issues,
        stats: card.stats,
        meta: ScanMeta::default(),
    }
}
