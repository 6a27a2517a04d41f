//! Network and security checks: SSL, HTTP to HTTPS redirect, latency, status

use serde_json::json;
use tracing::debug;

use super::{IssueSender, SiteTarget};
use crate::fetch::{Fetch, FetchOptions};
use crate::types::{AuditIssue, Category, Severity};

/// Response time at or below this passes
pub const RESPONSE_TIME_OK_MS: u64 = 1500;
/// Above this a slow response is high severity
pub const RESPONSE_TIME_SLOW_MS: u64 = 3000;
/// At or above this a slow response is critical
pub const RESPONSE_TIME_CRITICAL_MS: u64 = 5000;

/// HEAD the HTTPS origin. Returns whether it answered with 2xx/3xx.
pub async fn check_ssl<F>(fetcher: &F, target: &SiteTarget, issues: &IssueSender) -> bool
where
    F: Fetch + ?Sized,
{
    let url = target.https_origin();
    let outcome = fetcher.fetch_with_timeout(&url, FetchOptions::head()).await;

    let (valid, detail) = match &outcome {
        Ok(response) if (200..400).contains(&response.status) => (true, None),
        Ok(response) => (false, Some(format!("HTTPS returned status {}", response.status))),
        Err(err) => (false, Some(err.to_string())),
    };
    debug!(%url, valid, "ssl check");

    if let Some(detail) = detail {
        issues.push(
            AuditIssue::new(
                Severity::Critical,
                Category::Security,
                "SSL certificate invalid",
                url.clone(),
            )
            .description(format!(
                "The site could not be loaded securely over HTTPS ({detail})."
            ))
            .recommendation(
                "Install a valid TLS certificate (e.g. via Let's Encrypt) and make sure the \
                 HTTPS endpoint responds successfully.",
            )
            .evidence(json!({ "url": url, "error": detail })),
        );
    }

    valid
}

/// GET the plain-HTTP origin without following redirects.
///
/// Returns whether an HTTPS redirect was observed. A failed request passes
/// the check, since port 80 may simply be closed.
pub async fn check_https_redirect<F>(fetcher: &F, target: &SiteTarget, issues: &IssueSender) -> bool
where
    F: Fetch + ?Sized,
{
    let url = target.http_origin();
    let response = match fetcher
        .fetch_with_timeout(&url, FetchOptions::manual_redirect())
        .await
    {
        Ok(response) => response,
        Err(err) => {
            debug!(%url, error = %err, "http probe failed, assuming no plain-HTTP listener");
            return false;
        }
    };

    let redirect_status = matches!(response.status, 301 | 302 | 308);
    let to_https = response
        .location
        .as_deref()
        .is_some_and(|location| location.to_ascii_lowercase().starts_with("https"));
    debug!(%url, status = response.status, to_https, "https redirect check");

    if redirect_status && to_https {
        return true;
    }

    issues.push(
        AuditIssue::new(
            Severity::High,
            Category::Security,
            "No HTTP to HTTPS redirect",
            url.clone(),
        )
        .description(format!(
            "Requests to {url} are not redirected to HTTPS (status {}).",
            response.status
        ))
        .recommendation(
            "Redirect all HTTP traffic to HTTPS with a permanent (301 or 308) redirect.",
        )
        .evidence(json!({
            "status": response.status,
            "location": response.location,
        })),
    );
    false
}

/// Grade the homepage response time
pub fn check_response_time(elapsed_ms: u64, url: &str) -> Option<AuditIssue> {
    let severity = match elapsed_ms {
        ms if ms <= RESPONSE_TIME_OK_MS => return None,
        ms if ms <= RESPONSE_TIME_SLOW_MS => Severity::Medium,
        ms if ms < RESPONSE_TIME_CRITICAL_MS => Severity::High,
        _ => Severity::Critical,
    };

    Some(
        AuditIssue::new(severity, Category::Performance, "Slow server response", url)
            .description(format!(
                "The homepage took {elapsed_ms}ms to respond; aim for under {RESPONSE_TIME_OK_MS}ms."
            ))
            .recommendation(
                "Enable caching, use a CDN, and reduce server-side work on the homepage.",
            )
            .evidence(json!({ "responseTimeMs": elapsed_ms })),
    )
}

/// Flag error and redirect statuses on the homepage
pub fn check_http_status(status: u16, url: &str) -> Option<AuditIssue> {
    if status >= 400 {
        Some(
            AuditIssue::new(Severity::Critical, Category::Seo, "HTTP error status", url)
                .description(format!("The homepage returned HTTP {status}."))
                .recommendation("Make sure the homepage returns 200 OK to visitors and crawlers.")
                .evidence(json!({ "httpStatus": status })),
        )
    } else if status >= 300 {
        Some(
            AuditIssue::new(Severity::Low, Category::Seo, "Homepage redirects", url)
                .description(format!(
                    "The homepage answered with redirect status {status} instead of 200."
                ))
                .recommendation("Link to the final homepage URL so it is served directly.")
                .evidence(json!({ "httpStatus": status })),
        )
    } else {
        None
    }
}
