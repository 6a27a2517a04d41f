//! Discovery-file checks: robots.txt, sitemap.xml, favicon.ico, llms.txt
//!
//! Each probe handles its own failure; an unreachable file is reported as
//! missing and never aborts the other checks.

use serde_json::json;
use tracing::debug;

use super::robots_txt::parse_robots_txt;
use super::sitemap::{SitemapType, parse_sitemap};
use super::{IssueSender, SiteTarget};
use crate::fetch::{Fetch, FetchOptions};
use crate::types::{AuditIssue, Category, Severity};

/// Run the four discovery-file checks concurrently
pub async fn run_discovery_checks<F>(fetcher: &F, target: &SiteTarget, issues: &IssueSender)
where
    F: Fetch + ?Sized,
{
    tokio::join!(
        check_robots_txt(fetcher, target, issues),
        check_sitemap(fetcher, target, issues),
        check_favicon(fetcher, target, issues),
        check_llms_txt(fetcher, target, issues)
    );
}

pub async fn check_robots_txt<F>(fetcher: &F, target: &SiteTarget, issues: &IssueSender)
where
    F: Fetch + ?Sized,
{
    let url = target.resource("robots.txt");
    let response = fetcher.fetch_text(&url).await;

    let content = match response {
        Some(response) if response.is_ok() => response.body,
        other => {
            let status = other.map(|r| r.status);
            debug!(%url, ?status, "robots.txt missing");
            issues.push(
                AuditIssue::new(Severity::Medium, Category::Seo, "Missing robots.txt", url)
                    .description("No robots.txt file was found at the site root.")
                    .recommendation(
                        "Add a robots.txt that allows crawling and points to your sitemap.",
                    )
                    .evidence(json!({ "status": status })),
            );
            return;
        }
    };

    let analysis = parse_robots_txt(&content);

    if analysis.blocks_all_crawlers() {
        issues.push(
            AuditIssue::new(
                Severity::Critical,
                Category::Seo,
                "robots.txt blocks all crawlers",
                url.clone(),
            )
            .description(
                "robots.txt contains a bare \"Disallow: /\" rule for all user agents, which \
                 keeps search engines from crawling the site.",
            )
            .recommendation(
                "Remove the site-wide \"Disallow: /\" rule and only disallow the paths that \
                 must stay private.",
            )
            .evidence(json!({ "rule": "Disallow: /" })),
        );
    }

    let blocked = analysis.blocked_ai_crawlers();
    if !blocked.is_empty() {
        issues.push(
            AuditIssue::new(
                Severity::Info,
                Category::Seo,
                "AI crawlers blocked in robots.txt",
                url.clone(),
            )
            .description(format!(
                "robots.txt explicitly disallows these AI crawlers: {}.",
                blocked.join(", ")
            ))
            .recommendation(
                "Allow AI crawlers if you want the site to appear in AI search and assistant \
                 answers.",
            )
            .evidence(json!({ "blockedCrawlers": blocked })),
        );
    }

    debug!(
        %url,
        blocks_all = analysis.blocks_all_crawlers(),
        blocked_ai = blocked.len(),
        sitemaps = analysis.sitemaps.len(),
        "robots.txt check"
    );
}

pub async fn check_sitemap<F>(fetcher: &F, target: &SiteTarget, issues: &IssueSender)
where
    F: Fetch + ?Sized,
{
    let url = target.resource("sitemap.xml");

    let content = match fetcher.fetch_text(&url).await {
        Some(response) if response.is_ok() => response.body,
        other => {
            let status = other.map(|r| r.status);
            debug!(%url, ?status, "sitemap.xml missing");
            issues.push(
                AuditIssue::new(Severity::High, Category::Seo, "Missing sitemap.xml", url)
                    .description("No XML sitemap was found at /sitemap.xml.")
                    .recommendation(
                        "Generate an XML sitemap listing your indexable pages and reference \
                         it from robots.txt.",
                    )
                    .evidence(json!({ "status": status })),
            );
            return;
        }
    };

    let analysis = parse_sitemap(&content);
    debug!(%url, sitemap_type = ?analysis.sitemap_type, urls = analysis.url_count(), "sitemap check");

    if !analysis.is_valid_format() {
        issues.push(
            AuditIssue::new(
                Severity::Medium,
                Category::Seo,
                "Invalid sitemap.xml format",
                url,
            )
            .description("sitemap.xml has no <urlset> or <sitemapindex> root element.")
            .recommendation("Serve a sitemap that follows the sitemaps.org XML protocol.")
            .evidence(json!({ "bytes": content.len() })),
        );
    } else if analysis.url_count() == 0 {
        let kind = match analysis.sitemap_type {
            SitemapType::Index => "index",
            _ => "urlset",
        };
        issues.push(
            AuditIssue::new(Severity::Medium, Category::Seo, "Empty sitemap.xml", url)
                .description("sitemap.xml is well-formed but lists no <loc> entries.")
                .recommendation("Populate the sitemap with the URLs you want indexed.")
                .evidence(json!({ "urlCount": 0, "type": kind })),
        );
    }
}

pub async fn check_favicon<F>(fetcher: &F, target: &SiteTarget, issues: &IssueSender)
where
    F: Fetch + ?Sized,
{
    let url = target.resource("favicon.ico");
    let status = fetcher
        .fetch_with_timeout(&url, FetchOptions::head())
        .await
        .ok()
        .map(|response| response.status);
    debug!(%url, ?status, "favicon check");

    if status != Some(200) {
        issues.push(
            AuditIssue::new(Severity::Low, Category::Seo, "Missing favicon", url)
                .description("No favicon.ico was found at the site root.")
                .recommendation(
                    "Add a favicon so the site is recognisable in browser tabs and search results.",
                )
                .evidence(json!({ "status": status })),
        );
    }
}

pub async fn check_llms_txt<F>(fetcher: &F, target: &SiteTarget, issues: &IssueSender)
where
    F: Fetch + ?Sized,
{
    let url = target.resource("llms.txt");
    let status = fetcher.fetch_text(&url).await.map(|response| response.status);
    debug!(%url, ?status, "llms.txt check");

    if status != Some(200) {
        issues.push(
            AuditIssue::new(Severity::Info, Category::Seo, "Missing llms.txt", url)
                .description("No llms.txt file was found at the site root.")
                .recommendation(
                    "Consider adding an llms.txt that summarises the site for AI assistants.",
                )
                .evidence(json!({ "status": status })),
        );
    }
}
