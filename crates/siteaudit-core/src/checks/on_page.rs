//! On-page HTML checks
//!
//! Pure functions over the homepage body. No I/O, so they run after the
//! body is in hand, one after another.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::json;
use url::Url;

use super::SiteTarget;
use crate::parser::{extract_json_ld_blocks, visible_word_count};
use crate::types::{AuditIssue, Category, Severity};
use crate::url_utils::same_site;

pub const TITLE_MIN_CHARS: usize = 30;
pub const TITLE_MAX_CHARS: usize = 70;
pub const DESCRIPTION_MIN_CHARS: usize = 70;
pub const DESCRIPTION_MAX_CHARS: usize = 170;
pub const THIN_CONTENT_WORDS: usize = 100;
pub const LOW_CONTENT_WORDS: usize = 300;
/// More images than this without alt text is high severity
pub const MISSING_ALT_HIGH: usize = 5;

const OPEN_GRAPH_TAGS: [&str; 3] = ["og:title", "og:description", "og:image"];

static TITLE: Lazy<Selector> = Lazy::new(|| selector("head > title"));
static META: Lazy<Selector> = Lazy::new(|| selector("meta"));
static LINK_REL: Lazy<Selector> = Lazy::new(|| selector("link[rel]"));
static H1: Lazy<Selector> = Lazy::new(|| selector("h1"));
static ITEMSCOPE: Lazy<Selector> = Lazy::new(|| selector("[itemscope]"));
static IMG: Lazy<Selector> = Lazy::new(|| selector("img"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a[href]"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("invalid static selector")
}

/// Run every on-page check against `html`, in a fixed order.
pub fn run_on_page_checks(html: &str, target: &SiteTarget) -> Vec<AuditIssue> {
    let document = Html::parse_document(html);
    let url = target.page_url.as_str();

    [
        check_title(&document, url),
        check_meta_description(&document, url),
        check_viewport(&document, url),
        check_open_graph(&document, url),
        check_canonical(&document, url),
        check_h1(&document, url),
        check_structured_data(&document, url),
        check_content_length(html, url),
        check_image_alt(&document, url),
        check_links(&document, target),
    ]
    .into_iter()
    .flatten()
    .collect()
}

pub fn check_title(document: &Html, url: &str) -> Option<AuditIssue> {
    let title = document
        .select(&TITLE)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty());

    let Some(title) = title else {
        return Some(
            AuditIssue::new(Severity::Critical, Category::Seo, "Missing page title", url)
                .description("The homepage has no <title> tag.")
                .recommendation(format!(
                    "Add a descriptive, keyword-focused title of {TITLE_MIN_CHARS}-{TITLE_MAX_CHARS} characters."
                )),
        );
    };

    let length = title.chars().count();
    let (severity, heading, advice) = if length < TITLE_MIN_CHARS {
        (
            Severity::Medium,
            "Page title too short",
            "Expand the title with your main keyword and brand name.",
        )
    } else if length > TITLE_MAX_CHARS {
        (
            Severity::Low,
            "Page title too long",
            "Shorten the title so search engines don't truncate it.",
        )
    } else {
        return None;
    };

    Some(
        AuditIssue::new(severity, Category::Seo, heading, url)
            .description(format!(
                "The page title is {length} characters long; aim for {TITLE_MIN_CHARS}-{TITLE_MAX_CHARS}."
            ))
            .recommendation(advice)
            .evidence(json!({ "title": title, "length": length })),
    )
}

pub fn check_meta_description(document: &Html, url: &str) -> Option<AuditIssue> {
    let description = meta_content(document, "name", "description").filter(|d| !d.is_empty());

    let Some(description) = description else {
        return Some(
            AuditIssue::new(Severity::High, Category::Seo, "Missing meta description", url)
                .description("The homepage has no meta description.")
                .recommendation(format!(
                    "Write a compelling meta description of {DESCRIPTION_MIN_CHARS}-{DESCRIPTION_MAX_CHARS} characters."
                )),
        );
    };

    let length = description.chars().count();
    let (severity, heading) = if length < DESCRIPTION_MIN_CHARS {
        (Severity::Medium, "Meta description too short")
    } else if length > DESCRIPTION_MAX_CHARS {
        (Severity::Low, "Meta description too long")
    } else {
        return None;
    };

    Some(
        AuditIssue::new(severity, Category::Seo, heading, url)
            .description(format!(
                "The meta description is {length} characters long; aim for {DESCRIPTION_MIN_CHARS}-{DESCRIPTION_MAX_CHARS}."
            ))
            .recommendation("Summarise the page's value in a single sentence or two.")
            .evidence(json!({ "description": description, "length": length })),
    )
}

pub fn check_viewport(document: &Html, url: &str) -> Option<AuditIssue> {
    if meta_content(document, "name", "viewport").is_some() {
        return None;
    }

    Some(
        AuditIssue::new(Severity::High, Category::Mobile, "Missing viewport meta tag", url)
            .description("Without a viewport tag the page will not scale on mobile devices.")
            .recommendation(
                "Add <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">.",
            ),
    )
}

pub fn check_open_graph(document: &Html, url: &str) -> Option<AuditIssue> {
    let missing: Vec<&str> = OPEN_GRAPH_TAGS
        .into_iter()
        .filter(|tag| {
            meta_content(document, "property", tag).is_none()
                && meta_content(document, "name", tag).is_none()
        })
        .collect();

    if missing.is_empty() {
        return None;
    }

    let severity = if missing.contains(&"og:title") {
        Severity::Medium
    } else {
        Severity::Low
    };

    Some(
        AuditIssue::new(severity, Category::Seo, "Missing Open Graph tags", url)
            .description(format!(
                "Social previews will be incomplete; missing: {}.",
                missing.join(", ")
            ))
            .recommendation("Add og:title, og:description and og:image meta tags.")
            .evidence(json!({ "missing": missing })),
    )
}

pub fn check_canonical(document: &Html, url: &str) -> Option<AuditIssue> {
    let has_canonical = document.select(&LINK_REL).any(|el| {
        let rel = el.value().attr("rel").unwrap_or_default();
        let href = el.value().attr("href").unwrap_or_default();
        rel.split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case("canonical"))
            && !href.trim().is_empty()
    });

    if has_canonical {
        return None;
    }

    Some(
        AuditIssue::new(Severity::Medium, Category::Seo, "Missing canonical tag", url)
            .description("The homepage does not declare a canonical URL.")
            .recommendation(
                "Add <link rel=\"canonical\" href=\"...\"> pointing to the preferred homepage URL.",
            ),
    )
}

pub fn check_h1(document: &Html, url: &str) -> Option<AuditIssue> {
    let count = document.select(&H1).count();

    match count {
        1 => None,
        0 => Some(
            AuditIssue::new(Severity::High, Category::Seo, "Missing H1 heading", url)
                .description("The homepage has no <h1> heading.")
                .recommendation("Add one H1 that states what the page is about.")
                .evidence(json!({ "h1Count": 0 })),
        ),
        _ => Some(
            AuditIssue::new(Severity::Medium, Category::Seo, "Multiple H1 headings found", url)
                .description(format!("The homepage has {count} <h1> headings."))
                .recommendation("Keep a single H1 and demote the others to H2.")
                .evidence(json!({ "h1Count": count })),
        ),
    }
}

pub fn check_structured_data(document: &Html, url: &str) -> Option<AuditIssue> {
    let json_ld = extract_json_ld_blocks(document).len();
    let microdata = document.select(&ITEMSCOPE).next().is_some();

    if json_ld > 0 || microdata {
        return None;
    }

    Some(
        AuditIssue::new(Severity::Medium, Category::Schema, "No structured data found", url)
            .description("No JSON-LD block or microdata (itemscope) was found.")
            .recommendation(
                "Add schema.org JSON-LD (e.g. Organization, LocalBusiness or WebSite).",
            ),
    )
}

pub fn check_content_length(html: &str, url: &str) -> Option<AuditIssue> {
    let words = visible_word_count(html);

    let (severity, heading) = if words < THIN_CONTENT_WORDS {
        (Severity::High, "Very thin content")
    } else if words < LOW_CONTENT_WORDS {
        (Severity::Medium, "Low word count")
    } else {
        return None;
    };

    Some(
        AuditIssue::new(severity, Category::Seo, heading, url)
            .description(format!(
                "The homepage has {words} words of visible text; aim for at least {LOW_CONTENT_WORDS}."
            ))
            .recommendation("Add useful copy describing your services, audience and location.")
            .evidence(json!({ "wordCount": words })),
    )
}

pub fn check_image_alt(document: &Html, url: &str) -> Option<AuditIssue> {
    let mut total = 0usize;
    let mut missing = 0usize;
    for img in document.select(&IMG) {
        total += 1;
        if img.value().attr("alt").is_none() {
            missing += 1;
        }
    }

    if missing == 0 {
        return None;
    }

    let severity = if missing > MISSING_ALT_HIGH {
        Severity::High
    } else {
        Severity::Medium
    };

    Some(
        AuditIssue::new(severity, Category::Accessibility, "Images missing alt text", url)
            .description(format!("{missing} of {total} images have no alt attribute."))
            .recommendation("Describe every meaningful image with alt text; use alt=\"\" for decorative ones.")
            .evidence(json!({ "missingAlt": missing, "totalImages": total })),
    )
}

/// Where a link points relative to the scanned site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Internal,
    External,
}

/// Classify an `href` found on `base`.
///
/// Relative paths, fragments, `mailto:` and `tel:` links are internal, as is
/// anything that fails to resolve. Absolute links are internal when their
/// host matches `site_host` modulo `www.`.
pub fn classify_link(href: &str, base: Option<&Url>, site_host: Option<&str>) -> LinkKind {
    let href = href.trim();
    let lower = href.to_ascii_lowercase();
    if href.is_empty()
        || href.starts_with('#')
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
    {
        return LinkKind::Internal;
    }

    let resolved = match base {
        Some(base) => base.join(href),
        None => Url::parse(href),
    };

    match resolved {
        Ok(resolved) => match (resolved.host_str(), site_host) {
            (Some(host), Some(site)) if same_site(host, site) => LinkKind::Internal,
            _ => LinkKind::External,
        },
        Err(_) => LinkKind::Internal,
    }
}

pub fn check_links(document: &Html, target: &SiteTarget) -> Option<AuditIssue> {
    let base = Url::parse(&target.page_url).ok();
    let site_host = target.host.as_deref();

    let (mut internal, mut external) = (0usize, 0usize);
    for anchor in document.select(&ANCHOR) {
        let href = anchor.value().attr("href").unwrap_or_default();
        match classify_link(href, base.as_ref(), site_host) {
            LinkKind::Internal => internal += 1,
            LinkKind::External => external += 1,
        }
    }

    let url = target.page_url.as_str();
    let evidence = json!({ "internalLinks": internal, "externalLinks": external });

    if internal == 0 && external > 0 {
        Some(
            AuditIssue::new(Severity::Medium, Category::Links, "No internal links found", url)
                .description("The homepage links only to other sites.")
                .recommendation("Link to your key pages so visitors and crawlers can reach them.")
                .evidence(evidence),
        )
    } else if external == 0 && internal > 0 {
        Some(
            AuditIssue::new(Severity::Info, Category::Links, "No external links found", url)
                .description("The homepage does not link to any other site.")
                .recommendation("Consider linking to relevant authoritative sources or profiles.")
                .evidence(evidence),
        )
    } else {
        None
    }
}

/// Content of the first `<meta {attr}="{value}">` tag, trimmed.
fn meta_content(document: &Html, attr: &str, value: &str) -> Option<String> {
    document
        .select(&META)
        .find(|el| attr_matches(el, attr, value))
        .map(|el| el.value().attr("content").unwrap_or_default().trim().to_string())
}

fn attr_matches(element: &ElementRef<'_>, attr: &str, value: &str) -> bool {
    element
        .value()
        .attr(attr)
        .is_some_and(|actual| actual.trim().eq_ignore_ascii_case(value))
}
