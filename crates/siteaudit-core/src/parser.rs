//! Text-level HTML helpers shared by the on-page checks

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

static SCRIPT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script").expect("invalid script selector"));

/// Extract non-empty JSON-LD script blocks from a parsed document
pub fn extract_json_ld_blocks(document: &Html) -> Vec<String> {
    document
        .select(&SCRIPT_SELECTOR)
        .filter_map(|element| {
            let script_type = element
                .value()
                .attr("type")
                .map(|t| t.trim().to_ascii_lowercase())
                .unwrap_or_default();

            // Use contains() to catch variations like "application/ld+json; charset=utf-8"
            if script_type.contains("ld+json") {
                let text = element.text().collect::<String>().trim().to_string();
                if text.is_empty() { None } else { Some(text) }
            } else {
                None
            }
        })
        .collect()
}

/// Remove `<script>` and `<style>` blocks including their content
pub fn strip_scripts_and_styles(html: &str) -> String {
    static RE_TAG_BLOCKS: Lazy<Vec<Regex>> = Lazy::new(|| {
        [
            r"(?is)<script[^>]*?>[\s\S]*?</script\s*>",
            r"(?is)<style[^>]*?>[\s\S]*?</style\s*>",
        ]
        .into_iter()
        .map(|pattern| Regex::new(pattern).expect("invalid block regex"))
        .collect()
    });

    let mut clean = html.to_string();
    for re in RE_TAG_BLOCKS.iter() {
        clean = re.replace_all(&clean, " ").into_owned();
    }
    clean
}

/// Text a reader sees: scripts, styles and tags removed, whitespace collapsed
pub fn visible_text(html: &str) -> String {
    static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("invalid tag regex"));

    let without_blocks = strip_scripts_and_styles(html);
    let without_tags = RE_TAG.replace_all(&without_blocks, " ");
    without_tags.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of whitespace-separated words in the visible text
pub fn visible_word_count(html: &str) -> usize {
    visible_text(html).split_whitespace().count()
}
