use once_cell::sync::Lazy;
use regex::Regex;

/// Analysis results for XML sitemap
#[derive(Debug, Clone)]
pub struct SitemapAnalysis {
    pub sitemap_type: SitemapType,

    /// Every `<loc>` value, in document order
    pub locations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapType {
    Standard, // Single sitemap with URLs
    Index,    // Sitemap index pointing to other sitemaps
    Unknown,
}

impl SitemapAnalysis {
    pub fn is_valid_format(&self) -> bool {
        self.sitemap_type != SitemapType::Unknown
    }

    pub fn url_count(&self) -> usize {
        self.locations.len()
    }
}

static LOC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<loc>(.*?)</loc>").expect("invalid loc regex"));

/// Parse XML sitemap content
pub fn parse_sitemap(content: &str) -> SitemapAnalysis {
    let sitemap_type = if content.contains("<sitemapindex") {
        SitemapType::Index
    } else if content.contains("<urlset") {
        SitemapType::Standard
    } else {
        SitemapType::Unknown
    };

    let locations = if sitemap_type == SitemapType::Unknown {
        Vec::new()
    } else {
        LOC_PATTERN
            .captures_iter(content)
            .filter_map(|cap| cap.get(1))
            .map(|loc| decode_xml_entities(loc.as_str().trim()))
            .filter(|loc| !loc.is_empty())
            .collect()
    };

    SitemapAnalysis {
        sitemap_type,
        locations,
    }
}

fn decode_xml_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_sitemap() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url>
    <loc>https://example.com/page1</loc>
    <lastmod>2025-10-01</lastmod>
  </url>
  <url>
    <loc>https://example.com/page2</loc>
  </url>
</urlset>"#;

        let result = parse_sitemap(xml);
        assert_eq!(result.sitemap_type, SitemapType::Standard);
        assert!(result.is_valid_format());
        assert_eq!(result.url_count(), 2);
    }

    #[test]
    fn test_parse_sitemap_index() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap>
    <loc>https://example.com/sitemap1.xml</loc>
  </sitemap>
  <sitemap>
    <loc>https://example.com/sitemap2.xml</loc>
  </sitemap>
</sitemapindex>"#;

        let result = parse_sitemap(xml);
        assert_eq!(result.sitemap_type, SitemapType::Index);
        assert_eq!(
            result.locations,
            vec!["https://example.com/sitemap1.xml", "https://example.com/sitemap2.xml"]
        );
    }

    #[test]
    fn test_empty_urlset() {
        let result = parse_sitemap(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"></urlset>"#);
        assert!(result.is_valid_format());
        assert_eq!(result.url_count(), 0);
    }

    #[test]
    fn test_html_is_unknown_format() {
        let result = parse_sitemap("<html><body>Not found</body></html>");
        assert_eq!(result.sitemap_type, SitemapType::Unknown);
        assert!(!result.is_valid_format());
    }

    #[test]
    fn test_xml_entity_decoding() {
        let encoded = "https://example.com/page?param=1&amp;other=2";
        let decoded = decode_xml_entities(encoded);
        assert_eq!(decoded, "https://example.com/page?param=1&other=2");
        assert_eq!(decode_xml_entities("&amp;lt;"), "&lt;");
    }
}
