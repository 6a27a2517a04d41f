use url::Url;

/// Turn user input into a fetchable URL.
///
/// Keeps an explicit `http://`/`https://` scheme, otherwise assumes HTTPS.
/// Trailing slashes are removed.
pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/');
    if has_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Reduce user input to a bare domain for display and storage.
///
/// Strips the scheme, a leading `www.` and trailing slashes.
pub fn normalize_domain(input: &str) -> String {
    let trimmed = input.trim();
    let without_scheme = match trimmed.find("://") {
        Some(pos) => &trimmed[pos + 3..],
        None => trimmed,
    };
    let without_www = strip_www(without_scheme);
    without_www.trim_end_matches('/').to_ascii_lowercase()
}

/// Normalize a URL to its origin (scheme + host + optional port).
///
/// Falls back to trimming trailing slashes if the input cannot be parsed.
pub fn normalize_origin(input: &str) -> String {
    match Url::parse(input) {
        Ok(parsed) => parsed
            .origin()
            .ascii_serialization()
            .trim_end_matches('/')
            .to_string(),
        Err(_) => input.trim_end_matches('/').to_string(),
    }
}

/// Origin of `input` served over `scheme` instead.
///
/// Used to derive the HTTPS and plain-HTTP probes from one target. Unparseable
/// input is returned with its scheme prefix replaced textually.
pub fn with_scheme(input: &str, scheme: &str) -> String {
    let origin = normalize_origin(input);
    match Url::parse(&origin) {
        Ok(mut parsed) => {
            if parsed.set_scheme(scheme).is_err() {
                return origin;
            }
            // Default ports of the old scheme must not leak into the new one.
            if parsed.port().is_some() && parsed.port() == default_port(scheme) {
                let _ = parsed.set_port(None);
            }
            parsed.as_str().trim_end_matches('/').to_string()
        }
        Err(_) => {
            let rest = match origin.find("://") {
                Some(pos) => &origin[pos + 3..],
                None => origin.as_str(),
            };
            format!("{scheme}://{rest}")
        }
    }
}

/// The same URL over plain HTTP, path kept, when `url` is an HTTPS URL.
///
/// The scheme is matched without regard to case.
pub fn http_fallback(url: &str) -> Option<String> {
    let scheme = url.get(..8)?;
    if !scheme.eq_ignore_ascii_case("https://") {
        return None;
    }
    Some(format!("http://{}", &url[8..]))
}

/// Host of a URL, if it has one.
pub fn host_of(input: &str) -> Option<String> {
    Url::parse(input)
        .ok()
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
}

/// Hostname equality ignoring case and a leading `www.` on either side.
pub fn same_site(host: &str, site_host: &str) -> bool {
    strip_www(&host.to_ascii_lowercase()) == strip_www(&site_host.to_ascii_lowercase())
}

fn strip_www(host: &str) -> &str {
    match host.get(4..) {
        Some(rest) if !rest.is_empty() && host[..4].eq_ignore_ascii_case("www.") => rest,
        _ => host,
    }
}

fn has_scheme(input: &str) -> bool {
    let lower = input.get(..8).unwrap_or(input).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_standard_url() {
        let url = "https://example.com/path/page?query=true";
        assert_eq!(normalize_origin(url), "https://example.com");
    }

    #[test]
    fn keeps_port_information() {
        let url = "https://example.com:8443/path";
        assert_eq!(normalize_origin(url), "https://example.com:8443");
    }

    #[test]
    fn trims_trailing_slash_when_parse_fails() {
        let url = "example.com/";
        assert_eq!(normalize_origin(url), "example.com");
    }

    #[test]
    fn normalize_url_adds_https() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("example.com///"), "https://example.com");
        assert_eq!(normalize_url("  example.com/ "), "https://example.com");
    }

    #[test]
    fn normalize_url_keeps_existing_scheme() {
        assert_eq!(normalize_url("http://example.com/"), "http://example.com");
        assert_eq!(normalize_url("https://example.com/blog/"), "https://example.com/blog");
        assert_eq!(normalize_url("HTTPS://Example.com"), "HTTPS://Example.com");
    }

    #[test]
    fn normalize_domain_strips_scheme_www_and_slashes() {
        assert_eq!(normalize_domain("https://www.example.com/"), "example.com");
        assert_eq!(normalize_domain("http://Example.com//"), "example.com");
        assert_eq!(normalize_domain("www.example.com"), "example.com");
        assert_eq!(normalize_domain("example.com"), "example.com");
        assert_eq!(normalize_domain("https://shop.example.com"), "shop.example.com");
    }

    #[test]
    fn normalize_domain_handles_non_ascii_hosts() {
        assert_eq!(normalize_domain("café.fr"), "café.fr");
        assert_eq!(normalize_domain("https://www.café.fr/"), "café.fr");
        assert_eq!(normalize_domain("wwé.fr"), "wwé.fr");
        assert_eq!(normalize_domain("ééé"), "ééé");
        assert!(same_site("www.café.fr", "café.fr"));
    }

    #[test]
    fn http_fallback_ignores_scheme_case() {
        assert_eq!(
            http_fallback("https://example.com").as_deref(),
            Some("http://example.com")
        );
        assert_eq!(
            http_fallback("HTTPS://Example.com/blog").as_deref(),
            Some("http://Example.com/blog")
        );
        assert_eq!(http_fallback("http://example.com"), None);
        assert_eq!(http_fallback("é"), None);
    }

    #[test]
    fn with_scheme_swaps_protocol_on_origin() {
        assert_eq!(with_scheme("https://example.com/blog", "http"), "http://example.com");
        assert_eq!(with_scheme("http://example.com", "https"), "https://example.com");
        assert_eq!(
            with_scheme("http://127.0.0.1:8080/", "https"),
            "https://127.0.0.1:8080"
        );
    }

    #[test]
    fn same_site_ignores_www_in_both_directions() {
        assert!(same_site("www.example.com", "example.com"));
        assert!(same_site("example.com", "www.example.com"));
        assert!(same_site("EXAMPLE.com", "example.com"));
        assert!(!same_site("blog.example.com", "example.com"));
        assert!(!same_site("example.org", "example.com"));
    }

    #[test]
    fn host_of_lowercases() {
        assert_eq!(host_of("https://WWW.Example.com/x").as_deref(), Some("www.example.com"));
        assert_eq!(host_of("not a url"), None);
    }
}
