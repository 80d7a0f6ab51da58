use url::{form_urlencoded, Url};

/// Query parameters dropped during normalization, in addition to any `utm_*`
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "msclkid", "ref", "ref_src", "mc_cid", "mc_eid",
];

/// Normalizes a search result URL into its dedup key
///
/// # Normalization Steps
///
/// 1. Trim and parse the URL
/// 2. Lowercase the scheme and host, drop default ports
/// 3. Remove fragment (everything after #)
/// 4. Remove tracking query parameters, keeping the rest in order
/// 5. Strip a single trailing slash (except for root /)
/// 6. Remove empty query string (trailing ?)
///
/// The function is total: input that does not parse as a hierarchical URL
/// with a host comes back trimmed but otherwise unchanged.
///
/// # Examples
///
/// ```
/// use vin_watch::url::normalize_url;
///
/// let key = normalize_url("https://EXAMPLE.com/listing/?utm_source=x&id=9#photos");
/// assert_eq!(key, "https://example.com/listing?id=9");
/// ```
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();

    let mut url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Keeping unparseable URL as-is ({}): {}", e, trimmed);
            return trimmed.to_string();
        }
    };

    if url.cannot_be_a_base() || url.host_str().is_none() {
        return trimmed.to_string();
    }

    // Scheme and host are already lowercased by the parser for http(s)
    if let Some(host) = url.host_str() {
        let lowered = host.to_lowercase();
        if lowered != host && url.set_host(Some(&lowered)).is_err() {
            return trimmed.to_string();
        }
    }

    url.set_fragment(None);

    let query = url.query().map(filter_query);
    match query {
        Some(q) if !q.is_empty() => url.set_query(Some(&q)),
        _ => url.set_query(None),
    }

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let stripped = path[..path.len() - 1].to_string();
        url.set_path(&stripped);
    }

    url.to_string()
}

/// Drops tracking pairs from a raw query string without re-encoding the rest
fn filter_query(query: &str) -> String {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| !is_tracking_param(&decoded_name(pair)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-decoded name of a raw `name=value` pair
fn decoded_name(pair: &str) -> String {
    form_urlencoded::parse(pair.as_bytes())
        .next()
        .map(|(name, _)| name.into_owned())
        .unwrap_or_default()
}

/// Checks if a query parameter name is a known tracking parameter
pub fn is_tracking_param(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name.starts_with("utm_") || TRACKING_PARAMS.contains(&name.as_str())
}
