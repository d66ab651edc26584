use crate::error::{LinkbackError, Result};
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Collect the absolute `a[href]` targets of a source document.
///
/// Links back to the source's own domain are dropped unless
/// `include_internal` is set. Duplicates are removed, first occurrence wins.
pub fn extract_outbound_links(html: &str, source: &Url, include_internal: bool) -> Vec<Url> {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse("a[href]").expect("static selector is valid");
    let base_domain = source.host_str().unwrap_or_default();

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&link_selector) {
        if let Some(href) = element.value().attr("href")
            && let Some(absolute_url) = resolve_url(source, href)
        {
            if !include_internal && is_same_domain(&absolute_url, base_domain) {
                debug!("  -> {} is internal, skipping", absolute_url);
                continue;
            }
            if seen.insert(absolute_url.to_string()) {
                links.push(absolute_url);
            }
        }
    }

    links
}

/// Fetch `source` and return its outbound links.
pub async fn fetch_outbound_links(
    client: &Client,
    source: &Url,
    include_internal: bool,
) -> Result<Vec<Url>> {
    debug!("Fetching {} to collect outbound links", source);
    let response = client.get(source.clone()).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(LinkbackError::from_status(status));
    }

    let body = response.text().await?;
    Ok(extract_outbound_links(&body, source, include_internal))
}

fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    // Skip empty, javascript:, mailto:, tel: and in-page anchors
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

fn is_same_domain(url: &Url, base_domain: &str) -> bool {
    match url.host_str() {
        Some(host) => host == base_domain || host.ends_with(&format!(".{}", base_domain)),
        None => false,
    }
}
