use crate::error::{LinkbackError, Result};
use crate::result::EndpointResult;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap};
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

/// Response header advertising a pingback endpoint.
pub const PINGBACK_HEADER: &str = "x-pingback";

/// Fetch `target` and look for its pingback endpoint.
///
/// The `X-Pingback` header takes priority; the body is only parsed when the
/// header is absent or empty. Transport and status failures are returned as
/// errors so the caller decides how to report them.
pub async fn fetch_endpoint(client: &Client, target: &str) -> Result<EndpointResult> {
    let url = Url::parse(target)
        .map_err(|e| LinkbackError::InvalidUrl(format!("{}: {}", target, e)))?;

    debug!("Fetching {} for pingback discovery", url);
    let response = client
        .get(url)
        .header(ACCEPT, "text/plain")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(LinkbackError::from_status(status));
    }

    if let Some(endpoint) = endpoint_from_headers(response.headers()) {
        debug!("Endpoint advertised via X-Pingback header: {}", endpoint);
        return Ok(EndpointResult::Found(endpoint));
    }

    // Relative hrefs resolve against where we actually ended up
    let document_url = response.url().clone();
    let body = response.text().await?;

    Ok(match endpoint_from_html(&body, &document_url) {
        Some(endpoint) => {
            debug!("Endpoint advertised via <link rel=\"pingback\">: {}", endpoint);
            EndpointResult::Found(endpoint)
        }
        None => EndpointResult::NotFound,
    })
}

pub fn endpoint_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(PINGBACK_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Find the first `<link rel="pingback" href="...">` in an HTML document.
pub fn endpoint_from_html(html: &str, document_url: &Url) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"link[rel="pingback"]"#).expect("static selector is valid");

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())
        .map(|href| resolve_href(href, document_url))
}

/// Absolute hrefs are returned verbatim; only relative ones are joined.
fn resolve_href(href: &str, document_url: &Url) -> String {
    match Url::parse(href) {
        Err(url::ParseError::RelativeUrlWithoutBase) => document_url
            .join(href)
            .map(|resolved| resolved.to_string())
            .unwrap_or_else(|_| href.to_string()),
        _ => href.to_string(),
    }
}
