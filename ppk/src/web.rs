//! Web fetch for URL placeholders
//!
//! Fetches a page, reports status/content type/body, and converts the body
//! to prompt-friendly text: HTML becomes markdown, JSON is pretty-printed,
//! other text passes through, and non-text content is replaced with an
//! explanatory placeholder.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Response cap; anything larger is rejected rather than pasted into a prompt
const MAX_BODY_BYTES: usize = 1_000_000;

/// Errors from fetching a URL
#[derive(Debug, Error)]
pub enum WebError {
    #[error("failed to fetch {url}: {message}")]
    Request { url: String, message: String },

    #[error("HTTP error {status} for {url}")]
    Status { status: u16, url: String },

    #[error("response too large (> {MAX_BODY_BYTES} bytes) for {url}")]
    TooLarge { url: String },
}

/// A fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

/// HTTP client wrapper with the timeout and user agent baked in
pub struct WebFetcher {
    client: reqwest::Client,
}

impl WebFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("promptpack/0.1 (web placeholder)")
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Fetch a URL. Non-2xx statuses and transport failures are errors.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, WebError> {
        debug!(%url, "WebFetcher::fetch: sending request");
        let response = self.client.get(url).send().await.map_err(|e| WebError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            debug!(%url, status, "WebFetcher::fetch: HTTP error status");
            return Err(WebError::Status {
                status,
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response.text().await.map_err(|e| WebError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if body.len() > MAX_BODY_BYTES {
            return Err(WebError::TooLarge { url: url.to_string() });
        }

        debug!(%url, status, %content_type, body_len = body.len(), "WebFetcher::fetch: done");
        Ok(FetchedPage {
            status,
            content_type,
            body,
        })
    }
}

impl Default for WebFetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a fetched page into text for the assembled prompt.
pub fn page_to_text(page: &FetchedPage, url: &str) -> String {
    let ct = page.content_type.as_str();

    if ct.contains("text/html") || ct.contains("application/xhtml") {
        debug!(%url, "page_to_text: converting HTML to markdown");
        return html2md::rewrite_html(&page.body, false);
    }

    if ct.contains("application/json") {
        return match serde_json::from_str::<serde_json::Value>(&page.body) {
            Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| page.body.clone()),
            Err(_) => page.body.clone(),
        };
    }

    if is_text_like(ct) {
        return page.body.clone();
    }

    debug!(%url, content_type = %ct, "page_to_text: non-text content type");
    format!("[Non-text content at {} ({})]", url, ct)
}

fn is_text_like(content_type: &str) -> bool {
    content_type.is_empty()
        || content_type.starts_with("text/")
        || content_type.contains("json")
        || content_type.contains("xml")
        || content_type.contains("javascript")
        || content_type.contains("yaml")
}
