//! Shared reqwest plumbing for the two upstream services.

use std::time::Duration;

/// Longest slice of an error body kept in an error message.
const MAX_ERROR_BODY: usize = 300;

/// Build a client with a per-request timeout.
pub(crate) fn client(timeout_secs: u64) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
}

/// Join a base URL and a path without doubling the slash.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Describe a non-2xx response as `HTTP <status>: <body prefix>`.
pub(crate) async fn error_detail(resp: reqwest::Response) -> String {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let body = body.trim();
    if body.is_empty() {
        return format!("HTTP {status}");
    }
    let cut = body
        .char_indices()
        .nth(MAX_ERROR_BODY)
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    let ellipsis = if cut < body.len() { "…" } else { "" };
    format!("HTTP {status}: {}{ellipsis}", &body[..cut])
}
