mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Result, bail};

/// Fetches `url` with a GET request and returns the body.
///
/// # Errors
///
/// Returns an error if the URL is invalid, the request fails, or the server
/// answers with a non-success status.
pub fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::blocking::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req)?;
    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        bail!("GET returned status {}: {}", status, body);
    }

    Ok(resp.bytes()?.to_vec())
}
