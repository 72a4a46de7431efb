// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::HttpConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a URL and return the body bytes, failing on non-success status.
pub async fn fetch_bytes(client: &Client, url: &str, bearer: Option<&str>) -> Result<Vec<u8>> {
    let mut request = client.get(url);
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(AppError::api(
            super::url::mask_url(url),
            status.as_u16(),
            first_line(&message),
        ));
    }

    Ok(response.bytes().await?.to_vec())
}

/// Trim an error body down to something fit for a log line.
pub fn first_line(body: &str) -> String {
    body.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no response body")
        .chars()
        .take(200)
        .collect()
}
