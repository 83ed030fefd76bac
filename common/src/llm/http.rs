use crate::error::{ErmError, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;

const ERROR_BODY_LIMIT: usize = 300;

pub(crate) fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ErmError::Config(format!("failed to build http client: {}", e)))
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// send a request and decode a json body; every failure is a generation error
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    backend: &str,
) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| ErmError::Generation(format!("{} request failed: {}", backend, e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let body: String = body.chars().take(ERROR_BODY_LIMIT).collect();
        return Err(ErmError::Generation(format!(
            "{} returned {}: {}",
            backend, status, body
        )));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ErmError::Generation(format!("{} sent an unreadable body: {}", backend, e)))
}
