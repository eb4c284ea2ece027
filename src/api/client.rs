use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::blockchain::ChainSnapshot;

/// Per-peer budget for a chain fetch; expiry counts as a fetch error and the
/// peer is skipped.
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("peer answered with status {0}")]
    Status(StatusCode),
}

/// Fetch a peer's full chain over HTTP. This is the fetch capability the
/// server injects into `consensus::resolve`.
pub async fn fetch_chain(client: &Client, peer: &str) -> Result<ChainSnapshot, FetchError> {
    let response = client
        .get(format!("http://{peer}/chain"))
        .timeout(FETCH_TIMEOUT)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(FetchError::Status(response.status()));
    }

    Ok(response.json::<ChainSnapshot>().await?)
}
