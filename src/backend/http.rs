//! reqwest-based backend client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::{ApiEnvelope, Backend};
use crate::error::FetchError;

/// Talks to the portal API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a client for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| FetchError::Permanent(format!("cannot build HTTP client: {err}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn unwrap_response(response: Response) -> Result<Value, FetchError> {
        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::Transient(format!("backend answered {status}")));
        }
        if !status.is_success() {
            return Err(FetchError::Permanent(format!("backend answered {status}")));
        }

        let envelope: ApiEnvelope = response
            .json()
            .await
            .map_err(|err| FetchError::Permanent(format!("malformed envelope: {err}")))?;
        envelope.into_data()
    }
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        FetchError::Transient(err.to_string())
    } else {
        FetchError::Permanent(err.to_string())
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, FetchError> {
        let url = self.url(path);
        debug!(%url, ?query, "GET");
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(classify)?;
        Self::unwrap_response(response).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, FetchError> {
        let url = self.url(path);
        debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(classify)?;
        Self::unwrap_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let backend = HttpBackend::new("http://api.local/", Duration::from_secs(5)).unwrap();
        assert_eq!(backend.base_url(), "http://api.local");
        assert_eq!(backend.url("/api/games"), "http://api.local/api/games");
        assert_eq!(backend.url("api/games"), "http://api.local/api/games");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transient() {
        let backend = HttpBackend::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = backend.get("/api/site", &[]).await.unwrap_err();
        assert!(err.is_transient(), "got {err:?}");
    }
}
