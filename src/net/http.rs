//! HTTP transport for the Overpass interpreter, abstracted for testability.

use std::future::Future;

use thiserror::Error;

/// What can go wrong talking to the interpreter. Everything is carried as a
/// displayable message; callers surface `to_string()` to the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Overpass API error: {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Request(String),
    #[error("malformed Overpass response: {0}")]
    Parse(String),
}

/// Trait for the one HTTP operation the interpreter needs.
///
/// Allows injecting a mock client in tests instead of hitting the network.
pub trait HttpClient: Send + Sync {
    /// POST `form` as an application/x-www-form-urlencoded body and return
    /// the raw response bytes. A non-2xx status is an [`ApiError::Status`].
    fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> impl Future<Output = Result<Vec<u8>, ApiError>> + Send;
}

/// Real HTTP client backed by reqwest.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestClient {
    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<Vec<u8>, ApiError> {
        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| ApiError::Request(e.to_string()))
    }
}
