//! HTTP client abstraction for testability

use std::time::Duration;

use super::error::LookupError;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("lastmix/", env!("CARGO_PKG_VERSION"));

/// Trait for HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the body as text.
    fn get(&self, url: &str) -> Result<String, LookupError>;
}

impl<C: HttpClient + ?Sized> HttpClient for std::sync::Arc<C> {
    fn get(&self, url: &str) -> Result<String, LookupError> {
        (**self).get(url)
    }
}

/// Real HTTP client implementation using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a client with a 30 second request timeout.
    pub fn new() -> Result<Self, LookupError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Creates a client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LookupError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<String, LookupError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| LookupError::Transport(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(LookupError::Transport(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        response
            .text()
            .map_err(|e| LookupError::Transport(format!("Failed to read response: {}", e)))
    }
}
