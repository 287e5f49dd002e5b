//! HTTP implementation of [`QueryBackend`].

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;
use url::Url;

use super::{BackendError, QueryBackend};
use crate::transcript::ChatResponse;

/// Request body of `POST /chat`.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Client for `POST {base}/chat`.
///
/// One request per query: no retries, no timeout.
///
/// # Example
///
/// ```rust,no_run
/// use video_gpt::backend::{HttpQueryClient, QueryBackend};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpQueryClient::new("http://127.0.0.1:8000")?;
/// let response = client.query("learn python decorators").await?;
/// println!("{} results", response.results.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpQueryClient {
    endpoint: Url,
    http: reqwest::Client,
}

impl HttpQueryClient {
    /// Create a client for the backend at `base_url`.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, BackendError> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a client with a custom reqwest client.
    pub fn with_client(
        base_url: impl AsRef<str>,
        http: reqwest::Client,
    ) -> Result<Self, BackendError> {
        let base_url = Url::parse(base_url.as_ref())?;
        let endpoint = chat_endpoint(&base_url)?;
        Ok(Self { endpoint, http })
    }

    /// The resolved `/chat` endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl QueryBackend for HttpQueryClient {
    async fn query(&self, message: &str) -> Result<ChatResponse, BackendError> {
        debug!(endpoint = %self.endpoint, "Sending chat query");

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&ChatRequest { message })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| BackendError::Decode(e.to_string()))?;

        debug!(
            query = %parsed.query,
            results = parsed.results.len(),
            "Chat query answered"
        );
        Ok(parsed)
    }
}

/// Resolve `chat` below the base path, keeping any path prefix.
fn chat_endpoint(base: &Url) -> Result<Url, url::ParseError> {
    let mut dir = base.clone();
    if !dir.path().ends_with('/') {
        let path = format!("{}/", dir.path());
        dir.set_path(&path);
    }
    dir.join("chat")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_bare_host() {
        let client = HttpQueryClient::new("http://127.0.0.1:8000").unwrap();
        assert_eq!(client.endpoint().as_str(), "http://127.0.0.1:8000/chat");
    }

    #[test]
    fn test_endpoint_keeps_path_prefix() {
        let client = HttpQueryClient::new("https://videos.example.com/api").unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://videos.example.com/api/chat"
        );

        let client = HttpQueryClient::new("https://videos.example.com/api/").unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://videos.example.com/api/chat"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpQueryClient::new("not a url").unwrap_err();
        assert!(matches!(err, BackendError::InvalidBaseUrl(_)));
    }

    #[test]
    fn test_rejected_display() {
        let err = BackendError::Rejected {
            status: 503,
            body: "service unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "Backend error 503: service unavailable");
    }
}
