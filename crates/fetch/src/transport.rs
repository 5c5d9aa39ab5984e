//! Network transport.
//!
//! The retrieval client only ever issues GETs for whole documents, so the
//! seam is a single method. [`HttpTransport`] is the production
//! implementation; tests substitute counting stubs.

use async_trait::async_trait;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use studbook_config::UpstreamConfig;
use studbook_core::error::FetchError;
use tracing::{debug, warn};

#[async_trait]
pub trait Transport: Send + Sync {
    /// GET a document and return its body. Non-success statuses are errors.
    async fn get(&self, url: &str) -> Result<String, FetchError>;
}

/// reqwest-backed transport with the configured timeout, user agent and
/// optional session cookie.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &UpstreamConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = &config.session_cookie {
            match HeaderValue::from_str(cookie) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(COOKIE, value);
                }
                Err(_) => warn!("Session cookie contains invalid header characters, ignoring it"),
            }
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status_code: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Network(format!("{url}: reading body: {e}")))
    }
}
