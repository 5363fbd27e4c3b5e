//! HTTP client implementation

use std::time::{Duration, Instant};

use async_trait::async_trait;
use url::Url;

use super::{Response, Transport};
use crate::error::HttpError;
use crate::fuzzer::FuzzerConfig;

/// HTTP client wrapper
///
/// Cloning is cheap: the inner reqwest client shares one connection pool.
#[derive(Clone)]
pub struct HttpClient {
    /// Inner reqwest client
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(config: &FuzzerConfig) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(config.max_redirects)
            } else {
                reqwest::redirect::Policy::none()
            })
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(config.insecure)
            .build()
            .map_err(|e| HttpError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, url: &Url, timeout: Duration) -> Result<Response, HttpError> {
        let timeout_ms = timeout.as_millis() as u64;
        let start = Instant::now();

        let response = self
            .client
            .get(url.as_str())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| HttpError::from_reqwest(e, timeout_ms))?;

        let status = response.status().as_u16();

        let body = response
            .text()
            .await
            .map_err(|e| HttpError::from_reqwest(e, timeout_ms))?;

        Ok(Response {
            status,
            length: body.chars().count(),
            elapsed: start.elapsed(),
        })
    }
}
