//! HTTP transport module
//!
//! Provides the GET transport shared by the baseline fetch and every
//! probe, plus the response summary the fuzzer compares against.

mod client;
mod response;

pub use client::HttpClient;
pub use response::Response;

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::HttpError;

/// Trait for issuing a single GET with an explicit timeout
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url`, reading the full body, failing after `timeout`
    async fn get(&self, url: &Url, timeout: Duration) -> Result<Response, HttpError>;
}
