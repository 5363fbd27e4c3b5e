//! Custom error types for segfuzz
//!
//! Setup failures (configuration, resources, baseline) end the run.
//! Per-probe transport failures are contained in the dispatcher and
//! never reach the top level.

use thiserror::Error;

/// Main error type for a fuzzing run
#[derive(Error, Debug)]
pub enum FuzzError {
    /// Malformed command line or configuration input
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Wordlist or output file problems
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// The reference request against the unmodified target failed
    #[error("Baseline request to {url} failed: {source}")]
    Baseline {
        url: String,
        #[source]
        source: HttpError,
    },

    /// HTTP client setup errors
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {path}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration value: {field} - {reason}")]
    ValidationError { field: String, reason: String },

    #[error("Invalid status code list '{input}': {reason}")]
    InvalidStatusCodes { input: String, reason: String },

    #[error("Invalid target URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Wordlist and output file errors
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Failed to read wordlist: {path}")]
    WordlistRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output file: {path}")]
    OutputWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Transport-level failures of a single request
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl HttpError {
    /// Classify a reqwest error into the transport taxonomy
    pub fn from_reqwest(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            HttpError::Timeout(timeout_ms)
        } else if err.is_connect() {
            HttpError::ConnectionError(err.to_string())
        } else if err.is_builder() {
            HttpError::InvalidUrl(err.to_string())
        } else {
            HttpError::RequestFailed(err.to_string())
        }
    }
}

impl FuzzError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            FuzzError::Config(e) => format!("Configuration problem: {}", e.user_hint()),
            FuzzError::Resource(e) => format!("File problem: {}", e.user_hint()),
            FuzzError::Baseline { url, source } => format!(
                "Could not fetch the baseline from {}: {}",
                url,
                source.user_hint()
            ),
            FuzzError::Http(e) => format!("Network issue: {}", e.user_hint()),
        }
    }
}

/// Trait for providing user-friendly hints
pub trait UserHint {
    fn user_hint(&self) -> String;
}

impl UserHint for ConfigError {
    fn user_hint(&self) -> String {
        match self {
            ConfigError::ReadError { path, .. } => {
                format!("Could not read '{}'. Check if the file exists and you have read permissions.", path)
            }
            ConfigError::ParseError(_) => {
                "The configuration file has invalid syntax. Check for TOML formatting errors.".into()
            }
            ConfigError::ValidationError { field, reason } => {
                format!("Invalid value for '{}': {}", field, reason)
            }
            ConfigError::InvalidStatusCodes { input, .. } => {
                format!("'{}' is not a comma-separated list of status codes, e.g. 200,301,403.", input)
            }
            ConfigError::InvalidUrl { url, reason } => {
                format!("'{}' is not a usable target ({}). Use an absolute http(s) URL.", url, reason)
            }
        }
    }
}

impl UserHint for ResourceError {
    fn user_hint(&self) -> String {
        match self {
            ResourceError::WordlistRead { path, source } => {
                format!("Could not read wordlist '{}': {}", path, source)
            }
            ResourceError::OutputWrite { path, source } => {
                format!("Could not write results to '{}': {}", path, source)
            }
        }
    }
}

impl UserHint for HttpError {
    fn user_hint(&self) -> String {
        match self {
            HttpError::ConnectionError(_) => {
                "Could not connect to the server. Check if it's running and accessible.".into()
            }
            HttpError::Timeout(ms) => {
                format!("Request timed out after {}ms. The server may be slow or unresponsive.", ms)
            }
            HttpError::InvalidUrl(url) => {
                format!("'{}' is not a valid URL. Check the format.", url)
            }
            _ => self.to_string(),
        }
    }
}
