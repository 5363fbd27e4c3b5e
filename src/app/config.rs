//! Run configuration management
//!
//! Tuning defaults come from an optional TOML file; command line flags
//! override them. The result is assembled once into an immutable
//! [`RunConfig`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;
use crate::fuzzer::{parse_target, FuzzerConfig, MAX_CONCURRENCY};
use crate::reporting::StatusFilter;

/// File-backed configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fuzzer settings
    pub fuzzer: FuzzerSettings,

    /// Output settings
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzerSettings {
    /// Maximum concurrent probes (0 = unbounded)
    pub concurrency: usize,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Deadline for the probing phase in seconds (0 = none)
    pub max_time_secs: u64,

    /// Follow redirects
    pub follow_redirects: bool,

    /// Maximum redirect depth
    pub max_redirects: usize,

    /// User agent string
    pub user_agent: String,

    /// Accept invalid TLS certificates
    pub insecure: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Sort the report by URL instead of completion order
    pub sort: bool,
}

impl Default for FuzzerSettings {
    fn default() -> Self {
        let defaults = FuzzerConfig::default();
        Self {
            concurrency: defaults.max_concurrent,
            timeout_secs: defaults.timeout.as_secs(),
            max_time_secs: 0,
            follow_redirects: defaults.follow_redirects,
            max_redirects: defaults.max_redirects,
            user_agent: defaults.user_agent,
            insecure: defaults.insecure,
        }
    }
}

impl Config {
    /// Load configuration from file, or defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            tracing::debug!("No configuration file given, using defaults");
            return Ok(Self::default());
        };

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.display().to_string(),
            source,
        })?;

        let config = Self::from_toml(&contents)?;
        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Serialize to TOML text
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fuzzer.timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                field: "fuzzer.timeout_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.fuzzer.concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::ValidationError {
                field: "fuzzer.concurrency".into(),
                reason: format!("must be at most {} (0 for no limit)", MAX_CONCURRENCY),
            });
        }

        if self.fuzzer.follow_redirects && self.fuzzer.max_redirects == 0 {
            return Err(ConfigError::ValidationError {
                field: "fuzzer.max_redirects".into(),
                reason: "must be greater than 0 when following redirects".into(),
            });
        }

        if self.fuzzer.user_agent.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: "fuzzer.user_agent".into(),
                reason: "must not be empty".into(),
            });
        }

        Ok(())
    }

    /// Engine configuration derived from these settings
    pub fn fuzzer_config(&self) -> FuzzerConfig {
        FuzzerConfig {
            max_concurrent: self.fuzzer.concurrency,
            timeout: Duration::from_secs(self.fuzzer.timeout_secs),
            max_time: match self.fuzzer.max_time_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            follow_redirects: self.fuzzer.follow_redirects,
            max_redirects: self.fuzzer.max_redirects,
            user_agent: self.fuzzer.user_agent.clone(),
            insecure: self.fuzzer.insecure,
        }
    }
}

/// Everything one run needs, fixed at startup
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Target URL, including any query/fragment for the baseline
    pub target: Url,
    /// Wordlist path
    pub wordlist: PathBuf,
    /// Optional report file
    pub output: Option<PathBuf>,
    /// Accepted status codes
    pub accepted: StatusFilter,
    /// Sort the report before rendering
    pub sort: bool,
    /// Engine settings
    pub fuzzer: FuzzerConfig,
}

impl RunConfig {
    /// Validate and combine the run inputs
    pub fn assemble(
        config: &Config,
        target: &str,
        wordlist: PathBuf,
        output: Option<PathBuf>,
        status_codes: &str,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            target: parse_target(target)?,
            wordlist,
            output,
            accepted: status_codes.parse()?,
            sort: config.output.sort,
            fuzzer: config.fuzzer_config(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fuzzer.concurrency, 50);
        assert_eq!(config.fuzzer_config().max_time, None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml("[fuzzer]\nconcurrency = 5\nmax_time_secs = 30\n").unwrap();
        assert_eq!(config.fuzzer.concurrency, 5);
        assert_eq!(config.fuzzer.timeout_secs, 10);
        assert!(!config.output.sort);
        assert_eq!(config.fuzzer_config().max_time, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_toml_round_trip_of_defaults() {
        let text = Config::default().to_toml().unwrap();
        let parsed = Config::from_toml(&text).unwrap();
        assert_eq!(parsed.fuzzer.user_agent, Config::default().fuzzer.user_agent);
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let err = Config::from_toml("[fuzzer\nconcurrency = ").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\nsort = true").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert!(config.output.sort);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.fuzzer.timeout_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_oversized_concurrency_rejected() {
        let mut config = Config::default();
        config.fuzzer.concurrency = MAX_CONCURRENCY + 1;

        let err = RunConfig::assemble(
            &config,
            "http://example.com/",
            PathBuf::from("words.txt"),
            None,
            "200",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ValidationError { ref field, .. } if field == "fuzzer.concurrency"
        ));

        config.fuzzer.concurrency = MAX_CONCURRENCY;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_assemble() {
        let run = RunConfig::assemble(
            &Config::default(),
            "http://example.com/a?x=1",
            PathBuf::from("words.txt"),
            None,
            "200,403",
        )
        .unwrap();

        assert_eq!(run.target.query(), Some("x=1"));
        assert!(run.accepted.allows(403));
        assert!(!run.accepted.allows(301));
    }

    #[test]
    fn test_assemble_rejects_bad_status_list() {
        let err = RunConfig::assemble(
            &Config::default(),
            "http://example.com/",
            PathBuf::from("words.txt"),
            None,
            "200;301",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStatusCodes { .. }));
    }
}
