//! Report Generation Module
//!
//! Filters probe results by the accepted status codes and renders the
//! text report printed to stdout and optionally written to a file.

pub mod formats;

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ConfigError, ResourceError};
use crate::fuzzer::ProbeResult;

/// Status code that is never reported, whatever the accepted set says
pub const NOT_FOUND: u16 = 404;

/// Accepted status-code set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFilter {
    codes: BTreeSet<u16>,
}

impl StatusFilter {
    pub fn new(codes: impl IntoIterator<Item = u16>) -> Self {
        Self {
            codes: codes.into_iter().collect(),
        }
    }

    /// Whether a result with this status belongs in the report
    pub fn allows(&self, status: u16) -> bool {
        status != NOT_FOUND && self.codes.contains(&status)
    }

    pub fn codes(&self) -> impl Iterator<Item = u16> + '_ {
        self.codes.iter().copied()
    }
}

impl Default for StatusFilter {
    fn default() -> Self {
        Self::new([200])
    }
}

impl FromStr for StatusFilter {
    type Err = ConfigError;

    /// Parse a comma-separated list such as `200,301, 403`
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| ConfigError::InvalidStatusCodes {
            input: input.to_string(),
            reason,
        };

        let codes = input
            .split(',')
            .map(|part| {
                let part = part.trim();
                part.parse::<u16>()
                    .map_err(|e| invalid(format!("'{}': {}", part, e)))
                    .and_then(|code| {
                        if (100..=999).contains(&code) {
                            Ok(code)
                        } else {
                            Err(invalid(format!("{} is not an HTTP status code", code)))
                        }
                    })
            })
            .collect::<Result<BTreeSet<u16>, ConfigError>>()?;

        if codes.contains(&NOT_FOUND) {
            tracing::warn!("404 is in the accepted status codes but 404 responses are never reported");
        }

        Ok(Self { codes })
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<String> = self.codes().map(|c| c.to_string()).collect();
        f.write_str(&codes.join(","))
    }
}

/// Filtered results ready for rendering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// Retained results, in render order
    pub results: Vec<ProbeResult>,
}

impl Report {
    pub fn new(results: Vec<ProbeResult>) -> Self {
        Self { results }
    }

    /// Keep only results whose status is accepted
    pub fn from_results(results: &[ProbeResult], accepted: &StatusFilter) -> Self {
        Self::new(
            results
                .iter()
                .filter(|r| accepted.allows(r.status_code))
                .cloned()
                .collect(),
        )
    }

    /// Order results by URL, then status
    pub fn sorted(mut self) -> Self {
        self.results
            .sort_by(|a, b| a.url.cmp(&b.url).then(a.status_code.cmp(&b.status_code)));
        self
    }

    /// Render the text report
    pub fn to_text(&self) -> String {
        formats::text::generate(self)
    }

    /// Write rendered text to `path`, replacing any existing content
    pub fn save(text: &str, path: &Path) -> Result<(), ResourceError> {
        std::fs::write(path, text).map_err(|source| ResourceError::OutputWrite {
            path: path.display().to_string(),
            source,
        })?;

        tracing::info!(path = %path.display(), bytes = text.len(), "Wrote report");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn result(url: &str, status: u16) -> ProbeResult {
        ProbeResult::new(url, status, 0, Duration::ZERO)
    }

    #[test]
    fn test_parse_status_codes() {
        let filter: StatusFilter = "200, 301,403".parse().unwrap();
        assert_eq!(filter.codes().collect::<Vec<_>>(), vec![200, 301, 403]);
        assert_eq!(filter.to_string(), "200,301,403");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "200,", "abc", "200,ok", "70000", "42"] {
            let err = input.parse::<StatusFilter>().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidStatusCodes { .. }), "{}", input);
        }
    }

    #[test]
    fn test_default_accepts_200_only() {
        let filter = StatusFilter::default();
        assert!(filter.allows(200));
        assert!(!filter.allows(201));
    }

    #[test]
    fn test_404_never_allowed() {
        let filter: StatusFilter = "200,404".parse().unwrap();
        assert!(!filter.allows(404));

        let report = Report::from_results(&[result("http://t/a", 404)], &filter);
        assert!(report.is_empty());
    }

    #[test]
    fn test_membership_law() {
        let filter = StatusFilter::new([200, 302, 404, 500]);
        for status in [100, 200, 204, 302, 403, 404, 500, 503] {
            let report = Report::from_results(&[result("http://t/a", status)], &filter);
            let expected = status != 404 && [200, 302, 500].contains(&status);
            assert_eq!(report.len() == 1, expected, "status {}", status);
        }
    }

    #[test]
    fn test_filter_keeps_order() {
        let results = vec![
            result("http://t/c", 200),
            result("http://t/x", 500),
            result("http://t/a", 200),
        ];
        let report = Report::from_results(&results, &StatusFilter::default());
        let urls: Vec<&str> = report.results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["http://t/c", "http://t/a"]);

        let urls: Vec<String> = report.sorted().results.into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["http://t/a", "http://t/c"]);
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "old content that is longer than the new one").unwrap();

        Report::save("new", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_save_to_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/out.txt");
        let err = Report::save("x", &path).unwrap_err();
        assert!(matches!(err, ResourceError::OutputWrite { .. }));
    }
}
