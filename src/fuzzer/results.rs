//! Probe outcomes and result collection

use std::collections::HashMap;
use std::time::Duration;

use crate::error::HttpError;
use crate::http::Response;

/// Reference response from the unmodified target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Baseline {
    /// HTTP status code (informational)
    pub status: u16,
    /// Body length every probe is compared against
    pub length: usize,
    /// Response time
    pub elapsed: Duration,
}

impl From<Response> for Baseline {
    fn from(response: Response) -> Self {
        Self {
            status: response.status,
            length: response.length,
            elapsed: response.elapsed,
        }
    }
}

/// Single probe result that survived the 404 cut
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// Candidate URL
    pub url: String,
    /// HTTP status code
    pub status_code: u16,
    /// Probe body length minus baseline body length
    pub length_diff: i64,
    /// Response time (informational)
    pub elapsed: Duration,
}

impl ProbeResult {
    pub fn new(url: &str, status_code: u16, length_diff: i64, elapsed: Duration) -> Self {
        Self {
            url: url.to_string(),
            status_code,
            length_diff,
            elapsed,
        }
    }

    /// Compare a probe response against the baseline
    pub fn from_response(url: &str, response: &Response, baseline: &Baseline) -> Self {
        Self::new(
            url,
            response.status,
            response.length_diff(baseline.length),
            response.elapsed,
        )
    }

    /// Response time relative to the baseline, in milliseconds
    pub fn time_diff_ms(&self, baseline: &Baseline) -> i64 {
        self.elapsed.as_millis() as i64 - baseline.elapsed.as_millis() as i64
    }
}

/// Terminal outcome of one probe
#[derive(Debug)]
pub enum ProbeOutcome {
    /// Any response other than 404
    Hit(ProbeResult),
    /// 404, dropped unconditionally
    NotFound,
    /// Transport failure, dropped after logging
    Failed(HttpError),
}

impl ProbeOutcome {
    /// Classify a probe response
    pub fn from_response(url: &str, response: &Response, baseline: &Baseline) -> Self {
        if response.is_not_found() {
            ProbeOutcome::NotFound
        } else {
            ProbeOutcome::Hit(ProbeResult::from_response(url, response, baseline))
        }
    }
}

/// Results of one fuzzing run, in completion order
#[derive(Debug, Clone)]
pub struct FuzzResultSet {
    /// Baseline the results were compared against
    pub baseline: Baseline,
    /// Probe results that were not 404 and did not fail
    pub results: Vec<ProbeResult>,
    /// Status code distribution of the kept results
    pub status_distribution: HashMap<u16, usize>,
    /// Whether the run was stopped before every candidate was sent
    pub stopped_early: bool,
}

impl FuzzResultSet {
    pub fn new(baseline: Baseline) -> Self {
        Self {
            baseline,
            results: Vec::new(),
            status_distribution: HashMap::new(),
            stopped_early: false,
        }
    }

    /// Add a result
    pub fn add_result(&mut self, result: ProbeResult) {
        *self.status_distribution.entry(result.status_code).or_insert(0) += 1;
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
