//! Fuzzer module - path-segment injection fuzzing
//!
//! Loads a wordlist, splices each word into every segment position of the
//! target path, and probes the candidates concurrently against a baseline.

mod engine;
mod generator;
mod results;
mod wordlist;

pub use engine::{Fuzzer, FuzzerConfig, MAX_CONCURRENCY};
pub use generator::{candidate_count, generate, parse_target, path_segments, CandidateUrl};
pub use results::{Baseline, FuzzResultSet, ProbeOutcome, ProbeResult};
pub use wordlist::Wordlist;

/// Fuzzer statistics
#[derive(Debug, Clone, Default)]
pub struct FuzzerStats {
    /// Total requests completed (any outcome)
    pub requests_sent: usize,
    /// Total requests remaining
    pub requests_remaining: usize,
    /// Requests per second
    pub requests_per_second: f64,
    /// Responses kept for reporting
    pub hits: usize,
    /// 404 responses dropped
    pub not_found: usize,
    /// Transport errors
    pub errors: usize,
    /// Start time
    pub start_time: Option<std::time::Instant>,
    /// Elapsed time in milliseconds
    pub elapsed_ms: u64,
}

impl FuzzerStats {
    pub fn progress(&self) -> f64 {
        let total = self.requests_sent + self.requests_remaining;
        if total == 0 {
            0.0
        } else {
            self.requests_sent as f64 / total as f64
        }
    }

    /// Count one finished probe
    pub fn record(&mut self, outcome: &ProbeOutcome) {
        match outcome {
            ProbeOutcome::Hit(_) => self.hits += 1,
            ProbeOutcome::NotFound => self.not_found += 1,
            ProbeOutcome::Failed(_) => self.errors += 1,
        }

        self.requests_sent += 1;
        self.requests_remaining = self.requests_remaining.saturating_sub(1);
        if let Some(start_time) = self.start_time {
            self.elapsed_ms = start_time.elapsed().as_millis() as u64;
            if self.elapsed_ms > 0 {
                self.requests_per_second =
                    self.requests_sent as f64 / (self.elapsed_ms as f64 / 1000.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpError;
    use std::time::Duration;

    #[test]
    fn test_stats_record_and_progress() {
        let mut stats = FuzzerStats {
            requests_remaining: 4,
            ..FuzzerStats::default()
        };
        assert_eq!(stats.progress(), 0.0);

        stats.record(&ProbeOutcome::NotFound);
        stats.record(&ProbeOutcome::Failed(HttpError::Timeout(10)));
        stats.record(&ProbeOutcome::Hit(ProbeResult::new("http://t/a", 200, 0, Duration::ZERO)));

        assert_eq!(stats.requests_sent, 3);
        assert_eq!(stats.requests_remaining, 1);
        assert_eq!((stats.hits, stats.not_found, stats.errors), (1, 1, 1));
        assert_eq!(stats.progress(), 0.75);
    }
}
