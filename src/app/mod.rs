//! Application core module
//!
//! Runs one fuzzing pass end to end: load the wordlist, generate the
//! candidates, fetch the baseline, probe, filter and report.

mod config;

pub use config::{Config, RunConfig};

use std::sync::Arc;

use crate::error::FuzzError;
use crate::fuzzer::{candidate_count, generate, path_segments, Fuzzer, Wordlist};
use crate::reporting::Report;

/// A configured fuzzing run
pub struct App {
    run: RunConfig,
    fuzzer: Arc<Fuzzer>,
}

impl App {
    /// Create a new application
    pub fn new(run: RunConfig) -> Result<Self, FuzzError> {
        let fuzzer = Arc::new(Fuzzer::new(run.fuzzer.clone())?);
        Ok(Self::with_fuzzer(run, fuzzer))
    }

    /// Create an application around an existing fuzzer
    pub fn with_fuzzer(run: RunConfig, fuzzer: Arc<Fuzzer>) -> Self {
        Self { run, fuzzer }
    }

    /// Handle used to stop the run from a signal handler
    pub fn fuzzer(&self) -> Arc<Fuzzer> {
        self.fuzzer.clone()
    }

    /// Fuzz the target and build the filtered report
    pub async fn execute(&self) -> Result<Report, FuzzError> {
        let wordlist = Wordlist::from_file(&self.run.wordlist)?;
        if wordlist.is_empty() {
            tracing::warn!(wordlist = %wordlist.name, "Wordlist is empty, no candidates to probe");
        }
        let target = &self.run.target;

        let candidates = generate(target, &wordlist.entries);
        debug_assert_eq!(candidates.len(), candidate_count(target, wordlist.len()));

        tracing::info!(
            target = %target,
            wordlist = %wordlist.name,
            segments = path_segments(target).len(),
            candidates = candidates.len(),
            concurrency = self.fuzzer.config().max_concurrent,
            accepted = %self.run.accepted,
            "Starting fuzz run"
        );

        let baseline = self.fuzzer.baseline(target).await?;
        let results = self.fuzzer.fuzz(candidates, baseline).await;

        let stats = self.fuzzer.stats();
        tracing::info!(
            sent = stats.requests_sent,
            kept = results.len(),
            not_found = stats.not_found,
            errors = stats.errors,
            elapsed_ms = stats.elapsed_ms,
            rps = stats.requests_per_second,
            baseline_status = results.baseline.status,
            baseline_length = results.baseline.length,
            statuses = ?results.status_distribution,
            state = ?self.fuzzer.state(),
            "Fuzz run finished"
        );

        if results.is_empty() {
            tracing::info!("No probe returned a usable response");
        }
        if results.stopped_early {
            tracing::warn!("Run was stopped early; the report covers only the probes that were sent");
        }

        let report = Report::from_results(&results.results, &self.run.accepted);
        tracing::info!(matched = report.len(), "Filtered results");

        Ok(if self.run.sort { report.sorted() } else { report })
    }

    /// Execute, print the report to stdout, and write the optional file
    pub async fn run(&self) -> Result<Report, FuzzError> {
        let report = self.execute().await?;
        let text = report.to_text();

        println!("{}", text);

        if let Some(path) = &self.run.output {
            Report::save(&text, path)?;
        }

        Ok(report)
    }
}
