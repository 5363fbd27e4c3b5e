//! Core fuzzer engine with concurrent request handling

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::Semaphore;
use url::Url;

use super::{Baseline, CandidateUrl, FuzzResultSet, FuzzerStats, ProbeOutcome};
use crate::error::FuzzError;
use crate::http::{HttpClient, Transport};

/// Largest in-flight probe limit the dispatcher can honor
pub const MAX_CONCURRENCY: usize = Semaphore::MAX_PERMITS;

/// Fuzzer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuzzerState {
    Idle,
    Running,
    Stopped,
    Completed,
}

/// Fuzzer configuration
#[derive(Debug, Clone)]
pub struct FuzzerConfig {
    /// Maximum concurrent requests (0 = no limit)
    pub max_concurrent: usize,
    /// Per-request timeout
    pub timeout: Duration,
    /// Deadline for the probing phase
    pub max_time: Option<Duration>,
    /// Whether to follow redirects
    pub follow_redirects: bool,
    /// Redirect hop limit when following
    pub max_redirects: usize,
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Accept invalid TLS certificates
    pub insecure: bool,
}

impl Default for FuzzerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 50,
            timeout: Duration::from_secs(10),
            max_time: None,
            follow_redirects: true,
            max_redirects: 10,
            user_agent: format!("segfuzz/{}", env!("CARGO_PKG_VERSION")),
            insecure: false,
        }
    }
}

/// Path-segment fuzzer
pub struct Fuzzer {
    /// Configuration
    config: FuzzerConfig,
    /// Current state
    state: Arc<RwLock<FuzzerState>>,
    /// Statistics
    stats: Arc<RwLock<FuzzerStats>>,
    /// Shared transport
    transport: Arc<dyn Transport>,
}

impl Fuzzer {
    /// Create a new fuzzer backed by a reqwest client
    pub fn new(config: FuzzerConfig) -> Result<Self, FuzzError> {
        let client = HttpClient::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(client)))
    }

    /// Create a fuzzer over an existing transport
    pub fn with_transport(config: FuzzerConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(FuzzerState::Idle)),
            stats: Arc::new(RwLock::new(FuzzerStats::default())),
            transport,
        }
    }

    /// Fetch the unmodified target once; failure ends the run
    pub async fn baseline(&self, target: &Url) -> Result<Baseline, FuzzError> {
        let response = self
            .transport
            .get(target, self.config.timeout)
            .await
            .map_err(|source| FuzzError::Baseline {
                url: target.to_string(),
                source,
            })?;

        let baseline = Baseline::from(response);

        tracing::info!(
            url = %target,
            status = baseline.status,
            length = baseline.length,
            elapsed_ms = baseline.elapsed.as_millis() as u64,
            "Baseline recorded"
        );

        Ok(baseline)
    }

    /// Probe every candidate and collect the non-404, non-error results
    pub async fn fuzz(&self, candidates: Vec<CandidateUrl>, baseline: Baseline) -> FuzzResultSet {
        let results = Arc::new(RwLock::new(FuzzResultSet::new(baseline)));

        {
            let mut state = self.state.write();
            if *state == FuzzerState::Stopped {
                tracing::warn!("Fuzzer stopped before probing started");
                let mut set = results.read().clone();
                set.stopped_early = !candidates.is_empty();
                return set;
            }
            *state = FuzzerState::Running;

            let mut stats = self.stats.write();
            *stats = FuzzerStats::default();
            stats.start_time = Some(Instant::now());
            stats.requests_remaining = candidates.len();
        }

        let deadline = self.config.max_time.map(|max_time| {
            let state = self.state.clone();
            tokio::spawn(async move {
                tokio::time::sleep(max_time).await;
                let mut state = state.write();
                if *state == FuzzerState::Running {
                    tracing::warn!(max_time_secs = max_time.as_secs_f64(), "Run deadline reached");
                    *state = FuzzerState::Stopped;
                }
            })
        });

        let limit = match self.config.max_concurrent {
            0 => MAX_CONCURRENCY,
            n => n.min(MAX_CONCURRENCY),
        };
        let semaphore = Arc::new(Semaphore::new(limit));

        let total = candidates.len();
        let mut launched = 0;
        let mut handles = Vec::with_capacity(total);

        for candidate in candidates {
            if self.is_stopped() {
                break;
            }

            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            // a stop may have landed while waiting for a permit
            if self.is_stopped() {
                break;
            }

            let transport = self.transport.clone();
            let results = results.clone();
            let stats = self.stats.clone();
            let timeout = self.config.timeout;

            launched += 1;
            handles.push(tokio::spawn(async move {
                let outcome = probe(transport.as_ref(), &candidate, &baseline, timeout).await;

                {
                    let mut stats = stats.write();
                    stats.record(&outcome);
                }

                match outcome {
                    ProbeOutcome::Hit(result) => {
                        tracing::debug!(
                            url = %result.url,
                            status = result.status_code,
                            length_diff = result.length_diff,
                            time_diff_ms = result.time_diff_ms(&baseline),
                            "Probe response"
                        );
                        results.write().add_result(result);
                    }
                    ProbeOutcome::NotFound => {
                        tracing::trace!(url = %candidate, "Probe returned 404");
                    }
                    ProbeOutcome::Failed(error) => {
                        tracing::warn!(url = %candidate, error = %error, "Probe failed");
                    }
                }

                drop(permit);
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Probe task panicked");
            }
        }

        if let Some(deadline) = deadline {
            deadline.abort();
        }

        let stopped_early = launched < total;
        if stopped_early {
            tracing::warn!(
                launched,
                skipped = total - launched,
                progress = self.stats.read().progress(),
                "Fuzzing stopped before all candidates were sent"
            );
        }

        *self.state.write() = if stopped_early {
            FuzzerState::Stopped
        } else {
            FuzzerState::Completed
        };

        let mut set = results.read().clone();
        set.stopped_early = stopped_early;
        set
    }

    /// Stop launching new probes; in-flight probes still finish
    pub fn stop(&self) {
        *self.state.write() = FuzzerState::Stopped;
    }

    /// Get current state
    pub fn state(&self) -> FuzzerState {
        *self.state.read()
    }

    pub fn is_stopped(&self) -> bool {
        self.state() == FuzzerState::Stopped
    }

    /// Get current stats
    pub fn stats(&self) -> FuzzerStats {
        self.stats.read().clone()
    }

    pub fn config(&self) -> &FuzzerConfig {
        &self.config
    }
}

/// Fetch one candidate and classify the outcome
pub async fn probe(
    transport: &dyn Transport,
    candidate: &CandidateUrl,
    baseline: &Baseline,
    timeout: Duration,
) -> ProbeOutcome {
    match transport.get(&candidate.url, timeout).await {
        Ok(response) => ProbeOutcome::from_response(candidate.url.as_str(), &response, baseline),
        Err(error) => ProbeOutcome::Failed(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HttpError;
    use crate::fuzzer::{generate, parse_target};
    use crate::http::Response;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Canned responses keyed by path; `/slow` times out, unknown paths fail to connect
    struct FakeTransport {
        routes: HashMap<String, (u16, usize)>,
        delay: Duration,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl FakeTransport {
        fn new(routes: &[(&str, u16, usize)]) -> Self {
            Self {
                routes: routes
                    .iter()
                    .map(|(path, status, len)| (path.to_string(), (*status, *len)))
                    .collect(),
                delay: Duration::ZERO,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn get(&self, url: &Url, timeout: Duration) -> Result<Response, HttpError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if url.path() == "/slow" {
                return Err(HttpError::Timeout(timeout.as_millis() as u64));
            }

            match self.routes.get(url.path()) {
                Some((status, length)) => Ok(Response {
                    status: *status,
                    length: *length,
                    elapsed: self.delay,
                }),
                None => Err(HttpError::ConnectionError("connection refused".into())),
            }
        }
    }

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_fuzzer_config_default() {
        let config = FuzzerConfig::default();
        assert_eq!(config.max_concurrent, 50);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.max_time.is_none());
    }

    #[tokio::test]
    async fn test_baseline_failure_is_fatal() {
        let fuzzer = Fuzzer::with_transport(FuzzerConfig::default(), Arc::new(FakeTransport::new(&[])));
        let target = parse_target("http://target/").unwrap();

        let err = fuzzer.baseline(&target).await.unwrap_err();
        assert!(matches!(err, FuzzError::Baseline { .. }));
    }

    #[tokio::test]
    async fn test_fuzz_drops_404_and_errors() {
        let transport = FakeTransport::new(&[
            ("/", 200, 100),
            ("/admin", 200, 120),
            ("/missing", 404, 50),
            ("/broken", 500, 10),
        ]);
        let fuzzer = Fuzzer::with_transport(FuzzerConfig::default(), Arc::new(transport));
        let target = parse_target("http://target/").unwrap();

        let baseline = fuzzer.baseline(&target).await.unwrap();
        assert_eq!(baseline.length, 100);

        // "refused" has no route and fails like a dead connection
        let candidates = generate(&target, &words(&["admin", "missing", "refused", "broken"]));
        let set = fuzzer.fuzz(candidates, baseline).await;

        let mut found: Vec<(String, u16, i64)> = set
            .results
            .iter()
            .map(|r| (r.url.clone(), r.status_code, r.length_diff))
            .collect();
        found.sort();

        assert_eq!(
            found,
            vec![
                ("http://target/admin".to_string(), 200, 20),
                ("http://target/broken".to_string(), 500, -90),
            ]
        );
        assert!(!set.stopped_early);
        assert_eq!(set.baseline.length, 100);
        assert_eq!(fuzzer.state(), FuzzerState::Completed);

        let stats = fuzzer.stats();
        assert_eq!(stats.requests_sent, 4);
        assert_eq!(stats.requests_remaining, 0);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.not_found, 1);
        assert_eq!(stats.errors, 1);
    }

    #[tokio::test]
    async fn test_concurrency_cap_is_respected() {
        let routes: Vec<(String, u16, usize)> =
            (0..20).map(|i| (format!("/w{}", i), 200, 1)).collect();
        let routes: Vec<(&str, u16, usize)> =
            routes.iter().map(|(p, s, l)| (p.as_str(), *s, *l)).collect();
        let transport = Arc::new(FakeTransport::new(&routes).with_delay(Duration::from_millis(20)));

        let config = FuzzerConfig {
            max_concurrent: 3,
            ..FuzzerConfig::default()
        };
        let fuzzer = Fuzzer::with_transport(config, transport.clone());
        let target = parse_target("http://target").unwrap();
        let list: Vec<String> = (0..20).map(|i| format!("w{}", i)).collect();

        let baseline = Baseline {
            status: 200,
            length: 1,
            elapsed: Duration::ZERO,
        };
        let set = fuzzer.fuzz(generate(&target, &list), baseline).await;

        assert_eq!(set.len(), 20);
        assert!(transport.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_stopped_fuzzer_sends_nothing() {
        let transport = Arc::new(FakeTransport::new(&[("/a", 200, 1)]));
        let fuzzer = Fuzzer::with_transport(FuzzerConfig::default(), transport.clone());
        let target = parse_target("http://target").unwrap();
        let baseline = Baseline {
            status: 200,
            length: 1,
            elapsed: Duration::ZERO,
        };

        fuzzer.stop();
        let set = fuzzer.fuzz(generate(&target, &words(&["a"])), baseline).await;

        assert!(set.is_empty());
        assert!(set.stopped_early);
        assert_eq!(transport.peak.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_deadline_stops_launching() {
        let routes: Vec<(String, u16, usize)> =
            (0..10).map(|i| (format!("/w{}", i), 200, 1)).collect();
        let routes: Vec<(&str, u16, usize)> =
            routes.iter().map(|(p, s, l)| (p.as_str(), *s, *l)).collect();
        let transport = Arc::new(FakeTransport::new(&routes).with_delay(Duration::from_millis(100)));

        let config = FuzzerConfig {
            max_concurrent: 1,
            max_time: Some(Duration::from_millis(150)),
            ..FuzzerConfig::default()
        };
        let fuzzer = Fuzzer::with_transport(config, transport);
        let target = parse_target("http://target").unwrap();
        let list: Vec<String> = (0..10).map(|i| format!("w{}", i)).collect();
        let baseline = Baseline {
            status: 200,
            length: 1,
            elapsed: Duration::ZERO,
        };

        let set = fuzzer.fuzz(generate(&target, &list), baseline).await;

        assert!(set.stopped_early);
        assert!(set.len() < 10);
        assert!(!set.is_empty());
        assert_eq!(fuzzer.state(), FuzzerState::Stopped);
    }

    #[tokio::test]
    async fn test_timed_out_probe_is_dropped_and_counted() {
        let transport = FakeTransport::new(&[("/", 200, 10), ("/fast", 200, 12)]);
        let config = FuzzerConfig {
            timeout: Duration::from_millis(250),
            ..FuzzerConfig::default()
        };
        let fuzzer = Fuzzer::with_transport(config, Arc::new(transport));
        let target = parse_target("http://target/").unwrap();

        let baseline = fuzzer.baseline(&target).await.unwrap();
        let set = fuzzer.fuzz(generate(&target, &words(&["slow", "fast"])), baseline).await;

        assert_eq!(set.len(), 1);
        assert_eq!(set.results[0].url, "http://target/fast");
        assert_eq!(set.results[0].length_diff, 2);

        let stats = fuzzer.stats();
        assert_eq!(stats.requests_sent, 2);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.hits, 1);
    }

    #[tokio::test]
    async fn test_unbounded_concurrency_returns_everything() {
        let routes: Vec<(String, u16, usize)> =
            (0..30).map(|i| (format!("/w{}", i), 200, 1)).collect();
        let routes: Vec<(&str, u16, usize)> =
            routes.iter().map(|(p, s, l)| (p.as_str(), *s, *l)).collect();
        let transport = Arc::new(FakeTransport::new(&routes).with_delay(Duration::from_millis(20)));

        let config = FuzzerConfig {
            max_concurrent: 0,
            ..FuzzerConfig::default()
        };
        let fuzzer = Fuzzer::with_transport(config, transport.clone());
        let target = parse_target("http://target").unwrap();
        let list: Vec<String> = (0..30).map(|i| format!("w{}", i)).collect();
        let baseline = Baseline {
            status: 200,
            length: 1,
            elapsed: Duration::ZERO,
        };

        let set = fuzzer.fuzz(generate(&target, &list), baseline).await;

        assert_eq!(set.len(), 30);
        assert!(!set.stopped_early);
        assert!(transport.peak.load(Ordering::SeqCst) > 1);
        assert_eq!(fuzzer.state(), FuzzerState::Completed);
    }

    #[tokio::test]
    async fn test_oversized_limit_is_clamped() {
        let transport = Arc::new(FakeTransport::new(&[("/a", 200, 1)]));
        let config = FuzzerConfig {
            max_concurrent: usize::MAX,
            ..FuzzerConfig::default()
        };
        let fuzzer = Fuzzer::with_transport(config, transport);
        let target = parse_target("http://target").unwrap();
        let baseline = Baseline {
            status: 200,
            length: 1,
            elapsed: Duration::ZERO,
        };

        let set = fuzzer.fuzz(generate(&target, &words(&["a"])), baseline).await;
        assert_eq!(set.len(), 1);
    }
}
