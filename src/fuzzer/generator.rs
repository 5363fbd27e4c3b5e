//! Candidate URL generation by path-segment injection

use std::fmt;

use url::Url;

use crate::error::ConfigError;

/// A URL with one word spliced into the target's path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateUrl {
    /// Full URL to request (no query, no fragment)
    pub url: Url,
    /// Injected word
    pub word: String,
    /// Segment index the word was inserted at
    pub position: usize,
}

impl fmt::Display for CandidateUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Parse and validate the fuzzing target
pub fn parse_target(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid("missing host"));
    }

    Ok(url)
}

/// Non-empty `/`-delimited segments of the URL path
pub fn path_segments(url: &Url) -> Vec<&str> {
    url.path().split('/').filter(|s| !s.is_empty()).collect()
}

/// Number of candidates `generate` yields for `word_count` words
pub fn candidate_count(base: &Url, word_count: usize) -> usize {
    word_count * (path_segments(base).len() + 1)
}

/// Expand the base URL into every (word, position) candidate
///
/// Word-major, position-minor. Query and fragment are dropped from every
/// candidate.
pub fn generate(base: &Url, words: &[String]) -> Vec<CandidateUrl> {
    let segments = path_segments(base);
    let mut candidates = Vec::with_capacity(words.len() * (segments.len() + 1));

    let mut template = base.clone();
    template.set_query(None);
    template.set_fragment(None);

    for word in words {
        for position in 0..=segments.len() {
            let mut parts: Vec<&str> = Vec::with_capacity(segments.len() + 1);
            parts.extend_from_slice(&segments[..position]);
            parts.push(word.as_str());
            parts.extend_from_slice(&segments[position..]);

            let mut url = template.clone();
            url.set_path(&format!("/{}", parts.join("/")));

            candidates.push(CandidateUrl {
                url,
                word: word.clone(),
                position,
            });
        }
    }

    candidates
}
