//! HTTP response summary

use std::time::Duration;

/// The parts of a response the fuzzer compares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,

    /// Body length in characters of the decoded text
    pub length: usize,

    /// Wall time from send until the body was fully read
    pub elapsed: Duration,
}

impl Response {
    /// Check if response is 404 Not Found
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Signed body length difference against a reference length
    pub fn length_diff(&self, reference: usize) -> i64 {
        self.length as i64 - reference as i64
    }
}
