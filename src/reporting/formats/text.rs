//! Plain text report generator
//!
//! Four lines per result, newline-joined, no trailing newline:
//!
//! ```text
//! URL: http://example.com/admin
//! Status Code: 200
//! Length Difference: 20
//! --------------------
//! ```

use crate::reporting::Report;

/// Separator line closing every result block
pub const SEPARATOR: &str = "--------------------";

/// Generate text report
pub fn generate(report: &Report) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(report.results.len() * 4);

    for result in &report.results {
        lines.push(format!("URL: {}", result.url));
        lines.push(format!("Status Code: {}", result.status_code));
        lines.push(format!("Length Difference: {}", result.length_diff));
        lines.push(SEPARATOR.to_string());
    }

    lines.join("\n")
}
