//! Wordlist loading for path-segment fuzzing

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::error::ResourceError;

/// An ordered list of candidate path segments
///
/// Entries are trimmed but otherwise kept as-is: duplicates are fuzzed
/// independently and blank lines stay as empty entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wordlist {
    /// Name of the wordlist (file name when loaded from disk)
    pub name: String,
    /// Entries in load order
    pub entries: Vec<String>,
}

impl Wordlist {
    /// Create a wordlist from already-loaded entries
    pub fn new(name: &str, entries: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            entries,
        }
    }

    /// Load entries from a wordlist file
    pub fn from_file(path: &Path) -> Result<Self, ResourceError> {
        let read_error = |source| ResourceError::WordlistRead {
            path: path.display().to_string(),
            source,
        };

        let file = File::open(path).map_err(read_error)?;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("wordlist");

        let wordlist = Self::from_reader(name, BufReader::new(file)).map_err(read_error)?;

        tracing::info!(
            path = %path.display(),
            entries = wordlist.len(),
            "Loaded wordlist"
        );

        Ok(wordlist)
    }

    /// Read one entry per line, stripping surrounding whitespace
    pub fn from_reader<R: BufRead>(name: &str, reader: R) -> io::Result<Self> {
        let entries = reader
            .lines()
            .map(|line| line.map(|l| l.trim().to_string()))
            .collect::<io::Result<Vec<String>>>()?;

        Ok(Self::new(name, entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
