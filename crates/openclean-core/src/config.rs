//! Pipeline configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

/// Default number of rows returned by `head` when no count is given.
pub const DEFAULT_HEAD_ROWS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Rows returned by `head` when the caller does not pass a count.
    pub head_rows: usize,

    /// Field delimiter for CSV sources and writers. `None` infers it from the
    /// file name (`.tsv` → tab, everything else → comma).
    pub csv_delimiter: Option<u8>,

    /// Whether CSV sources carry a header row.
    pub csv_has_header: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            head_rows: DEFAULT_HEAD_ROWS,
            csv_delimiter: None,
            csv_has_header: true,
        }
    }
}

impl PipelineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `OPENCLEAN_HEAD_ROWS`: default row count for `head`
    /// - `OPENCLEAN_CSV_DELIMITER`: single-byte CSV delimiter (`\t` accepted)
    /// - `OPENCLEAN_CSV_HAS_HEADER`: `true`/`false`
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("OPENCLEAN_HEAD_ROWS") {
            match s.parse::<usize>() {
                Ok(v) => cfg.head_rows = v,
                Err(_) => tracing::warn!(value = %s, "ignoring invalid OPENCLEAN_HEAD_ROWS"),
            }
        }

        if let Ok(s) = std::env::var("OPENCLEAN_CSV_DELIMITER") {
            match parse_delimiter(&s) {
                Some(d) => cfg.csv_delimiter = Some(d),
                None => tracing::warn!(value = %s, "ignoring invalid OPENCLEAN_CSV_DELIMITER"),
            }
        }

        if let Ok(s) = std::env::var("OPENCLEAN_CSV_HAS_HEADER") {
            match s.parse::<bool>() {
                Ok(v) => cfg.csv_has_header = v,
                Err(_) => tracing::warn!(value = %s, "ignoring invalid OPENCLEAN_CSV_HAS_HEADER"),
            }
        }

        cfg
    }

    /// Delimiter for a given file name, honoring an explicit setting first.
    pub fn delimiter_for(&self, filename: &str) -> u8 {
        self.csv_delimiter.unwrap_or_else(|| {
            if filename.ends_with(".tsv") || filename.ends_with(".tsv.gz") {
                b'\t'
            } else {
                b','
            }
        })
    }
}

/// Parse a delimiter given as a single byte or the escape `\t`.
pub fn parse_delimiter(s: &str) -> Option<u8> {
    match s {
        "\\t" | "\t" | "tab" => Some(b'\t'),
        _ if s.len() == 1 => s.bytes().next(),
        _ => None,
    }
}
