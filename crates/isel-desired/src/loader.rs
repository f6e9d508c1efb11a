//! Desired-set loader: tabular text in, ordered [`DesiredRow`]s out.
//!
//! ## Column contract (case-sensitive, order-independent, extras ignored)
//!
//! | Column              | Example            |
//! |---------------------|--------------------|
//! | `interface_profile` | `LF1102_INTPROF`   |
//! | `selector_name`     | `ISEL-1.10`        |
//! | `fromPort`          | `10`               |
//! | `toPort`            | `12`               |
//! | `description`       | `esx hosts rack 4` |
//!
//! A missing column fails the whole load. A row with a missing or empty value
//! is kept as [`DesiredRow::Malformed`] so the reconciler reports it in place.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use isel_reconcile::{DesiredRecord, DesiredRow};
use tracing::debug;

use crate::sniff::{sniff_delimiter, Delimiter};

pub const COL_PROFILE: &str = "interface_profile";
pub const COL_SELECTOR: &str = "selector_name";
pub const COL_FROM_PORT: &str = "fromPort";
pub const COL_TO_PORT: &str = "toPort";
pub const COL_DESCRIPTION: &str = "description";

pub const REQUIRED_COLUMNS: [&str; 5] = [
    COL_PROFILE,
    COL_SELECTOR,
    COL_FROM_PORT,
    COL_TO_PORT,
    COL_DESCRIPTION,
];

const UTF8_BOM: char = '\u{feff}';

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Load-level failures. Any of these stops the run before reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    Io(String),
    Encoding(String),
    /// The header row lacks required columns (listed in contract order).
    MissingColumns(Vec<String>),
    Header(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(msg) => write!(f, "desired set io error: {msg}"),
            LoadError::Encoding(msg) => write!(f, "desired set is not valid UTF-8: {msg}"),
            LoadError::MissingColumns(cols) => {
                write!(f, "missing required column(s): {}", cols.join(", "))
            }
            LoadError::Header(msg) => write!(f, "cannot read header row: {msg}"),
        }
    }
}

impl std::error::Error for LoadError {}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Rows of one desired-set source plus the delimiter that was detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredSet {
    pub delimiter: Delimiter,
    pub rows: Vec<DesiredRow>,
}

impl DesiredSet {
    pub fn valid_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_valid()).count()
    }

    pub fn malformed_count(&self) -> usize {
        self.rows.len() - self.valid_count()
    }
}

pub fn load_file(path: &Path) -> Result<DesiredSet, LoadError> {
    let bytes =
        std::fs::read(path).map_err(|e| LoadError::Io(format!("read '{}': {e}", path.display())))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| LoadError::Encoding(format!("'{}': {e}", path.display())))?;
    load_str(&text)
}

/// Parse a desired set from text (BOM tolerated).
pub fn load_str(src: &str) -> Result<DesiredSet, LoadError> {
    let src = src.strip_prefix(UTF8_BOM).unwrap_or(src);
    let delimiter = sniff_delimiter(src);
    debug!(delimiter = delimiter.name(), "desired set delimiter detected");

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(src.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| LoadError::Header(e.to_string()))?
        .clone();
    let columns = ColumnIndex::build(&headers)?;

    let mut rows = Vec::new();
    // Header is line 1.
    let mut fallback_line: usize = 1;

    for rec in rdr.records() {
        fallback_line += 1;
        match rec {
            Ok(rec) => {
                let line = rec
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(fallback_line);
                fallback_line = line;
                if rec.iter().all(str::is_empty) {
                    // Spreadsheet exports pad with rows of bare delimiters.
                    continue;
                }
                rows.push(columns.row_from(&rec, line));
            }
            Err(e) => {
                let line = e
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(fallback_line);
                rows.push(DesiredRow::Malformed {
                    row: line,
                    profile: String::new(),
                    selector_name: String::new(),
                    reason: format!("unreadable row: {e}"),
                });
            }
        }
    }

    Ok(DesiredSet { delimiter, rows })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct ColumnIndex {
    by_name: HashMap<String, usize>,
}

impl ColumnIndex {
    fn build(headers: &csv::StringRecord) -> Result<Self, LoadError> {
        let mut by_name: HashMap<String, usize> = HashMap::new();
        for (i, h) in headers.iter().enumerate() {
            by_name.entry(h.trim().to_string()).or_insert(i);
        }

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !by_name.contains_key(**c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::MissingColumns(missing));
        }
        Ok(Self { by_name })
    }

    fn get<'r>(&self, rec: &'r csv::StringRecord, col: &str) -> &'r str {
        self.by_name
            .get(col)
            .and_then(|i| rec.get(*i))
            .unwrap_or("")
    }

    fn row_from(&self, rec: &csv::StringRecord, line: usize) -> DesiredRow {
        let profile = self.get(rec, COL_PROFILE);
        let selector = self.get(rec, COL_SELECTOR);

        let empty: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| self.get(rec, c).is_empty())
            .collect();
        if !empty.is_empty() {
            let quoted: Vec<String> = empty.iter().map(|c| format!("'{c}'")).collect();
            return DesiredRow::Malformed {
                row: line,
                profile: profile.to_string(),
                selector_name: selector.to_string(),
                reason: format!("missing value for {}", quoted.join(", ")),
            };
        }

        DesiredRow::Valid(DesiredRecord::new(
            profile,
            selector,
            self.get(rec, COL_FROM_PORT),
            self.get(rec, COL_TO_PORT),
            self.get(rec, COL_DESCRIPTION),
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
