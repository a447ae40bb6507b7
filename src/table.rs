//! The in-memory dataset.
//!
//! A [`Table`] is loaded once from a CSV file at startup and never mutated
//! afterwards; the server shares it between requests behind an `Arc`.
//!
//! Every field is kept as its literal CSV text. A case-folded copy of each
//! field is computed at load time so that searches don't re-fold the whole
//! table on every query.

use anyhow::{bail, Context, Result};
use std::io::Read;
use std::path::Path;

/// Context-free case fold used on both fields and queries.
///
/// Lowercases char by char, so the result never depends on a letter's
/// position in a word, and maps final sigma `ς` onto `σ`.
pub fn fold_case(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c == 'ς' { 'σ' } else { c })
        .collect()
}

/// One data record: the original field text plus its case-folded form.
#[derive(Debug, Clone)]
pub struct Row {
    fields: Vec<String>,
    folded: Vec<String>,
}

impl Row {
    pub fn new(fields: Vec<String>) -> Self {
        let folded = fields.iter().map(|f| fold_case(f)).collect();
        Self { fields, folded }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// [`fold_case`]d copies of [`fields`](Row::fields), same order.
    pub fn folded(&self) -> &[String] {
        &self.folded
    }
}

/// Immutable rows × columns dataset.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            headers,
            rows: rows.into_iter().map(Row::new).collect(),
        }
    }

    /// Load a CSV file whose first record is the header row.
    pub fn load(path: &Path, delimiter: u8) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open dataset: {}", path.display()))?;
        Self::from_reader(file, delimiter)
            .with_context(|| format!("Failed to load dataset: {}", path.display()))
    }

    /// Parse CSV from any reader. Rows with a different field count than
    /// the header are rejected.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .context("Failed to read header row")?
            .iter()
            .map(|h| h.to_string())
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            bail!("dataset has no header row");
        }

        let mut rows = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            // +2: one for the header, one for 1-based line numbers
            let record = record.with_context(|| format!("Malformed record at line {}", i + 2))?;
            rows.push(Row::new(record.iter().map(|f| f.to_string()).collect()));
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
