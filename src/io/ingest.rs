//! Upload decoding and raw CSV parsing.
//!
//! This module turns the bytes of an uploaded file into a `RawTable`: headers plus
//! string cells, nothing typed yet. Typing and cleaning live in `normalize`.
//!
//! Design goals:
//! - **Fail fast** on uploads that are not text at all
//! - **Row-level validation** (skip bad CSV rows, but report what happened)
//! - **No fitting of meaning here**: headers stay exactly as supplied

use std::fs;
use std::path::Path;

use csv::StringRecord;
use tracing::debug;

use crate::error::{AppError, NormalizeError, ParseError};

/// A file as supplied by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// File name without directory or extension (`prices` for `data/prices.csv`).
    pub fn stem(&self) -> String {
        Path::new(&self.file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "upload".to_string())
    }
}

/// Text encoding the upload was decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Encoding {
    Utf8,
    Latin1,
}

/// One data row as read from the CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line number in the file (header is line 1).
    pub line: usize,
    pub cells: Vec<String>,
}

/// A row the CSV reader could not parse.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub error: ParseError,
}

/// Parsed but untyped upload.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    pub row_errors: Vec<RowError>,
    pub encoding: Encoding,
}

impl RawTable {
    /// Cell by column index; short (flexible) rows read as empty.
    pub fn cell<'a>(&self, row: &'a RawRow, idx: usize) -> &'a str {
        row.cells.get(idx).map(String::as_str).unwrap_or("")
    }
}

/// Read an upload from disk.
pub fn load_upload(path: &Path) -> Result<Upload, AppError> {
    let bytes = fs::read(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Upload { file_name, bytes })
}

/// Decode bytes as UTF-8 (BOM stripped), falling back to Latin-1.
pub fn decode_upload(bytes: &[u8]) -> Result<(String, Encoding), NormalizeError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let (text, encoding) = match std::str::from_utf8(bytes) {
        Ok(s) => (s.to_string(), Encoding::Utf8),
        // Latin-1 maps every byte to the code point of the same value.
        Err(_) => (bytes.iter().map(|&b| char::from(b)).collect(), Encoding::Latin1),
    };

    if text.contains('\0') {
        return Err(NormalizeError::Unreadable(
            "file contains binary data (NUL bytes); expected a text CSV".to_string(),
        ));
    }
    Ok((text, encoding))
}

/// Parse decoded CSV text into a raw table.
pub fn parse_raw_table(text: &str, encoding: Encoding) -> Result<RawTable, NormalizeError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| NormalizeError::Unreadable(format!("failed to read CSV headers: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(NormalizeError::EmptyInput("the file has no header row".to_string()));
    }

    let newlines = newline_offsets(text);
    let mut rows = Vec::new();
    let mut row_errors = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1; only used when the reader has no position.
        let fallback_line = idx + 2;
        match result {
            Ok(record) => {
                // Whitespace-only lines. Rows of empty cells (`,,,`) are kept and
                // rejected later for their missing date.
                if record.len() <= 1 && is_blank(&record) {
                    continue;
                }
                let line = record
                    .position()
                    .map(|p| line_at(text, &newlines, p.byte()))
                    .unwrap_or(fallback_line);
                rows.push(RawRow {
                    line,
                    cells: record.iter().map(str::to_string).collect(),
                });
            }
            Err(e) => {
                let line = e
                    .position()
                    .map(|p| line_at(text, &newlines, p.byte()))
                    .unwrap_or(fallback_line);
                debug!(line, error = %e, "skipping unparseable CSV row");
                row_errors.push(RowError {
                    line,
                    error: ParseError::Csv { message: e.to_string() },
                });
            }
        }
    }

    if rows.is_empty() {
        return Err(NormalizeError::EmptyInput("the file has no data rows".to_string()));
    }

    Ok(RawTable {
        headers,
        rows,
        row_errors,
        encoding,
    })
}

/// Decode and parse an upload in one step.
pub fn read_raw_table(upload: &Upload) -> Result<RawTable, NormalizeError> {
    let (text, encoding) = decode_upload(&upload.bytes)?;
    parse_raw_table(&text, encoding)
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|c| c.trim().is_empty())
}

fn newline_offsets(text: &str) -> Vec<usize> {
    text.bytes()
        .enumerate()
        .filter(|&(_, b)| b == b'\n')
        .map(|(i, _)| i)
        .collect()
}

/// 1-based physical line of a record starting at `byte`.
///
/// The csv reader counts blank lines before a record as part of it, so the start is
/// moved past any line breaks first.
fn line_at(text: &str, newlines: &[usize], byte: u64) -> usize {
    let bytes = text.as_bytes();
    let mut start = usize::try_from(byte).unwrap_or(bytes.len()).min(bytes.len());
    while start < bytes.len() && matches!(bytes[start], b'\r' | b'\n') {
        start += 1;
    }
    1 + newlines.partition_point(|&nl| nl < start)
}
