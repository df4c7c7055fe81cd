//! Headerless CSV input with positional, best-effort field coercion
//!
//! Columns are addressed by position to match the upstream extract schema.
//! A missing column reads as the empty string. Numeric and date columns that
//! fail to parse are logged and fall back to their zero value; they never
//! abort the row.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv_async::{AsyncReader, AsyncReaderBuilder, StringRecord};
use tokio::fs::File;
use tracing::warn;

use crate::error::{IngestError, Result};

/// Date format of publication dates in the extracts
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Streaming reader over one extract file
pub struct CsvRows {
    path: PathBuf,
    reader: AsyncReader<File>,
    record: StringRecord,
    line: u64,
}

impl CsvRows {
    /// Open `path`; failure to open is reported as [`IngestError::FileOpen`]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)
            .await
            .map_err(|source| IngestError::FileOpen {
                path: path.clone(),
                source,
            })?;

        let reader = AsyncReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .create_reader(file);

        Ok(Self {
            path,
            reader,
            record: StringRecord::new(),
            line: 0,
        })
    }

    /// Next row, or `None` at end of file
    pub async fn next_row(&mut self) -> Result<Option<Row<'_>>> {
        let more = self
            .reader
            .read_record(&mut self.record)
            .await
            .map_err(|source| IngestError::Read {
                path: self.path.clone(),
                source,
            })?;

        if !more {
            return Ok(None);
        }
        self.line += 1;
        Ok(Some(Row {
            record: &self.record,
            file: &self.path,
            line: self.line,
        }))
    }
}

/// One CSV row with lenient typed accessors
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    record: &'a StringRecord,
    file: &'a Path,
    line: u64,
}

impl<'a> Row<'a> {
    #[cfg(test)]
    pub(crate) fn for_test(record: &'a StringRecord, file: &'a Path) -> Self {
        Self {
            record,
            file,
            line: 1,
        }
    }

    pub fn line(&self) -> u64 {
        self.line
    }

    /// Trimmed text at `col`, empty when the column is missing
    pub fn text(&self, col: usize) -> &'a str {
        self.record.get(col).map(str::trim).unwrap_or("")
    }

    pub fn f32(&self, col: usize, field: &str) -> f32 {
        self.parse_or_default(col, field)
    }

    pub fn i32(&self, col: usize, field: &str) -> i32 {
        self.parse_or_default(col, field)
    }

    pub fn u32(&self, col: usize, field: &str) -> u32 {
        self.parse_or_default(col, field)
    }

    /// Like [`Row::u32`] but an empty column is silently zero.
    ///
    /// Optional codes (derivation, data points) are routinely blank.
    pub fn optional_u32(&self, col: usize, field: &str) -> u32 {
        if self.text(col).is_empty() {
            0
        } else {
            self.u32(col, field)
        }
    }

    pub fn optional_i32(&self, col: usize, field: &str) -> i32 {
        if self.text(col).is_empty() {
            0
        } else {
            self.i32(col, field)
        }
    }

    pub fn optional_f32(&self, col: usize, field: &str) -> f32 {
        if self.text(col).is_empty() {
            0.0
        } else {
            self.f32(col, field)
        }
    }

    /// `YYYY-MM-DD` date; `None` (the zero value) when unparseable
    pub fn date(&self, col: usize, field: &str) -> Option<NaiveDate> {
        let raw = self.text(col);
        match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(e) => {
                warn!(
                    file = %self.file.display(),
                    line = self.line,
                    field,
                    raw,
                    error = %e,
                    "Unparseable date, leaving empty"
                );
                None
            },
        }
    }

    fn parse_or_default<T>(&self, col: usize, field: &str) -> T
    where
        T: std::str::FromStr + Default,
    {
        let raw = self.text(col);
        match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                warn!(
                    file = %self.file.display(),
                    line = self.line,
                    field,
                    raw,
                    "Unparseable number, defaulting to 0"
                );
                T::default()
            },
        }
    }
}
