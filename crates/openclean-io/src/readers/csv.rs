//! CSV row source.
//!
//! The header is read once when the source is created. Every `open` starts a
//! new reader on the file; row ids count data rows from zero. Cell values are
//! read as strings.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecordsIntoIter};

use openclean_core::config::PipelineConfig;
use openclean_core::id::RowId;
use openclean_core::schema::Schema;
use openclean_core::types::{Row, Scalar};

use crate::error::{Error, Result};
use crate::source::{RowReader, RowSource};

#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    schema: Schema,
    delimiter: u8,
    has_header: bool,
}

impl CsvSource {
    /// Open a CSV file whose first record is the header. The delimiter is
    /// inferred from the file name.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_config(path, &PipelineConfig::default())
    }

    /// Open a CSV file using delimiter and header settings from `cfg`.
    ///
    /// Files without a header get columns named by their position.
    pub fn with_config<P: AsRef<Path>>(path: P, cfg: &PipelineConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let delimiter = cfg.delimiter_for(&path.to_string_lossy());
        let mut rdr = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_path(&path)?;
        let first = rdr.records().next().transpose()?;
        let schema = match (first, cfg.csv_has_header) {
            (Some(rec), true) => Schema::from_names(rec.iter().map(str::to_string)),
            (Some(rec), false) => Schema::from_names((0..rec.len()).map(|i| i.to_string())),
            (None, _) => Schema::default(),
        };
        tracing::debug!(path = %path.display(), columns = schema.len(), "opened csv source");
        Ok(Self {
            path,
            schema,
            delimiter,
            has_header: cfg.csv_has_header,
        })
    }

    /// CSV file with an explicit header; every record in the file is data.
    pub fn with_header<P: AsRef<Path>>(path: P, schema: Schema, delimiter: u8) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            schema,
            delimiter,
            has_header: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowSource for CsvSource {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn open(&self) -> Result<RowReader<'_>> {
        let rdr = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.has_header)
            .flexible(true)
            .from_path(&self.path)?;
        Ok(Box::new(CsvRows {
            records: rdr.into_records(),
            width: self.schema.len(),
            next_id: 0,
        }))
    }
}

/// Owns the open file; dropping it closes the handle.
struct CsvRows {
    records: StringRecordsIntoIter<File>,
    width: usize,
    next_id: u64,
}

impl Iterator for CsvRows {
    type Item = Result<(RowId, Row)>;

    fn next(&mut self) -> Option<Self::Item> {
        let rec = match self.records.next()? {
            Ok(rec) => rec,
            Err(e) => return Some(Err(Error::Csv(e))),
        };
        let id = RowId::new(self.next_id);
        self.next_id += 1;
        if rec.len() != self.width {
            return Some(Err(Error::Malformed(format!(
                "{id} has {} fields, expected {}",
                rec.len(),
                self.width
            ))));
        }
        let row = rec.iter().map(|v| Scalar::Str(v.to_string())).collect();
        Some(Ok((id, row)))
    }
}
