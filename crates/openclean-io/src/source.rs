//! Row-source contract and the in-memory source.

use std::fmt;

use openclean_core::frame::DataFrame;
use openclean_core::id::RowId;
use openclean_core::schema::Schema;
use openclean_core::types::Row;

use crate::error::{Error, Result};

/// Open iteration over a source. Dropping the reader releases whatever handle
/// it holds, whether the iteration ended normally or not.
pub type RowReader<'a> = Box<dyn Iterator<Item = Result<(RowId, Row)>> + 'a>;

/// A dataset that can be streamed repeatedly.
pub trait RowSource: Send + Sync {
    /// Column schema of the rows produced by `open`.
    fn schema(&self) -> &Schema;

    /// Start a fresh iteration over the rows, in order.
    fn open(&self) -> Result<RowReader<'_>>;
}

impl<S: RowSource + ?Sized> RowSource for std::sync::Arc<S> {
    fn schema(&self) -> &Schema {
        (**self).schema()
    }

    fn open(&self) -> Result<RowReader<'_>> {
        (**self).open()
    }
}

/// Rows held in memory. Mostly for tests and small lookups.
#[derive(Clone, Default)]
pub struct MemorySource {
    schema: Schema,
    rows: Vec<(RowId, Row)>,
}

impl MemorySource {
    /// Source with explicit row identifiers. Rows must match the schema width.
    pub fn new(schema: Schema, rows: Vec<(RowId, Row)>) -> Result<Self> {
        if let Some((id, row)) = rows.iter().find(|(_, r)| r.len() != schema.len()) {
            return Err(Error::Malformed(format!(
                "row {id} has {} values, schema has {} columns",
                row.len(),
                schema.len()
            )));
        }
        Ok(Self { schema, rows })
    }

    /// Source whose row ids are the row positions `0..n`.
    pub fn from_rows(schema: Schema, rows: Vec<Row>) -> Result<Self> {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, r)| (RowId::new(i as u64), r))
            .collect();
        Self::new(schema, rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<DataFrame> for MemorySource {
    fn from(df: DataFrame) -> Self {
        let (schema, index, rows) = df.into_parts();
        Self {
            schema,
            rows: index.into_iter().zip(rows).collect(),
        }
    }
}

impl fmt::Debug for MemorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySource")
            .field("columns", &self.schema.names())
            .field("rows", &self.rows.len())
            .finish()
    }
}

impl RowSource for MemorySource {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn open(&self) -> Result<RowReader<'_>> {
        Ok(Box::new(self.rows.iter().cloned().map(Ok)))
    }
}
