//! Streaming row writers.

pub mod csv;
pub mod jsonl;

use openclean_core::schema::Schema;
use openclean_core::types::Scalar;

use crate::error::Result;

/// Sink for the rows of a data stream.
///
/// The header is written once, before any row. `finish` flushes buffered
/// output; writers are not used after it.
pub trait RowWriter {
    fn write_header(&mut self, schema: &Schema) -> Result<()>;

    fn write_row(&mut self, row: &[Scalar]) -> Result<()>;

    fn finish(&mut self) -> Result<()>;
}

impl<W: RowWriter + ?Sized> RowWriter for Box<W> {
    fn write_header(&mut self, schema: &Schema) -> Result<()> {
        (**self).write_header(schema)
    }

    fn write_row(&mut self, row: &[Scalar]) -> Result<()> {
        (**self).write_row(row)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}
