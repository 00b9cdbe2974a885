use serde::{Deserialize, Serialize};

use openclean_core::id::RowId;
use openclean_core::schema::Schema;
use openclean_core::types::Row;
use openclean_io::writers::RowWriter;

use crate::collector::terminal_rewire;
use crate::traits::{Consumer, Lifecycle, OpError, RowOutcome};

/// Result of a [`Write`] terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSummary {
    pub rows: u64,
}

/// Streams rows into a [`RowWriter`]: the schema becomes the header record
/// and every row is written as received.
#[derive(Debug)]
pub struct Write<W: RowWriter> {
    writer: W,
    rows: u64,
    state: Lifecycle,
}

impl<W: RowWriter> Write<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            rows: 0,
            state: Lifecycle::Unopened,
        }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<W: RowWriter> Consumer for Write<W> {
    type Output = WriteSummary;

    fn name(&self) -> &'static str {
        "write"
    }

    fn open(&mut self, schema: &Schema) -> Result<(), OpError> {
        self.state.open(self.name());
        self.rows = 0;
        self.writer.write_header(schema)?;
        Ok(())
    }

    fn consume(&mut self, _row_id: RowId, row: Row) -> Result<RowOutcome, OpError> {
        self.state.consuming(self.name());
        self.writer.write_row(&row)?;
        self.rows += 1;
        Ok(RowOutcome::Drop)
    }

    fn close(&mut self) -> Result<WriteSummary, OpError> {
        self.state.close();
        self.writer.finish()?;
        tracing::debug!(rows = self.rows, "writer finished");
        Ok(WriteSummary { rows: self.rows })
    }
}

terminal_rewire!(Write<W>, W: RowWriter);
