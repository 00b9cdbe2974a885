use openclean_core::id::RowId;
use openclean_core::schema::Schema;
use openclean_core::types::Row;

use crate::collector::terminal_rewire;
use crate::traits::{Consumer, Lifecycle, OpError, RowOutcome};

/// Counts the rows that reach the end of the chain.
#[derive(Debug, Default)]
pub struct RowCount {
    rows: u64,
    state: Lifecycle,
}

impl RowCount {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Consumer for RowCount {
    type Output = u64;

    fn name(&self) -> &'static str {
        "count"
    }

    fn open(&mut self, _schema: &Schema) -> Result<(), OpError> {
        self.state.open(self.name());
        self.rows = 0;
        Ok(())
    }

    fn consume(&mut self, _row_id: RowId, _row: Row) -> Result<RowOutcome, OpError> {
        self.state.consuming(self.name());
        self.rows += 1;
        Ok(RowOutcome::Drop)
    }

    fn close(&mut self) -> Result<u64, OpError> {
        self.state.close();
        Ok(self.rows)
    }
}

terminal_rewire!(RowCount);
