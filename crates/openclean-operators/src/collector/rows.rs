use openclean_core::id::RowId;
use openclean_core::schema::Schema;
use openclean_core::types::Row;

use crate::collector::terminal_rewire;
use crate::traits::{Consumer, Lifecycle, OpError, RowOutcome};

/// Collects `(row_id, row)` pairs in arrival order.
#[derive(Debug, Default)]
pub struct Collector {
    rows: Vec<(RowId, Row)>,
    state: Lifecycle,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Consumer for Collector {
    type Output = Vec<(RowId, Row)>;

    fn name(&self) -> &'static str {
        "collector"
    }

    fn open(&mut self, _schema: &Schema) -> Result<(), OpError> {
        self.state.open(self.name());
        self.rows.clear();
        Ok(())
    }

    fn consume(&mut self, row_id: RowId, row: Row) -> Result<RowOutcome, OpError> {
        self.state.consuming(self.name());
        self.rows.push((row_id, row));
        Ok(RowOutcome::Drop)
    }

    fn close(&mut self) -> Result<Self::Output, OpError> {
        self.state.close();
        Ok(std::mem::take(&mut self.rows))
    }
}

terminal_rewire!(Collector);
