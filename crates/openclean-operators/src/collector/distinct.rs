use openclean_core::counter::{Counter, DistinctKey};
use openclean_core::id::RowId;
use openclean_core::schema::{ColumnRef, Schema};
use openclean_core::types::Row;

use crate::collector::terminal_rewire;
use crate::traits::{Consumer, Lifecycle, OpError, RowOutcome};

/// Frequency count of distinct rows.
///
/// Unary rows are keyed by their value, wider rows by the ordered tuple of
/// their values. With [`Distinct::on`] only the listed columns form the key.
#[derive(Debug, Default)]
pub struct Distinct {
    columns: Option<Vec<ColumnRef>>,
    positions: Option<Vec<usize>>,
    counter: Counter,
    state: Lifecycle,
}

impl Distinct {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count combinations of the given columns only.
    pub fn on(columns: Vec<ColumnRef>) -> Self {
        Self {
            columns: Some(columns),
            ..Self::default()
        }
    }
}

impl Consumer for Distinct {
    type Output = Counter;

    fn name(&self) -> &'static str {
        "distinct"
    }

    fn open(&mut self, schema: &Schema) -> Result<(), OpError> {
        self.state.open(self.name());
        self.positions = match &self.columns {
            Some(cols) => Some(schema.resolve(cols)?),
            None => None,
        };
        self.counter = Counter::new();
        Ok(())
    }

    fn consume(&mut self, row_id: RowId, row: Row) -> Result<RowOutcome, OpError> {
        self.state.consuming(self.name());
        let values = match &self.positions {
            None => row,
            Some(positions) => positions
                .iter()
                .map(|&p| {
                    row.get(p).cloned().ok_or_else(|| {
                        OpError::Eval(format!("{row_id} has no value at column position {p}"))
                    })
                })
                .collect::<Result<_, _>>()?,
        };
        self.counter.increment(DistinctKey::from_values(values));
        Ok(RowOutcome::Drop)
    }

    /// The counter stays in place, so closing again yields an equal map.
    fn close(&mut self) -> Result<Counter, OpError> {
        self.state.close();
        Ok(self.counter.clone())
    }
}

terminal_rewire!(Distinct);
