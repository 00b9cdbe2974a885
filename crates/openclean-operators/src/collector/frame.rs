use openclean_core::frame::DataFrame;
use openclean_core::id::RowId;
use openclean_core::schema::Schema;
use openclean_core::types::Row;

use crate::collector::terminal_rewire;
use crate::traits::{Consumer, Lifecycle, OpError, RowOutcome};

/// Buffers rows and assembles a [`DataFrame`] on close. Row ids become the
/// frame index.
#[derive(Debug, Default)]
pub struct DataFrameBuilder {
    schema: Schema,
    index: Vec<RowId>,
    rows: Vec<Row>,
    state: Lifecycle,
}

impl DataFrameBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Consumer for DataFrameBuilder {
    type Output = DataFrame;

    fn name(&self) -> &'static str {
        "dataframe"
    }

    fn open(&mut self, schema: &Schema) -> Result<(), OpError> {
        self.state.open(self.name());
        self.schema = schema.clone();
        self.index.clear();
        self.rows.clear();
        Ok(())
    }

    fn consume(&mut self, row_id: RowId, row: Row) -> Result<RowOutcome, OpError> {
        self.state.consuming(self.name());
        self.index.push(row_id);
        self.rows.push(row);
        Ok(RowOutcome::Drop)
    }

    fn close(&mut self) -> Result<DataFrame, OpError> {
        self.state.close();
        let df = DataFrame::new(
            self.schema.clone(),
            std::mem::take(&mut self.index),
            std::mem::take(&mut self.rows),
        )?;
        Ok(df)
    }
}

terminal_rewire!(DataFrameBuilder);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Rewire;
    use crate::Collector;
    use openclean_core::types::row;

    #[test]
    fn index_preserves_row_ids() {
        let mut b = DataFrameBuilder::new();
        b.open(&Schema::from_names(["city", "borough"])).unwrap();
        b.consume(RowId::new(4), row(["NY", "NY"])).unwrap();
        b.consume(RowId::new(9), row(["LA", "CA"])).unwrap();
        let df = b.close().unwrap();
        assert_eq!(df.shape(), (2, 2));
        assert_eq!(df.index(), &[RowId::new(4), RowId::new(9)]);
    }

    #[test]
    fn rows_not_matching_the_schema_fail_on_close() {
        let mut b = DataFrameBuilder::new();
        b.open(&Schema::from_names(["a", "b"])).unwrap();
        b.consume(RowId::new(0), row(["x"])).unwrap();
        assert!(matches!(b.close(), Err(OpError::Invariant(_))));
    }

    #[test]
    fn refuses_a_downstream() {
        let err = DataFrameBuilder::new()
            .with_downstream(Collector::new())
            .unwrap_err();
        assert!(matches!(err, OpError::IllegalDownstream("dataframe")));
    }
}
