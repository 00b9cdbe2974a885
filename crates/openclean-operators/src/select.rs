//! Column projection.

use openclean_core::id::RowId;
use openclean_core::schema::{ColumnRef, Schema};
use openclean_core::types::{Row, Scalar};

use crate::passthrough::PassThrough;
use crate::traits::{Consumer, Lifecycle, OpError, Rewire, RowOutcome};

/// Projects rows onto a list of columns. References are resolved when the
/// stage is opened; the downstream sees the selected columns, in configured
/// order (duplicates allowed).
#[derive(Debug)]
pub struct Select<D = PassThrough> {
    columns: Vec<ColumnRef>,
    positions: Vec<usize>,
    downstream: D,
    state: Lifecycle,
}

impl Select<PassThrough> {
    pub fn new(columns: Vec<ColumnRef>) -> Self {
        Self::chained(columns, PassThrough)
    }
}

impl<D: Consumer> Select<D> {
    pub fn chained(columns: Vec<ColumnRef>, downstream: D) -> Self {
        Self {
            columns,
            positions: Vec::new(),
            downstream,
            state: Lifecycle::Unopened,
        }
    }

    pub fn columns(&self) -> &[ColumnRef] {
        &self.columns
    }
}

impl<D: Consumer> Consumer for Select<D> {
    type Output = D::Output;

    fn name(&self) -> &'static str {
        "select"
    }

    fn open(&mut self, schema: &Schema) -> Result<(), OpError> {
        self.state.open(self.name());
        self.positions = schema.resolve(&self.columns)?;
        let projected = schema.project(&self.positions);
        tracing::trace!(columns = ?projected.names(), "select resolved");
        self.downstream.open(&projected)
    }

    fn consume(&mut self, row_id: RowId, row: Row) -> Result<RowOutcome, OpError> {
        self.state.consuming(self.name());
        let projected = project_row(row_id, &row, &self.positions)?;
        self.downstream.consume(row_id, projected)
    }

    fn close(&mut self) -> Result<D::Output, OpError> {
        self.state.close();
        self.downstream.close()
    }
}

/// Values of `row` at `positions`, in that order.
pub(crate) fn project_row(row_id: RowId, row: &[Scalar], positions: &[usize]) -> Result<Row, OpError> {
    let mut projected = Vec::with_capacity(positions.len());
    for &p in positions {
        match row.get(p) {
            Some(v) => projected.push(v.clone()),
            None => {
                return Err(OpError::Eval(format!(
                    "{row_id} has {} values, column position {p} selected",
                    row.len()
                )))
            }
        }
    }
    Ok(projected)
}

impl<D: Rewire> Rewire for Select<D> {
    type Rewired<N: Consumer> = Select<D::Rewired<N>>;

    fn with_downstream<N: Consumer>(&self, next: N) -> Result<Self::Rewired<N>, OpError> {
        let downstream = self.downstream.with_downstream(next)?;
        Ok(Select::chained(self.columns.clone(), downstream))
    }
}
