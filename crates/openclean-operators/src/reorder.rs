//! Moving columns to a new position.

use openclean_core::id::RowId;
use openclean_core::schema::{ColumnRef, Schema};
use openclean_core::types::Row;

use crate::passthrough::PassThrough;
use crate::select::project_row;
use crate::traits::{Consumer, Lifecycle, OpError, Rewire, RowOutcome};

/// Moves a group of columns, in the given order, so that the first of them
/// lands at `pos` among the remaining columns. Without a position the group
/// goes to the end.
#[derive(Debug)]
pub struct MoveColumns<D = PassThrough> {
    columns: Vec<ColumnRef>,
    pos: Option<usize>,
    positions: Vec<usize>,
    downstream: D,
    state: Lifecycle,
}

impl MoveColumns<PassThrough> {
    pub fn new(columns: Vec<ColumnRef>, pos: Option<usize>) -> Self {
        Self::chained(columns, pos, PassThrough)
    }
}

impl<D: Consumer> MoveColumns<D> {
    pub fn chained(columns: Vec<ColumnRef>, pos: Option<usize>, downstream: D) -> Self {
        Self {
            columns,
            pos,
            positions: Vec::new(),
            downstream,
            state: Lifecycle::Unopened,
        }
    }
}

/// Column order after the move, as positions into `schema`.
///
/// `pos` may range over `0..=schema.len()`; a position past the remaining
/// columns appends.
pub fn moved_order(
    schema: &Schema,
    columns: &[ColumnRef],
    pos: Option<usize>,
) -> Result<Vec<usize>, OpError> {
    let width = schema.len();
    if let Some(p) = pos {
        if p > width {
            return Err(OpError::Schema(format!(
                "cannot move columns to position {p} of {width} columns"
            )));
        }
    }
    let moved = schema.resolve(columns)?;
    for (i, p) in moved.iter().enumerate() {
        if moved[..i].contains(p) {
            return Err(OpError::Schema(format!(
                "column '{}' listed twice in move",
                schema.columns[*p].name
            )));
        }
    }
    let mut order: Vec<usize> = (0..width).filter(|p| !moved.contains(p)).collect();
    match pos {
        Some(p) if p < order.len() => {
            let tail = order.split_off(p);
            order.extend(moved);
            order.extend(tail);
        }
        _ => order.extend(moved),
    }
    Ok(order)
}

impl<D: Consumer> Consumer for MoveColumns<D> {
    type Output = D::Output;

    fn name(&self) -> &'static str {
        "move"
    }

    fn open(&mut self, schema: &Schema) -> Result<(), OpError> {
        self.state.open(self.name());
        self.positions = moved_order(schema, &self.columns, self.pos)?;
        self.downstream.open(&schema.project(&self.positions))
    }

    fn consume(&mut self, row_id: RowId, row: Row) -> Result<RowOutcome, OpError> {
        self.state.consuming(self.name());
        let moved = project_row(row_id, &row, &self.positions)?;
        self.downstream.consume(row_id, moved)
    }

    fn close(&mut self) -> Result<D::Output, OpError> {
        self.state.close();
        self.downstream.close()
    }
}

impl<D: Rewire> Rewire for MoveColumns<D> {
    type Rewired<N: Consumer> = MoveColumns<D::Rewired<N>>;

    fn with_downstream<N: Consumer>(&self, next: N) -> Result<Self::Rewired<N>, OpError> {
        let downstream = self.downstream.with_downstream(next)?;
        Ok(MoveColumns::chained(self.columns.clone(), self.pos, downstream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openclean_core::schema::refs;
    use openclean_core::types::row;

    fn schema() -> Schema {
        Schema::from_names(["a", "b", "c", "d"])
    }

    #[test]
    fn order_for_inner_and_trailing_positions() {
        let s = schema();
        assert_eq!(moved_order(&s, &refs(["d"]), Some(0)).unwrap(), vec![3, 0, 1, 2]);
        assert_eq!(moved_order(&s, &refs(["a", "c"]), Some(1)).unwrap(), vec![1, 0, 2, 3]);
        // past the remaining columns appends
        assert_eq!(moved_order(&s, &refs(["a"]), Some(4)).unwrap(), vec![1, 2, 3, 0]);
        assert_eq!(moved_order(&s, &refs(["b"]), None).unwrap(), vec![0, 2, 3, 1]);
    }

    #[test]
    fn position_beyond_width_fails() {
        let err = moved_order(&schema(), &refs(["a"]), Some(5)).unwrap_err();
        assert!(matches!(err, OpError::Schema(_)));
        assert!(moved_order(&schema(), &refs(["a", "a"]), None).is_err());
    }

    #[test]
    fn rows_follow_the_new_order() {
        let mut m = MoveColumns::new(refs(["c"]), Some(0));
        m.open(&schema()).unwrap();
        let out = m.consume(RowId::new(0), row([1i64, 2, 3, 4])).unwrap();
        assert_eq!(out, RowOutcome::Forward(row([3i64, 1, 2, 4])));
    }
}
