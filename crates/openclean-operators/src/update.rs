//! In-place column updates.

use std::fmt;
use std::sync::Arc;

use openclean_core::id::RowId;
use openclean_core::schema::{ColumnRef, Schema};
use openclean_core::types::Row;

use crate::eval::{PreparedFunction, RowFunction};
use crate::passthrough::PassThrough;
use crate::traits::{Consumer, Lifecycle, OpError, Rewire, RowOutcome};

/// Replaces the values of the target columns with the output of a row
/// function. The schema is unchanged.
pub struct Update<D = PassThrough> {
    columns: Vec<ColumnRef>,
    func: Arc<dyn RowFunction>,
    targets: Vec<usize>,
    prepared: Option<Box<dyn PreparedFunction>>,
    downstream: D,
    state: Lifecycle,
}

impl Update<PassThrough> {
    pub fn new(columns: Vec<ColumnRef>, func: Arc<dyn RowFunction>) -> Self {
        Self::chained(columns, func, PassThrough)
    }
}

impl<D: Consumer> Update<D> {
    pub fn chained(columns: Vec<ColumnRef>, func: Arc<dyn RowFunction>, downstream: D) -> Self {
        Self {
            columns,
            func,
            targets: Vec::new(),
            prepared: None,
            downstream,
            state: Lifecycle::Unopened,
        }
    }
}

impl<D: fmt::Debug> fmt::Debug for Update<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Update")
            .field("columns", &self.columns)
            .field("func", &self.func)
            .field("downstream", &self.downstream)
            .finish()
    }
}

impl<D: Consumer> Consumer for Update<D> {
    type Output = D::Output;

    fn name(&self) -> &'static str {
        "update"
    }

    fn open(&mut self, schema: &Schema) -> Result<(), OpError> {
        self.state.open(self.name());
        self.targets = schema.resolve(&self.columns)?;
        self.prepared = Some(self.func.prepare(schema, &self.targets)?);
        self.downstream.open(schema)
    }

    fn consume(&mut self, row_id: RowId, mut row: Row) -> Result<RowOutcome, OpError> {
        self.state.consuming(self.name());
        let func = self
            .prepared
            .as_ref()
            .ok_or_else(|| OpError::Invariant("update consumed a row before open".into()))?;
        let values = func.eval(&row)?;
        if values.len() != self.targets.len() {
            return Err(OpError::Eval(format!(
                "expected {} values instead of {}",
                self.targets.len(),
                values.len()
            )));
        }
        for (&p, v) in self.targets.iter().zip(values) {
            match row.get_mut(p) {
                Some(slot) => *slot = v,
                None => {
                    return Err(OpError::Eval(format!(
                        "{row_id} has no value at column position {p}"
                    )))
                }
            }
        }
        self.downstream.consume(row_id, row)
    }

    fn close(&mut self) -> Result<D::Output, OpError> {
        self.state.close();
        self.downstream.close()
    }
}

impl<D: Rewire> Rewire for Update<D> {
    type Rewired<N: Consumer> = Update<D::Rewired<N>>;

    fn with_downstream<N: Consumer>(&self, next: N) -> Result<Self::Rewired<N>, OpError> {
        let downstream = self.downstream.with_downstream(next)?;
        Ok(Update::chained(
            self.columns.clone(),
            self.func.clone(),
            downstream,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{FnFunction, StrTransform};
    use openclean_core::schema::refs;
    use openclean_core::types::{row, Scalar};

    #[test]
    fn rewrites_only_target_columns() {
        let mut u = Update::new(refs(["city"]), Arc::new(StrTransform::Upper));
        u.open(&Schema::from_names(["name", "city"])).unwrap();
        let out = u.consume(RowId::new(0), row(["ann", "ny"])).unwrap();
        assert_eq!(out, RowOutcome::Forward(row(["ann", "NY"])));
    }

    #[test]
    fn value_count_must_match_targets() {
        let two = FnFunction::new("two", |_: &[Scalar]| Ok(row(["a", "b"])));
        let mut u = Update::new(refs(["name"]), Arc::new(two));
        u.open(&Schema::from_names(["name", "city"])).unwrap();
        let err = u.consume(RowId::new(0), row(["ann", "ny"])).unwrap_err();
        assert_eq!(err.to_string(), "evaluation error: expected 1 values instead of 2");
    }

    #[test]
    fn unknown_target_fails_on_open() {
        let mut u = Update::new(refs(["zip"]), Arc::new(StrTransform::Trim));
        assert!(matches!(
            u.open(&Schema::from_names(["name"])),
            Err(OpError::Schema(_))
        ));
    }
}
