//! Column renaming.

use openclean_core::id::RowId;
use openclean_core::schema::{ColumnRef, Schema};
use openclean_core::types::Row;

use crate::passthrough::PassThrough;
use crate::traits::{Consumer, Lifecycle, OpError, Rewire, RowOutcome};

/// Gives new names to some columns. Rows pass through untouched; only the
/// schema seen downstream changes. Renamed columns keep their ids.
#[derive(Debug)]
pub struct Rename<D = PassThrough> {
    columns: Vec<ColumnRef>,
    names: Vec<String>,
    downstream: D,
    state: Lifecycle,
}

impl Rename<PassThrough> {
    pub fn new(columns: Vec<ColumnRef>, names: Vec<String>) -> Self {
        Self::chained(columns, names, PassThrough)
    }
}

impl<D: Consumer> Rename<D> {
    pub fn chained(columns: Vec<ColumnRef>, names: Vec<String>, downstream: D) -> Self {
        Self {
            columns,
            names,
            downstream,
            state: Lifecycle::Unopened,
        }
    }
}

/// `schema` with the columns behind `columns` renamed pairwise to `names`.
pub fn renamed_schema(
    schema: &Schema,
    columns: &[ColumnRef],
    names: &[String],
) -> Result<Schema, OpError> {
    if columns.len() != names.len() {
        return Err(OpError::Schema(format!(
            "rename got {} columns but {} names",
            columns.len(),
            names.len()
        )));
    }
    let positions = schema.resolve(columns)?;
    let mut out = schema.clone();
    for (p, name) in positions.into_iter().zip(names) {
        out.columns[p].name = name.clone();
    }
    Ok(out)
}

impl<D: Consumer> Consumer for Rename<D> {
    type Output = D::Output;

    fn name(&self) -> &'static str {
        "rename"
    }

    fn open(&mut self, schema: &Schema) -> Result<(), OpError> {
        self.state.open(self.name());
        let renamed = renamed_schema(schema, &self.columns, &self.names)?;
        tracing::trace!(columns = ?renamed.names(), "rename resolved");
        self.downstream.open(&renamed)
    }

    fn consume(&mut self, row_id: RowId, row: Row) -> Result<RowOutcome, OpError> {
        self.state.consuming(self.name());
        self.downstream.consume(row_id, row)
    }

    fn close(&mut self) -> Result<D::Output, OpError> {
        self.state.close();
        self.downstream.close()
    }
}

impl<D: Rewire> Rewire for Rename<D> {
    type Rewired<N: Consumer> = Rename<D::Rewired<N>>;

    fn with_downstream<N: Consumer>(&self, next: N) -> Result<Self::Rewired<N>, OpError> {
        let downstream = self.downstream.with_downstream(next)?;
        Ok(Rename::chained(
            self.columns.clone(),
            self.names.clone(),
            downstream,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::DataFrameBuilder;
    use openclean_core::id::ColumnId;
    use openclean_core::schema::refs;
    use openclean_core::types::row;

    #[test]
    fn renames_by_reference_and_keeps_ids() {
        let schema = Schema::from_names(["name", "age", "city"]);
        let mut r = Rename::chained(
            vec![ColumnRef::from("city"), ColumnRef::from(0usize)],
            vec!["town".into(), "who".into()],
            DataFrameBuilder::new(),
        );
        r.open(&schema).unwrap();
        r.consume(RowId::new(0), row(["Ann", "40", "NY"])).unwrap();
        let df = r.close().unwrap();
        assert_eq!(df.schema().names(), vec!["who", "age", "town"]);
        assert_eq!(df.schema().columns[2].id, ColumnId::new(2));
        assert_eq!(df.rows()[0], row(["Ann", "40", "NY"]));
    }

    #[test]
    fn mismatched_name_count_fails_on_open() {
        let mut r = Rename::new(refs(["name", "age"]), vec!["n".into()]);
        let err = r.open(&Schema::from_names(["name", "age"])).unwrap_err();
        assert!(matches!(err, OpError::Schema(_)));
    }
}
