//! Tabular result materialized at the end of a stream.
//!
//! A `DataFrame` is row-oriented: the schema, the rows in stream order, and the
//! row identifiers of those rows as the index.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::id::RowId;
use crate::schema::{ColumnRef, Schema};
use crate::types::{Row, Scalar};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFrame {
    schema: Schema,
    index: Vec<RowId>,
    rows: Vec<Row>,
}

impl DataFrame {
    /// Assemble a frame. Every row must match the schema width and the index
    /// must have one entry per row.
    pub fn new(schema: Schema, index: Vec<RowId>, rows: Vec<Row>) -> Result<Self> {
        if index.len() != rows.len() {
            return Err(Error::Invariant(format!(
                "index has {} entries for {} rows",
                index.len(),
                rows.len()
            )));
        }
        if let Some((pos, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != schema.len())
        {
            return Err(Error::Invariant(format!(
                "row {} has {} values, schema has {} columns",
                index[pos],
                row.len(),
                schema.len()
            )));
        }
        Ok(Self {
            schema,
            index,
            rows,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn index(&self) -> &[RowId] {
        &self.index
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.schema.len())
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, in row order.
    pub fn column(&self, col: &ColumnRef) -> Result<Vec<&Scalar>> {
        let pos = self.schema.position(col)?;
        Ok(self.rows.iter().map(|r| &r[pos]).collect())
    }

    /// `(row_id, row)` pairs in stream order.
    pub fn iterrows(&self) -> impl Iterator<Item = (RowId, &Row)> {
        self.index.iter().copied().zip(self.rows.iter())
    }

    /// Row stored under a given identifier.
    pub fn loc(&self, row_id: RowId) -> Option<&Row> {
        self.index
            .iter()
            .position(|id| *id == row_id)
            .map(|pos| &self.rows[pos])
    }

    pub fn into_parts(self) -> (Schema, Vec<RowId>, Vec<Row>) {
        (self.schema, self.index, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::row;

    fn cities() -> DataFrame {
        DataFrame::new(
            Schema::from_names(["city", "borough"]),
            vec![RowId::new(4), RowId::new(7)],
            vec![row(["NY", "NY"]), row(["LA", "CA"])],
        )
        .unwrap()
    }

    #[test]
    fn shape_and_index() {
        let df = cities();
        assert_eq!(df.shape(), (2, 2));
        assert_eq!(df.index(), &[RowId::new(4), RowId::new(7)]);
        assert_eq!(df.loc(RowId::new(7)), Some(&row(["LA", "CA"])));
    }

    #[test]
    fn column_by_name() {
        let df = cities();
        let boroughs = df.column(&ColumnRef::from("borough")).unwrap();
        assert_eq!(boroughs, vec![&Scalar::from("NY"), &Scalar::from("CA")]);
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = DataFrame::new(
            Schema::from_names(["a", "b"]),
            vec![RowId::new(0)],
            vec![row(["only-one"])],
        );
        assert!(err.is_err());
    }
}
