//! Evaluator contracts used by `Filter` and `Update`.
//!
//! Evaluators are configured once and *prepared* for every run. Preparation
//! comes in two explicit forms:
//! - against a schema: cheap and streaming safe (resolve column positions);
//! - against a full view of the rows reaching the stage: needed by predicates
//!   that depend on aggregates of the whole stream (e.g. a column maximum).

pub mod aggregate;
pub mod compare;
pub mod func;
pub mod logic;

use std::fmt;

use openclean_core::frame::DataFrame;
use openclean_core::id::RowId;
use openclean_core::schema::Schema;
use openclean_core::types::Scalar;

use crate::traits::OpError;

pub use aggregate::EqualsColumnMax;
pub use compare::{CmpOp, Compare};
pub use func::{Const, FnFunction, MapValues, StrTransform};
pub use logic::{And, ColumnsEqual, FnPredicate, Not};

/// What a predicate needs to be prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Preparation {
    Schema,
    FullView,
}

/// A materialized (or re-streamable) view of the rows arriving at a stage.
pub trait DataView: Send + Sync {
    fn schema(&self) -> Result<Schema, OpError>;

    /// Visit every row of the view in stream order.
    fn scan(&self, visit: &mut dyn FnMut(RowId, &[Scalar]) -> Result<(), OpError>)
        -> Result<(), OpError>;
}

impl DataView for DataFrame {
    fn schema(&self) -> Result<Schema, OpError> {
        Ok(DataFrame::schema(self).clone())
    }

    fn scan(
        &self,
        visit: &mut dyn FnMut(RowId, &[Scalar]) -> Result<(), OpError>,
    ) -> Result<(), OpError> {
        for (id, row) in self.iterrows() {
            visit(id, row)?;
        }
        Ok(())
    }
}

/// Boolean row predicate.
pub trait Predicate: Send + Sync + fmt::Debug {
    fn requirement(&self) -> Preparation {
        Preparation::Schema
    }

    fn prepare(&self, schema: &Schema) -> Result<Box<dyn PreparedPredicate>, OpError>;

    /// Prepare against a full view. Only called when `requirement` is
    /// `FullView`; schema-only predicates fall back to `prepare`.
    fn prepare_full(&self, view: &dyn DataView) -> Result<Box<dyn PreparedPredicate>, OpError> {
        self.prepare(&view.schema()?)
    }
}

pub trait PreparedPredicate {
    fn eval(&self, row: &[Scalar]) -> Result<bool, OpError>;
}

/// Function that computes replacement values for a set of target columns.
pub trait RowFunction: Send + Sync + fmt::Debug {
    /// `targets` are the resolved positions of the columns being updated.
    fn prepare(
        &self,
        schema: &Schema,
        targets: &[usize],
    ) -> Result<Box<dyn PreparedFunction>, OpError>;
}

pub trait PreparedFunction {
    /// One value per target column, in target order.
    fn eval(&self, row: &[Scalar]) -> Result<Vec<Scalar>, OpError>;
}

/// Prepare `pred` with whatever it requires, given an optional full view.
pub fn prepare_predicate(
    pred: &dyn Predicate,
    schema: &Schema,
    view: Option<&dyn DataView>,
) -> Result<Box<dyn PreparedPredicate>, OpError> {
    match (pred.requirement(), view) {
        (Preparation::Schema, _) => pred.prepare(schema),
        (Preparation::FullView, Some(view)) => pred.prepare_full(view),
        (Preparation::FullView, None) => Err(OpError::Prepare(format!(
            "{pred:?} needs a full view of the stream but none was provided"
        ))),
    }
}

/// Fetch a value by resolved position.
pub(crate) fn value_at(row: &[Scalar], pos: usize) -> Result<&Scalar, OpError> {
    row.get(pos).ok_or_else(|| {
        OpError::Eval(format!(
            "row has {} values, column position {pos} requested",
            row.len()
        ))
    })
}
