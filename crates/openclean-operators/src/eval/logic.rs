//! Composite and row-level predicates.

use std::fmt;
use std::sync::Arc;

use openclean_core::schema::{ColumnRef, Schema};
use openclean_core::types::Scalar;

use crate::eval::compare::cmp_values;
use crate::eval::{prepare_predicate, value_at, DataView, Predicate, Preparation, PreparedPredicate};
use crate::traits::OpError;

/// True when all listed columns hold equal values.
#[derive(Debug, Clone)]
pub struct ColumnsEqual {
    pub columns: Vec<ColumnRef>,
}

impl ColumnsEqual {
    pub fn new(columns: Vec<ColumnRef>) -> Self {
        Self { columns }
    }
}

impl Predicate for ColumnsEqual {
    fn prepare(&self, schema: &Schema) -> Result<Box<dyn PreparedPredicate>, OpError> {
        if self.columns.len() < 2 {
            return Err(OpError::Prepare(
                "columns_equal needs at least two columns".into(),
            ));
        }
        let positions = schema.resolve(&self.columns)?;
        Ok(Box::new(PreparedColumnsEqual { positions }))
    }
}

struct PreparedColumnsEqual {
    positions: Vec<usize>,
}

impl PreparedPredicate for PreparedColumnsEqual {
    fn eval(&self, row: &[Scalar]) -> Result<bool, OpError> {
        let first = value_at(row, self.positions[0])?;
        for &p in &self.positions[1..] {
            if cmp_values(first, value_at(row, p)?).is_ne() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Negation.
#[derive(Debug, Clone)]
pub struct Not(pub Arc<dyn Predicate>);

impl Predicate for Not {
    fn requirement(&self) -> Preparation {
        self.0.requirement()
    }

    fn prepare(&self, schema: &Schema) -> Result<Box<dyn PreparedPredicate>, OpError> {
        Ok(Box::new(PreparedNot(self.0.prepare(schema)?)))
    }

    fn prepare_full(&self, view: &dyn DataView) -> Result<Box<dyn PreparedPredicate>, OpError> {
        Ok(Box::new(PreparedNot(self.0.prepare_full(view)?)))
    }
}

struct PreparedNot(Box<dyn PreparedPredicate>);

impl PreparedPredicate for PreparedNot {
    fn eval(&self, row: &[Scalar]) -> Result<bool, OpError> {
        Ok(!self.0.eval(row)?)
    }
}

/// Conjunction; evaluation short-circuits left to right.
#[derive(Debug, Clone)]
pub struct And(pub Vec<Arc<dyn Predicate>>);

impl Predicate for And {
    fn requirement(&self) -> Preparation {
        self.0
            .iter()
            .map(|p| p.requirement())
            .max()
            .unwrap_or(Preparation::Schema)
    }

    fn prepare(&self, schema: &Schema) -> Result<Box<dyn PreparedPredicate>, OpError> {
        let parts = self
            .0
            .iter()
            .map(|p| prepare_predicate(p.as_ref(), schema, None))
            .collect::<Result<_, _>>()?;
        Ok(Box::new(PreparedAnd(parts)))
    }

    fn prepare_full(&self, view: &dyn DataView) -> Result<Box<dyn PreparedPredicate>, OpError> {
        let schema = view.schema()?;
        let parts = self
            .0
            .iter()
            .map(|p| prepare_predicate(p.as_ref(), &schema, Some(view)))
            .collect::<Result<_, _>>()?;
        Ok(Box::new(PreparedAnd(parts)))
    }
}

struct PreparedAnd(Vec<Box<dyn PreparedPredicate>>);

impl PreparedPredicate for PreparedAnd {
    fn eval(&self, row: &[Scalar]) -> Result<bool, OpError> {
        for p in &self.0 {
            if !p.eval(row)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

type RowPredicateFn = dyn Fn(&[Scalar]) -> Result<bool, OpError> + Send + Sync;

/// Predicate over the full row, backed by a closure.
#[derive(Clone)]
pub struct FnPredicate {
    label: String,
    f: Arc<RowPredicateFn>,
}

impl FnPredicate {
    pub fn new<F>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Scalar]) -> Result<bool, OpError> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            f: Arc::new(f),
        }
    }
}

impl fmt::Debug for FnPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FnPredicate").field(&self.label).finish()
    }
}

impl Predicate for FnPredicate {
    fn prepare(&self, _schema: &Schema) -> Result<Box<dyn PreparedPredicate>, OpError> {
        Ok(Box::new(PreparedFn(self.f.clone())))
    }
}

struct PreparedFn(Arc<RowPredicateFn>);

impl PreparedPredicate for PreparedFn {
    fn eval(&self, row: &[Scalar]) -> Result<bool, OpError> {
        (self.0)(row)
    }
}
