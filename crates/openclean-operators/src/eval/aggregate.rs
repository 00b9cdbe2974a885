//! Predicates that depend on an aggregate over the whole stream.

use openclean_core::schema::{ColumnRef, Schema};
use openclean_core::types::Scalar;

use crate::eval::compare::cmp_values;
use crate::eval::{value_at, DataView, Predicate, Preparation, PreparedPredicate};
use crate::traits::OpError;

/// Keeps rows whose value in `column` equals the column maximum across every
/// row reaching the filter. Nulls are ignored when computing the maximum.
#[derive(Debug, Clone)]
pub struct EqualsColumnMax {
    pub column: ColumnRef,
}

impl EqualsColumnMax {
    pub fn new(column: impl Into<ColumnRef>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Predicate for EqualsColumnMax {
    fn requirement(&self) -> Preparation {
        Preparation::FullView
    }

    fn prepare(&self, _schema: &Schema) -> Result<Box<dyn PreparedPredicate>, OpError> {
        Err(OpError::Prepare(format!(
            "maximum of {} needs a full view of the stream",
            self.column
        )))
    }

    fn prepare_full(&self, view: &dyn DataView) -> Result<Box<dyn PreparedPredicate>, OpError> {
        let pos = view.schema()?.position(&self.column)?;
        let mut max: Option<Scalar> = None;
        view.scan(&mut |_, row| {
            let v = value_at(row, pos)?;
            if v.is_null() {
                return Ok(());
            }
            match &max {
                Some(m) if cmp_values(v, m).is_le() => {}
                _ => max = Some(v.clone()),
            }
            Ok(())
        })?;
        tracing::trace!(column = %self.column, max = ?max, "prepared column maximum");
        Ok(Box::new(PreparedEqualsMax { pos, max }))
    }
}

struct PreparedEqualsMax {
    pos: usize,
    max: Option<Scalar>,
}

impl PreparedPredicate for PreparedEqualsMax {
    fn eval(&self, row: &[Scalar]) -> Result<bool, OpError> {
        let v = value_at(row, self.pos)?;
        Ok(match &self.max {
            Some(m) => !v.is_null() && cmp_values(v, m).is_eq(),
            None => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::prepare_predicate;
    use openclean_core::frame::DataFrame;
    use openclean_core::id::RowId;
    use openclean_core::types::row;

    fn frame() -> DataFrame {
        DataFrame::new(
            Schema::from_names(["name", "score"]),
            (0..4).map(RowId::new).collect(),
            vec![
                row(["a", "7"]),
                row(["b", "10"]),
                vec![Scalar::from("c"), Scalar::Null],
                row(["d", "10"]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn keeps_rows_at_the_maximum() {
        let df = frame();
        let p = EqualsColumnMax::new("score").prepare_full(&df).unwrap();
        let kept: Vec<_> = df
            .rows()
            .iter()
            .filter(|r| p.eval(r).unwrap())
            .map(|r| r[0].clone())
            .collect();
        assert_eq!(kept, vec![Scalar::from("b"), Scalar::from("d")]);
    }

    #[test]
    fn requires_a_view() {
        let schema = Schema::from_names(["score"]);
        let err = prepare_predicate(&EqualsColumnMax::new("score"), &schema, None)
            .err()
            .unwrap();
        assert!(matches!(err, OpError::Prepare(_)));
    }
}
