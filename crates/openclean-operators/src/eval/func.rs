//! Row functions for `Update`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use openclean_core::schema::Schema;
use openclean_core::types::Scalar;

use crate::eval::{value_at, PreparedFunction, RowFunction};
use crate::traits::OpError;

/// Sets every target column to the same constant.
#[derive(Debug, Clone)]
pub struct Const(pub Scalar);

impl RowFunction for Const {
    fn prepare(
        &self,
        _schema: &Schema,
        targets: &[usize],
    ) -> Result<Box<dyn PreparedFunction>, OpError> {
        Ok(Box::new(PreparedConst {
            value: self.0.clone(),
            width: targets.len(),
        }))
    }
}

struct PreparedConst {
    value: Scalar,
    width: usize,
}

impl PreparedFunction for PreparedConst {
    fn eval(&self, _row: &[Scalar]) -> Result<Vec<Scalar>, OpError> {
        Ok(vec![self.value.clone(); self.width])
    }
}

/// String normalization applied to each target value. Non-string values are
/// left as they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrTransform {
    Upper,
    Lower,
    Trim,
}

impl StrTransform {
    pub fn apply(self, v: &Scalar) -> Scalar {
        match v {
            Scalar::Str(s) => Scalar::Str(match self {
                StrTransform::Upper => s.to_uppercase(),
                StrTransform::Lower => s.to_lowercase(),
                StrTransform::Trim => s.trim().to_string(),
            }),
            other => other.clone(),
        }
    }
}

impl FromStr for StrTransform {
    type Err = OpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "upper" => Ok(StrTransform::Upper),
            "lower" => Ok(StrTransform::Lower),
            "trim" => Ok(StrTransform::Trim),
            other => Err(OpError::Prepare(format!("unknown transform '{other}'"))),
        }
    }
}

impl RowFunction for StrTransform {
    fn prepare(
        &self,
        _schema: &Schema,
        targets: &[usize],
    ) -> Result<Box<dyn PreparedFunction>, OpError> {
        Ok(Box::new(PreparedMap {
            targets: targets.to_vec(),
            f: {
                let t = *self;
                Arc::new(move |v: &Scalar| Ok::<_, OpError>(t.apply(v)))
            },
        }))
    }
}

type ValueFn = dyn Fn(&Scalar) -> Result<Scalar, OpError> + Send + Sync;
type RowFn = dyn Fn(&[Scalar]) -> Result<Vec<Scalar>, OpError> + Send + Sync;

/// Applies a closure to each target value independently.
#[derive(Clone)]
pub struct MapValues {
    label: String,
    f: Arc<ValueFn>,
}

impl MapValues {
    pub fn new<F>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Scalar) -> Result<Scalar, OpError> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            f: Arc::new(f),
        }
    }
}

impl fmt::Debug for MapValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MapValues").field(&self.label).finish()
    }
}

impl RowFunction for MapValues {
    fn prepare(
        &self,
        _schema: &Schema,
        targets: &[usize],
    ) -> Result<Box<dyn PreparedFunction>, OpError> {
        Ok(Box::new(PreparedMap {
            targets: targets.to_vec(),
            f: self.f.clone(),
        }))
    }
}

struct PreparedMap {
    targets: Vec<usize>,
    f: Arc<ValueFn>,
}

impl PreparedFunction for PreparedMap {
    fn eval(&self, row: &[Scalar]) -> Result<Vec<Scalar>, OpError> {
        self.targets
            .iter()
            .map(|&p| (self.f)(value_at(row, p)?))
            .collect()
    }
}

/// Computes all target values from the full row.
#[derive(Clone)]
pub struct FnFunction {
    label: String,
    f: Arc<RowFn>,
}

impl FnFunction {
    pub fn new<F>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Scalar]) -> Result<Vec<Scalar>, OpError> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            f: Arc::new(f),
        }
    }
}

impl fmt::Debug for FnFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FnFunction").field(&self.label).finish()
    }
}

impl RowFunction for FnFunction {
    fn prepare(
        &self,
        _schema: &Schema,
        _targets: &[usize],
    ) -> Result<Box<dyn PreparedFunction>, OpError> {
        Ok(Box::new(PreparedRowFn(self.f.clone())))
    }
}

struct PreparedRowFn(Arc<RowFn>);

impl PreparedFunction for PreparedRowFn {
    fn eval(&self, row: &[Scalar]) -> Result<Vec<Scalar>, OpError> {
        (self.0)(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openclean_core::types::row;

    #[test]
    fn str_transform_touches_only_strings() {
        let f = StrTransform::Upper
            .prepare(&Schema::from_names(["a", "b"]), &[0, 1])
            .unwrap();
        assert_eq!(
            f.eval(&[Scalar::from("ny"), Scalar::I64(3)]).unwrap(),
            vec![Scalar::from("NY"), Scalar::I64(3)]
        );
    }

    #[test]
    fn parse_transform_names() {
        assert_eq!("Trim".parse::<StrTransform>().unwrap(), StrTransform::Trim);
        assert!("reverse".parse::<StrTransform>().is_err());
    }

    #[test]
    fn const_fills_every_target() {
        let f = Const(Scalar::from("x"))
            .prepare(&Schema::from_names(["a", "b", "c"]), &[0, 2])
            .unwrap();
        assert_eq!(f.eval(&row(["1", "2", "3"])).unwrap(), row(["x", "x"]));
    }

    #[test]
    fn map_values_follows_target_order() {
        let f = MapValues::new("len", |v: &Scalar| {
            Ok(Scalar::I64(v.as_str().map_or(0, |s| s.len() as i64)))
        })
        .prepare(&Schema::from_names(["a", "b"]), &[1, 0])
        .unwrap();
        assert_eq!(
            f.eval(&row(["abc", "z"])).unwrap(),
            vec![Scalar::I64(1), Scalar::I64(3)]
        );
    }
}
