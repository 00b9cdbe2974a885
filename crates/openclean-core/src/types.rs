//! Lightweight scalar values and rows.
//!
//! Rows are plain `Vec<Scalar>` positionally aligned with a `Schema`. Scalars
//! have total equality, hashing, and ordering so they can serve as keys in
//! frequency counters: floats compare by bit pattern (`NaN == NaN`,
//! `0.0 != -0.0`).

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Bool(bool),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
}

/// One row of values, aligned with the schema of the stage that emits it.
pub type Row = Vec<Scalar>;

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view used by comparisons against literals. Strings are parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::I32(i) => Some(f64::from(*i)),
            Scalar::I64(i) => Some(*i as f64),
            Scalar::F32(f) => Some(f64::from(*f)),
            Scalar::F64(f) => Some(*f),
            Scalar::Str(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        scalar_cmp(self, other) == Ordering::Equal
    }
}

impl Eq for Scalar {}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scalar {
    fn cmp(&self, other: &Self) -> Ordering {
        scalar_cmp(self, other)
    }
}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        use Scalar::*;

        // Write type discriminant first
        scalar_type_order(self).hash(state);

        match self {
            Null => {}
            Bool(b) => b.hash(state),
            I32(i) => i.hash(state),
            I64(i) => i.hash(state),
            F32(f) => f.to_bits().hash(state),
            F64(f) => f.to_bits().hash(state),
            Str(s) => s.hash(state),
            Bin(b) => b.hash(state),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Scalar::*;
        match self {
            Null => Ok(()),
            Bool(b) => write!(f, "{b}"),
            I32(i) => write!(f, "{i}"),
            I64(i) => write!(f, "{i}"),
            F32(v) => write!(f, "{v}"),
            F64(v) => write!(f, "{v}"),
            Str(s) => f.write_str(s),
            Bin(b) => write!(f, "[binary {} bytes]", b.len()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Str(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i32> for Scalar {
    fn from(i: i32) -> Self {
        Scalar::I32(i)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::I64(i)
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Scalar::F64(f)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Scalar::Null)
    }
}

/// Compare two scalars.
///
/// Nulls sort first, then values are compared within their type. Mixed types
/// order by variant rank.
fn scalar_cmp(a: &Scalar, b: &Scalar) -> Ordering {
    use Scalar::*;

    match (a, b) {
        (Null, Null) => Ordering::Equal,
        (Bool(x), Bool(y)) => x.cmp(y),
        (I32(x), I32(y)) => x.cmp(y),
        (I64(x), I64(y)) => x.cmp(y),
        (F32(x), F32(y)) => x.total_cmp(y),
        (F64(x), F64(y)) => x.total_cmp(y),
        (Str(x), Str(y)) => x.cmp(y),
        (Bin(x), Bin(y)) => x.cmp(y),
        _ => scalar_type_order(a).cmp(&scalar_type_order(b)),
    }
}

/// Assign a numeric order to scalar types for mixed-type comparisons.
fn scalar_type_order(s: &Scalar) -> u8 {
    use Scalar::*;
    match s {
        Null => 0,
        Bool(_) => 1,
        I32(_) => 2,
        I64(_) => 3,
        F32(_) => 4,
        F64(_) => 5,
        Str(_) => 6,
        Bin(_) => 7,
    }
}

/// Build a row from anything convertible into scalars.
///
/// ```
/// use openclean_core::types::{row, Scalar};
/// assert_eq!(row(["NY", "NY"]), vec![Scalar::from("NY"), Scalar::from("NY")]);
/// ```
pub fn row<I, T>(values: I) -> Row
where
    I: IntoIterator<Item = T>,
    T: Into<Scalar>,
{
    values.into_iter().map(Into::into).collect()
}
