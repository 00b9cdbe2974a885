//! Column-versus-literal comparisons.
//!
//! Supports expressions of the form: "col OP literal" where OP ∈ {==, !=, <, <=, >, >=}

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use openclean_core::schema::{ColumnRef, Schema};
use openclean_core::types::Scalar;

use crate::eval::{value_at, Predicate, PreparedPredicate};
use crate::traits::OpError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    // Two-character operators first so "<=" never parses as "<".
    const TOKENS: [(&'static str, CmpOp); 6] = [
        ("==", CmpOp::Eq),
        ("!=", CmpOp::Ne),
        ("<=", CmpOp::Le),
        (">=", CmpOp::Ge),
        ("<", CmpOp::Lt),
        (">", CmpOp::Gt),
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }

    pub fn matches(self, ord: Ordering) -> bool {
        match self {
            CmpOp::Eq => ord == Ordering::Equal,
            CmpOp::Ne => ord != Ordering::Equal,
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::Le => ord != Ordering::Greater,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::Ge => ord != Ordering::Less,
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `column OP literal`. Null values never match.
#[derive(Debug, Clone, PartialEq)]
pub struct Compare {
    pub column: ColumnRef,
    pub op: CmpOp,
    pub literal: String,
}

impl Compare {
    pub fn new(column: impl Into<ColumnRef>, op: CmpOp, literal: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op,
            literal: literal.into(),
        }
    }

    /// Parse a predicate like "age > 18" or "name == Alice". Literals may be
    /// wrapped in single or double quotes.
    pub fn parse(expr: &str) -> Result<Self, OpError> {
        for (token, op) in CmpOp::TOKENS {
            if let Some(pos) = expr.find(token) {
                let col = expr[..pos].trim();
                let lit = unquote(expr[pos + token.len()..].trim());
                if col.is_empty() {
                    break;
                }
                return Ok(Self::new(col, op, lit));
            }
        }
        Err(OpError::Prepare(format!("unparseable predicate: {expr}")))
    }
}

impl FromStr for Compare {
    type Err = OpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn unquote(s: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(q).and_then(|r| r.strip_suffix(q)) {
            return inner;
        }
    }
    s
}

impl Predicate for Compare {
    fn prepare(&self, schema: &Schema) -> Result<Box<dyn PreparedPredicate>, OpError> {
        let pos = schema.position(&self.column)?;
        Ok(Box::new(PreparedCompare {
            pos,
            op: self.op,
            literal: self.literal.clone(),
            numeric: self.literal.trim().parse::<f64>().ok(),
        }))
    }
}

struct PreparedCompare {
    pos: usize,
    op: CmpOp,
    literal: String,
    numeric: Option<f64>,
}

impl PreparedPredicate for PreparedCompare {
    fn eval(&self, row: &[Scalar]) -> Result<bool, OpError> {
        let val = value_at(row, self.pos)?;
        let ord = match val {
            Scalar::Null => return Ok(false),
            Scalar::Bool(b) => {
                let lit = self.literal.parse::<bool>().map_err(|_| {
                    OpError::Eval(format!("cannot parse '{}' as bool", self.literal))
                })?;
                if !matches!(self.op, CmpOp::Eq | CmpOp::Ne) {
                    return Err(OpError::Eval(format!(
                        "unsupported op '{}' for bool",
                        self.op
                    )));
                }
                b.cmp(&lit)
            }
            Scalar::I32(_) | Scalar::I64(_) | Scalar::F32(_) | Scalar::F64(_) => {
                let lit = self.numeric.ok_or_else(|| {
                    OpError::Eval(format!("cannot parse '{}' as number", self.literal))
                })?;
                let v = val.as_f64().unwrap_or(f64::NAN);
                match v.partial_cmp(&lit) {
                    Some(ord) => ord,
                    None => return Ok(false),
                }
            }
            // Strings read from text files compare numerically when both
            // sides are numbers.
            Scalar::Str(s) => match (self.numeric, val.as_f64()) {
                (Some(lit), Some(v)) => match v.partial_cmp(&lit) {
                    Some(ord) => ord,
                    None => return Ok(false),
                },
                _ => s.as_str().cmp(self.literal.as_str()),
            },
            Scalar::Bin(_) => {
                return Err(OpError::Eval("binary values cannot be compared".into()));
            }
        };
        Ok(self.op.matches(ord))
    }
}

/// Ordering used when comparing two cell values of a row. Numbers and numeric
/// strings compare by value; everything else falls back to the total scalar
/// order.
pub fn cmp_values(a: &Scalar, b: &Scalar) -> Ordering {
    if a.is_null() || b.is_null() {
        return a.cmp(b);
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => a.cmp(b),
    }
}
