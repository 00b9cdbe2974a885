//! Frequency counter for distinct values and value combinations.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Scalar;

/// Key of a frequency counter: the single value of a unary row, or the ordered
/// tuple of values for wider rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DistinctKey {
    Value(Scalar),
    Tuple(Vec<Scalar>),
}

impl DistinctKey {
    /// Key for a row. Single-value rows use the value itself.
    pub fn from_values(mut values: Vec<Scalar>) -> Self {
        if values.len() == 1 {
            DistinctKey::Value(values.remove(0))
        } else {
            DistinctKey::Tuple(values)
        }
    }
}

impl From<Scalar> for DistinctKey {
    fn from(v: Scalar) -> Self {
        DistinctKey::Value(v)
    }
}

impl fmt::Display for DistinctKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistinctKey::Value(v) => write!(f, "{v}"),
            DistinctKey::Tuple(values) => {
                f.write_str("(")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str(")")
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counter {
    counts: HashMap<DistinctKey, u64>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, key: DistinctKey) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    /// Count for a key; zero if it was never seen.
    pub fn get(&self, key: &DistinctKey) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Count for a unary value.
    pub fn get_value(&self, value: &Scalar) -> u64 {
        self.get(&DistinctKey::Value(value.clone()))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DistinctKey, &u64)> {
        self.counts.iter()
    }

    /// Keys by descending count; ties ordered by key.
    pub fn most_common(&self) -> Vec<(DistinctKey, u64)> {
        let mut entries: Vec<(DistinctKey, u64)> =
            self.counts.iter().map(|(k, c)| (k.clone(), *c)).collect();
        entries.sort_by(|(ka, ca), (kb, cb)| cb.cmp(ca).then_with(|| ka.cmp(kb)));
        entries
    }
}

impl FromIterator<(DistinctKey, u64)> for Counter {
    fn from_iter<I: IntoIterator<Item = (DistinctKey, u64)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().collect(),
        }
    }
}
