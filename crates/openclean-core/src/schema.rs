//! Column identity and stream schemas. Pure data.
//!
//! Every column has a stable [`ColumnId`] and a display name. Schemas built
//! from plain names number their columns `0..n`; stages that reshape rows
//! (select) keep the identity of each column they pass on.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::id::ColumnId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub name: String,
}

impl Column {
    pub fn new(id: impl Into<ColumnId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Reference to a column in a schema.
///
/// References are resolved once per `open` into concrete positions. In
/// serialized form a position is a bare integer, a name a string, and an id
/// a one-key map `{id: N}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    ByPosition(usize),
    ByName(String),
    ById(#[serde(with = "tagged_id")] ColumnId),
}

mod tagged_id {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::id::ColumnId;

    #[derive(Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Tagged {
        id: ColumnId,
    }

    pub fn serialize<S: Serializer>(id: &ColumnId, s: S) -> std::result::Result<S::Ok, S::Error> {
        Tagged { id: *id }.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<ColumnId, D::Error> {
        Tagged::deserialize(d).map(|t| t.id)
    }
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> Self {
        ColumnRef::ByName(name.to_string())
    }
}

impl From<String> for ColumnRef {
    fn from(name: String) -> Self {
        ColumnRef::ByName(name)
    }
}

impl From<usize> for ColumnRef {
    fn from(pos: usize) -> Self {
        ColumnRef::ByPosition(pos)
    }
}

impl From<ColumnId> for ColumnRef {
    fn from(id: ColumnId) -> Self {
        ColumnRef::ById(id)
    }
}

impl From<&Column> for ColumnRef {
    fn from(col: &Column) -> Self {
        ColumnRef::ById(col.id)
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::ByPosition(p) => write!(f, "#{p}"),
            ColumnRef::ByName(n) => write!(f, "'{n}'"),
            ColumnRef::ById(id) => write!(f, "{id}"),
        }
    }
}

/// Convert a list of anything column-like into column references.
pub fn refs<I, T>(columns: I) -> Vec<ColumnRef>
where
    I: IntoIterator<Item = T>,
    T: Into<ColumnRef>,
{
    columns.into_iter().map(Into::into).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Schema with ids assigned in column order.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: names
                .into_iter()
                .enumerate()
                .map(|(i, name)| Column::new(i as u64, name))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn index_of_id(&self, id: ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| c.id == id)
    }

    /// Resolve a single column reference to its position.
    pub fn position(&self, col: &ColumnRef) -> Result<usize> {
        match col {
            ColumnRef::ByPosition(p) if *p < self.columns.len() => Ok(*p),
            ColumnRef::ByPosition(p) => Err(Error::Schema(format!(
                "column position {p} out of range for {} columns",
                self.columns.len()
            ))),
            ColumnRef::ByName(name) => self
                .index_of(name)
                .ok_or_else(|| Error::Schema(format!("unknown column name '{name}'"))),
            ColumnRef::ById(id) => self
                .index_of_id(*id)
                .ok_or_else(|| Error::Schema(format!("unknown column {id}"))),
        }
    }

    /// Resolve column references to positions, keeping the given order.
    /// Duplicates are allowed.
    pub fn resolve(&self, columns: &[ColumnRef]) -> Result<Vec<usize>> {
        columns.iter().map(|c| self.position(c)).collect()
    }

    /// Schema made of the columns at `positions`, in that order.
    ///
    /// Positions must come from [`Schema::resolve`] on this schema.
    pub fn project(&self, positions: &[usize]) -> Schema {
        Schema {
            columns: positions
                .iter()
                .filter_map(|&p| self.columns.get(p).cloned())
                .collect(),
        }
    }
}
