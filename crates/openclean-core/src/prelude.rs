//! Convenient re-exports for downstream crates.

pub use crate::config::PipelineConfig;
pub use crate::counter::{Counter, DistinctKey};
pub use crate::error::{Error, Result};
pub use crate::frame::DataFrame;
pub use crate::id::{ColumnId, RowId};
pub use crate::schema::{refs, Column, ColumnRef, Schema};
pub use crate::types::{row, Row, Scalar};
