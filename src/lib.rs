#![forbid(unsafe_code)]
//! openclean: streaming row pipelines for data cleaning.
//!
//! This crate re-exports the workspace so applications can depend on one
//! package:
//! - [`openclean_core`]: scalars, rows, schemas, data frames, counters, configuration.
//! - [`openclean_io`]: row sources (memory, CSV) and row writers (CSV, JSON lines).
//! - [`openclean_operators`]: the consumer chain and built-in predicates / functions.
//! - [`openclean_exec`]: the `DataPipeline` driver and the YAML pipeline format.

pub use openclean_core;
pub use openclean_exec;
pub use openclean_io;
pub use openclean_operators;

pub use openclean_exec::{DataPipeline, ExecError};

pub mod prelude {
    pub use openclean_core::prelude::{
        refs, row, Column, ColumnId, ColumnRef, Counter, DataFrame, DistinctKey, PipelineConfig,
        Row, RowId, Scalar, Schema,
    };
    pub use openclean_exec::{DataPipeline, ExecError, RowIter, StageSpec};
    pub use openclean_io::{CsvSource, CsvWriter, JsonlWriter, MemorySource, RowSource, RowWriter};
    pub use openclean_operators::eval::{
        And, ColumnsEqual, Compare, Const, EqualsColumnMax, FnFunction, FnPredicate, MapValues,
        Not, StrTransform,
    };
    pub use openclean_operators::{Consumer, OpError, Rewire, RowOutcome};
}
