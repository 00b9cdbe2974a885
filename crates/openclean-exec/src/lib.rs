#![forbid(unsafe_code)]
//! openclean-exec: the pipeline driver.
//!
//! Design intent:
//! - `DataPipeline` is an immutable value: a row source plus an ordered list
//!   of stage specs. Appending a stage returns a new pipeline.
//! - Every run builds a fresh consumer chain, opens a fresh reader on the
//!   source, and drops the reader on every exit path.
//! - `RowOutcome::Stop` and `RowOutcome::Last` end the read loop here and
//!   nowhere else.
//! - Linear pipelines can be described in YAML (see [`dsl`]).

pub mod dsl;
pub mod metrics;
pub mod pipeline;

pub use dsl::{parse_yaml_pipeline, ParsedPipeline, SinkResult};
pub use metrics::RunStats;
pub use pipeline::{DataPipeline, ExecError, RowIter, StageSpec};
