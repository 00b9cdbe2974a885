#![forbid(unsafe_code)]
//! openclean-io: row sources and row writers.
//!
//! A `RowSource` describes a dataset that can be streamed any number of times;
//! each `open` returns a fresh `RowReader` that owns its underlying handle and
//! releases it when dropped. Writers receive a header record followed by rows.

pub mod error;
pub mod readers;
pub mod source;
pub mod writers;

pub use error::{Error, Result};
pub use readers::csv::CsvSource;
pub use source::{MemorySource, RowReader, RowSource};
pub use writers::{csv::CsvWriter, jsonl::JsonlWriter, RowWriter};
