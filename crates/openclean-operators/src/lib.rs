#![forbid(unsafe_code)]
//! openclean-operators: the row consumers that make up a stream pipeline.
//!
//! Design intent:
//! - Pure and synchronous: one row at a time, in source order.
//! - A consumer is opened once with the schema of the rows it will receive,
//!   consumes rows, and is closed once to produce its result.
//! - Forwarding consumers (`Select`, `Rename`, `MoveColumns`, `Filter`,
//!   `Limit`, `Sample`, `Update`) own their downstream consumer. `Sample`
//!   holds its rows back until it is closed.
//! - Terminals (`Collector`, `DataFrameBuilder`, `Distinct`, `RowCount`,
//!   `Write`) end the chain and refuse a downstream.
//! - Rewiring with [`Rewire::with_downstream`] builds a new chain; it never
//!   touches the consumer it is called on.

pub mod collector;
pub mod eval;
pub mod filter;
pub mod limit;
pub mod passthrough;
pub mod rename;
pub mod reorder;
pub mod sample;
pub mod select;
pub mod traits;
pub mod update;

pub use collector::{Collector, DataFrameBuilder, Distinct, RowCount, Write, WriteSummary};
pub use eval::{DataView, Predicate, PreparedFunction, PreparedPredicate, Preparation, RowFunction};
pub use filter::Filter;
pub use limit::Limit;
pub use passthrough::PassThrough;
pub use rename::Rename;
pub use reorder::MoveColumns;
pub use sample::Sample;
pub use select::Select;
pub use traits::{BoxConsumer, Consumer, OpError, Rewire, RowOutcome};
pub use update::Update;
