//! Consumer trait + common interfaces.
//!
//! The driver calls `open(schema)` once, then `consume(row_id, row)` for each
//! source row in order, then `close()` once. A forwarding consumer opens its
//! downstream from inside its own `open`, with the schema it emits.

use openclean_core::id::RowId;
use openclean_core::schema::Schema;
use openclean_core::types::Row;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpError {
    /// Unresolvable column reference; raised by `open` before any row.
    #[error("schema error: {0}")]
    Schema(String),

    /// A predicate or row function failed on a row.
    #[error("evaluation error: {0}")]
    Eval(String),

    #[error("preparation error: {0}")]
    Prepare(String),

    #[error("cannot attach a downstream consumer to terminal '{0}'")]
    IllegalDownstream(&'static str),

    #[error("io error: {0}")]
    Io(#[from] openclean_io::Error),

    #[error("internal invariant failed: {0}")]
    Invariant(String),
}

impl From<openclean_core::Error> for OpError {
    fn from(e: openclean_core::Error) -> Self {
        match e {
            openclean_core::Error::Schema(msg) => OpError::Schema(msg),
            other => OpError::Invariant(other.to_string()),
        }
    }
}

/// What happened to a consumed row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// The row made it through the chain; iterators yield it.
    Forward(Row),
    /// The row was swallowed by a stage (or retained by a terminal).
    Drop,
    /// End of stream: the driver must stop pulling rows.
    Stop,
    /// The row made it through and it is the last one: the driver yields it,
    /// then stops pulling rows.
    Last(Row),
}

impl RowOutcome {
    pub fn is_stop(&self) -> bool {
        matches!(self, RowOutcome::Stop)
    }

    /// `Stop` or `Last`: no further row may be consumed.
    pub fn ends_stream(&self) -> bool {
        matches!(self, RowOutcome::Stop | RowOutcome::Last(_))
    }

    /// Mark a downstream answer as the end of the stream, keeping the row
    /// if one came out of the chain.
    pub fn into_last(self) -> RowOutcome {
        match self {
            RowOutcome::Forward(row) | RowOutcome::Last(row) => RowOutcome::Last(row),
            RowOutcome::Drop | RowOutcome::Stop => RowOutcome::Stop,
        }
    }
}

/// One stage of a row-processing chain.
///
/// Invariants:
/// - `open` is called exactly once, before any row.
/// - The rows a consumer forwards match the schema it passed to its
///   downstream `open`.
/// - Row ids are passed through unchanged.
pub trait Consumer {
    /// Result produced by `close`.
    type Output;

    /// Human-readable stage name (stable).
    fn name(&self) -> &'static str;

    fn open(&mut self, schema: &Schema) -> Result<(), OpError>;

    fn consume(&mut self, row_id: RowId, row: Row) -> Result<RowOutcome, OpError>;

    /// Signal the end of the stream. Forwarding consumers return the result of
    /// their downstream.
    fn close(&mut self) -> Result<Self::Output, OpError>;
}

/// Type-erased chain producing `T`.
pub type BoxConsumer<'a, T> = Box<dyn Consumer<Output = T> + 'a>;

impl<C: Consumer + ?Sized> Consumer for Box<C> {
    type Output = C::Output;

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn open(&mut self, schema: &Schema) -> Result<(), OpError> {
        (**self).open(schema)
    }

    fn consume(&mut self, row_id: RowId, row: Row) -> Result<RowOutcome, OpError> {
        (**self).consume(row_id, row)
    }

    fn close(&mut self) -> Result<Self::Output, OpError> {
        (**self).close()
    }
}

/// Attach a new terminus to the tail of a chain.
///
/// `with_downstream` returns a fresh, un-opened copy of the chain's
/// configuration ending in `next`. The receiver is left untouched, so two
/// rewires of the same chain never share state.
pub trait Rewire: Consumer {
    type Rewired<N: Consumer>: Consumer<Output = N::Output>;

    fn with_downstream<N: Consumer>(&self, next: N) -> Result<Self::Rewired<N>, OpError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum Lifecycle {
    #[default]
    Unopened,
    Open,
    Closed,
}

impl Lifecycle {
    pub(crate) fn open(&mut self, stage: &'static str) {
        debug_assert_eq!(*self, Lifecycle::Unopened, "{stage} opened twice");
        *self = Lifecycle::Open;
    }

    pub(crate) fn consuming(&self, stage: &'static str) {
        debug_assert_eq!(*self, Lifecycle::Open, "{stage} consumed a row outside open/close");
    }

    pub(crate) fn close(&mut self) {
        *self = Lifecycle::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::eval::ColumnsEqual;
    use crate::{Collector, DataFrameBuilder, Distinct, Filter, Limit, PassThrough, RowCount, Select};
    use openclean_core::schema::refs;
    use openclean_core::types::row;

    fn city_rows() -> Vec<(RowId, Row)> {
        vec![
            (RowId::new(0), row(["NY", "NY"])),
            (RowId::new(1), row(["LA", "CA"])),
            (RowId::new(2), row(["SF", "CA"])),
        ]
    }

    fn drive<C: Consumer>(mut chain: C, schema: &Schema, rows: Vec<(RowId, Row)>) -> C::Output {
        chain.open(schema).unwrap();
        for (id, r) in rows {
            if chain.consume(id, r).unwrap().ends_stream() {
                break;
            }
        }
        chain.close().unwrap()
    }

    fn same_city() -> Select<Filter<PassThrough>> {
        Select::chained(
            refs(["city", "borough"]),
            Filter::new(Arc::new(ColumnsEqual::new(refs(["city", "borough"])))),
        )
    }

    #[test]
    fn rewired_chain_ends_in_new_terminal() {
        let schema = Schema::from_names(["city", "borough"]);
        let chain = same_city().with_downstream(DataFrameBuilder::new()).unwrap();
        let df = drive(chain, &schema, city_rows());
        assert_eq!(df.shape(), (1, 2));
        assert_eq!(df.index(), &[RowId::new(0)]);
        assert_eq!(df.rows()[0], row(["NY", "NY"]));
    }

    #[test]
    fn rewiring_leaves_the_receiver_reusable() {
        let schema = Schema::from_names(["city", "borough"]);
        let template = Limit::chained(2, PassThrough);
        let counted = drive(
            template.with_downstream(RowCount::new()).unwrap(),
            &schema,
            city_rows(),
        );
        let collected = drive(
            template.with_downstream(Collector::new()).unwrap(),
            &schema,
            city_rows(),
        );
        assert_eq!(counted, 2);
        assert_eq!(collected.len(), 2);
    }

    #[test]
    fn rewiring_past_a_terminal_fails() {
        let chain = Select::chained(refs(["city"]), Distinct::new());
        assert!(matches!(
            chain.with_downstream(Collector::new()),
            Err(OpError::IllegalDownstream("distinct"))
        ));
    }

    #[test]
    fn boxed_chains_drive_like_typed_ones() {
        let schema = Schema::from_names(["city", "borough"]);
        let chain: BoxConsumer<'_, u64> =
            Box::new(same_city().with_downstream(RowCount::new()).unwrap());
        assert_eq!(chain.name(), "select");
        assert_eq!(drive(chain, &schema, city_rows()), 1);
    }
}
