//! Early termination after a fixed number of rows.

use openclean_core::id::RowId;
use openclean_core::schema::Schema;
use openclean_core::types::Row;

use crate::passthrough::PassThrough;
use crate::traits::{Consumer, Lifecycle, OpError, Rewire, RowOutcome};

/// Forwards the first `n` rows it receives. The `n`th row goes out as
/// [`RowOutcome::Last`] so the driver stops pulling from the source right
/// after it; unlike a filter it never reads ahead to swallow the remainder.
/// `Limit(0)` answers [`RowOutcome::Stop`] to the first row.
#[derive(Debug)]
pub struct Limit<D = PassThrough> {
    n: usize,
    seen: usize,
    downstream: D,
    state: Lifecycle,
}

impl Limit<PassThrough> {
    pub fn new(n: usize) -> Self {
        Self::chained(n, PassThrough)
    }
}

impl<D: Consumer> Limit<D> {
    pub fn chained(n: usize, downstream: D) -> Self {
        Self {
            n,
            seen: 0,
            downstream,
            state: Lifecycle::Unopened,
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }
}

impl<D: Consumer> Consumer for Limit<D> {
    type Output = D::Output;

    fn name(&self) -> &'static str {
        "limit"
    }

    fn open(&mut self, schema: &Schema) -> Result<(), OpError> {
        self.state.open(self.name());
        self.seen = 0;
        self.downstream.open(schema)
    }

    fn consume(&mut self, row_id: RowId, row: Row) -> Result<RowOutcome, OpError> {
        self.state.consuming(self.name());
        if self.seen >= self.n {
            return Ok(RowOutcome::Stop);
        }
        self.seen += 1;
        let outcome = self.downstream.consume(row_id, row)?;
        Ok(if self.seen == self.n {
            outcome.into_last()
        } else {
            outcome
        })
    }

    fn close(&mut self) -> Result<D::Output, OpError> {
        self.state.close();
        self.downstream.close()
    }
}

impl<D: Rewire> Rewire for Limit<D> {
    type Rewired<N: Consumer> = Limit<D::Rewired<N>>;

    fn with_downstream<N: Consumer>(&self, next: N) -> Result<Self::Rewired<N>, OpError> {
        Ok(Limit::chained(self.n, self.downstream.with_downstream(next)?))
    }
}
