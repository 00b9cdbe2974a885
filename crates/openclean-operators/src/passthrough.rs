//! Un-wired tail of a chain.

use openclean_core::id::RowId;
use openclean_core::schema::Schema;
use openclean_core::types::Row;

use crate::traits::{Consumer, OpError, Rewire, RowOutcome};

/// Forwards every row to whoever drives the chain. Used as the tail of a
/// chain whose rows are pulled one at a time (`iterrows`), and as the
/// placeholder downstream of freshly constructed stages.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl Consumer for PassThrough {
    type Output = ();

    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn open(&mut self, _schema: &Schema) -> Result<(), OpError> {
        Ok(())
    }

    fn consume(&mut self, _row_id: RowId, row: Row) -> Result<RowOutcome, OpError> {
        Ok(RowOutcome::Forward(row))
    }

    fn close(&mut self) -> Result<(), OpError> {
        Ok(())
    }
}

impl Rewire for PassThrough {
    type Rewired<N: Consumer> = N;

    /// The tail is replaced by `next`.
    fn with_downstream<N: Consumer>(&self, next: N) -> Result<Self::Rewired<N>, OpError> {
        Ok(next)
    }
}
