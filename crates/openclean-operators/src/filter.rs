//! Row filter.
//!
//! The predicate is prepared in `open`. Predicates that need the whole stream
//! (`Preparation::FullView`) are prepared against the view attached with
//! [`Filter::with_view`]; the driver attaches the pipeline of the stages
//! upstream of the filter.

use std::fmt;
use std::sync::Arc;

use openclean_core::id::RowId;
use openclean_core::schema::Schema;
use openclean_core::types::Row;

use crate::eval::{prepare_predicate, DataView, Predicate, PreparedPredicate};
use crate::passthrough::PassThrough;
use crate::traits::{Consumer, Lifecycle, OpError, Rewire, RowOutcome};

pub struct Filter<D = PassThrough> {
    predicate: Arc<dyn Predicate>,
    view: Option<Arc<dyn DataView>>,
    prepared: Option<Box<dyn PreparedPredicate>>,
    downstream: D,
    state: Lifecycle,
}

impl Filter<PassThrough> {
    pub fn new(predicate: Arc<dyn Predicate>) -> Self {
        Self::chained(predicate, PassThrough)
    }
}

impl<D: Consumer> Filter<D> {
    pub fn chained(predicate: Arc<dyn Predicate>, downstream: D) -> Self {
        Self {
            predicate,
            view: None,
            prepared: None,
            downstream,
            state: Lifecycle::Unopened,
        }
    }

    /// Full view handed to predicates that cannot be prepared from a schema.
    pub fn with_view(mut self, view: Arc<dyn DataView>) -> Self {
        self.view = Some(view);
        self
    }

    pub fn predicate(&self) -> &Arc<dyn Predicate> {
        &self.predicate
    }
}

impl<D: fmt::Debug> fmt::Debug for Filter<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("predicate", &self.predicate)
            .field("has_view", &self.view.is_some())
            .field("downstream", &self.downstream)
            .finish()
    }
}

impl<D: Consumer> Consumer for Filter<D> {
    type Output = D::Output;

    fn name(&self) -> &'static str {
        "filter"
    }

    fn open(&mut self, schema: &Schema) -> Result<(), OpError> {
        self.state.open(self.name());
        let prepared = prepare_predicate(self.predicate.as_ref(), schema, self.view.as_deref())?;
        self.prepared = Some(prepared);
        self.downstream.open(schema)
    }

    fn consume(&mut self, row_id: RowId, row: Row) -> Result<RowOutcome, OpError> {
        self.state.consuming(self.name());
        let pred = self
            .prepared
            .as_ref()
            .ok_or_else(|| OpError::Invariant("filter consumed a row before open".into()))?;
        if pred.eval(&row)? {
            self.downstream.consume(row_id, row)
        } else {
            Ok(RowOutcome::Drop)
        }
    }

    fn close(&mut self) -> Result<D::Output, OpError> {
        self.state.close();
        self.downstream.close()
    }
}

impl<D: Rewire> Rewire for Filter<D> {
    type Rewired<N: Consumer> = Filter<D::Rewired<N>>;

    fn with_downstream<N: Consumer>(&self, next: N) -> Result<Self::Rewired<N>, OpError> {
        let downstream = self.downstream.with_downstream(next)?;
        Ok(Filter {
            predicate: self.predicate.clone(),
            view: self.view.clone(),
            prepared: None,
            downstream,
            state: Lifecycle::Unopened,
        })
    }
}
