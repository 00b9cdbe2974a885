//! Random sampling without replacement.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use openclean_core::id::RowId;
use openclean_core::schema::Schema;
use openclean_core::types::Row;

use crate::passthrough::PassThrough;
use crate::traits::{Consumer, Lifecycle, OpError, Rewire, RowOutcome};

/// Keeps a uniform sample of `n` rows (reservoir sampling) and hands it to
/// the downstream consumer when the stream closes.
///
/// Rows only reach the downstream from `close`, so a sampling stage cannot
/// feed a row-at-a-time iterator. With a seed the sample is reproducible:
/// every run reseeds the generator when the stage is opened.
#[derive(Debug)]
pub struct Sample<D = PassThrough> {
    n: usize,
    seed: Option<u64>,
    rng: StdRng,
    seen: u64,
    reservoir: Vec<(RowId, Row)>,
    downstream: D,
    state: Lifecycle,
}

impl Sample<PassThrough> {
    pub fn new(n: usize, seed: Option<u64>) -> Self {
        Self::chained(n, seed, PassThrough)
    }
}

impl<D: Consumer> Sample<D> {
    pub fn chained(n: usize, seed: Option<u64>, downstream: D) -> Self {
        Self {
            n,
            seed,
            rng: rng_for(seed),
            seen: 0,
            reservoir: Vec::new(),
            downstream,
            state: Lifecycle::Unopened,
        }
    }
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

impl<D: Consumer> Consumer for Sample<D> {
    type Output = D::Output;

    fn name(&self) -> &'static str {
        "sample"
    }

    fn open(&mut self, schema: &Schema) -> Result<(), OpError> {
        self.state.open(self.name());
        self.rng = rng_for(self.seed);
        self.seen = 0;
        self.reservoir = Vec::with_capacity(self.n);
        self.downstream.open(schema)
    }

    fn consume(&mut self, row_id: RowId, row: Row) -> Result<RowOutcome, OpError> {
        self.state.consuming(self.name());
        if self.n == 0 {
            return Ok(RowOutcome::Stop);
        }
        self.seen += 1;
        if self.reservoir.len() < self.n {
            self.reservoir.push((row_id, row));
        } else {
            let slot = self.rng.gen_range(0..self.seen);
            if let Some(entry) = self.reservoir.get_mut(slot as usize) {
                *entry = (row_id, row);
            }
        }
        Ok(RowOutcome::Drop)
    }

    fn close(&mut self) -> Result<D::Output, OpError> {
        self.state.close();
        tracing::trace!(kept = self.reservoir.len(), seen = self.seen, "sample complete");
        for (row_id, row) in std::mem::take(&mut self.reservoir) {
            if self.downstream.consume(row_id, row)?.ends_stream() {
                break;
            }
        }
        self.downstream.close()
    }
}

impl<D: Rewire> Rewire for Sample<D> {
    type Rewired<N: Consumer> = Sample<D::Rewired<N>>;

    fn with_downstream<N: Consumer>(&self, next: N) -> Result<Self::Rewired<N>, OpError> {
        let downstream = self.downstream.with_downstream(next)?;
        Ok(Sample::chained(self.n, self.seed, downstream))
    }
}
