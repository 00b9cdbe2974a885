//! Pipeline driver: owns a row source and the stage specs appended so far,
//! and runs the open / consume / close protocol over freshly built chains.

use std::cell::Cell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use std::vec;

use thiserror::Error;

use openclean_core::config::PipelineConfig;
use openclean_core::counter::{Counter, DistinctKey};
use openclean_core::frame::DataFrame;
use openclean_core::id::RowId;
use openclean_core::schema::{refs, ColumnRef, Schema};
use openclean_core::types::{Row, Scalar};

use openclean_io::{CsvSource, CsvWriter, RowReader, RowSource, RowWriter};

use openclean_operators::eval::{DataView, Not, Predicate, Preparation, RowFunction};
use openclean_operators::rename::renamed_schema;
use openclean_operators::reorder::moved_order;
use openclean_operators::{
    BoxConsumer, Collector, Consumer, DataFrameBuilder, Distinct, Filter, Limit, MoveColumns,
    OpError, PassThrough, Rename, RowCount, RowOutcome, Sample, Select, Update, Write,
    WriteSummary,
};

use crate::metrics::{self, RunStats};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("operator: {0}")]
    Operator(#[from] OpError),
    #[error("source: {0}")]
    Source(#[from] openclean_io::Error),
    #[error("pipeline definition: {0}")]
    Dsl(String),
}

impl From<ExecError> for OpError {
    fn from(e: ExecError) -> Self {
        match e {
            ExecError::Operator(e) => e,
            ExecError::Source(e) => OpError::Io(e),
            ExecError::Dsl(msg) => OpError::Prepare(msg),
        }
    }
}

/// Factory for one stage of the chain. Building a stage never mutates the
/// `StageSpec`, so a pipeline can build any number of chains.
#[derive(Debug, Clone)]
pub enum StageSpec {
    Select(Vec<ColumnRef>),
    Rename {
        columns: Vec<ColumnRef>,
        names: Vec<String>,
    },
    Move {
        columns: Vec<ColumnRef>,
        pos: Option<usize>,
    },
    Filter(Arc<dyn Predicate>),
    Limit(usize),
    Sample {
        n: usize,
        seed: Option<u64>,
    },
    Update {
        columns: Vec<ColumnRef>,
        func: Arc<dyn RowFunction>,
    },
}

impl StageSpec {
    pub fn name(&self) -> &'static str {
        match self {
            StageSpec::Select(_) => "select",
            StageSpec::Rename { .. } => "rename",
            StageSpec::Move { .. } => "move",
            StageSpec::Filter(_) => "filter",
            StageSpec::Limit(_) => "limit",
            StageSpec::Sample { .. } => "sample",
            StageSpec::Update { .. } => "update",
        }
    }

    fn needs_view(&self) -> bool {
        matches!(self, StageSpec::Filter(p) if p.requirement() == Preparation::FullView)
    }

    /// The stage holds rows back until the chain is closed.
    pub fn buffers(&self) -> bool {
        matches!(self, StageSpec::Sample { .. })
    }

    /// Consumer for this stage wrapping the rest of the chain.
    fn build<'a, T>(
        &self,
        downstream: BoxConsumer<'a, T>,
        view: Option<Arc<dyn DataView>>,
    ) -> BoxConsumer<'a, T>
    where
        T: 'a,
    {
        match self {
            StageSpec::Select(columns) => Box::new(Select::chained(columns.clone(), downstream)),
            StageSpec::Rename { columns, names } => Box::new(Rename::chained(
                columns.clone(),
                names.clone(),
                downstream,
            )),
            StageSpec::Move { columns, pos } => {
                Box::new(MoveColumns::chained(columns.clone(), *pos, downstream))
            }
            StageSpec::Filter(pred) => {
                let filter = Filter::chained(pred.clone(), downstream);
                match view {
                    Some(view) => Box::new(filter.with_view(view)),
                    None => Box::new(filter),
                }
            }
            StageSpec::Limit(n) => Box::new(Limit::chained(*n, downstream)),
            StageSpec::Sample { n, seed } => Box::new(Sample::chained(*n, *seed, downstream)),
            StageSpec::Update { columns, func } => {
                Box::new(Update::chained(columns.clone(), func.clone(), downstream))
            }
        }
    }

    /// Schema emitted by this stage for a given input schema.
    fn output_schema(&self, input: &Schema) -> Result<Schema, OpError> {
        match self {
            StageSpec::Select(columns) => {
                let positions = input.resolve(columns)?;
                Ok(input.project(&positions))
            }
            StageSpec::Rename { columns, names } => renamed_schema(input, columns, names),
            StageSpec::Move { columns, pos } => {
                Ok(input.project(&moved_order(input, columns, *pos)?))
            }
            StageSpec::Update { columns, .. } => {
                input.resolve(columns)?;
                Ok(input.clone())
            }
            StageSpec::Filter(_) | StageSpec::Limit(_) | StageSpec::Sample { .. } => {
                Ok(input.clone())
            }
        }
    }
}

impl fmt::Display for StageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageSpec::Select(columns) => {
                let cols: Vec<String> = columns.iter().map(ToString::to_string).collect();
                write!(f, "select [{}]", cols.join(", "))
            }
            StageSpec::Rename { columns, names } => {
                let cols: Vec<String> = columns.iter().map(ToString::to_string).collect();
                write!(f, "rename [{}] to [{}]", cols.join(", "), names.join(", "))
            }
            StageSpec::Move { columns, pos } => {
                let cols: Vec<String> = columns.iter().map(ToString::to_string).collect();
                match pos {
                    Some(p) => write!(f, "move [{}] to {p}", cols.join(", ")),
                    None => write!(f, "move [{}] to end", cols.join(", ")),
                }
            }
            StageSpec::Filter(pred) => write!(f, "filter {pred:?}"),
            StageSpec::Limit(n) => write!(f, "limit {n}"),
            StageSpec::Sample { n, seed: Some(seed) } => write!(f, "sample {n} (seed {seed})"),
            StageSpec::Sample { n, seed: None } => write!(f, "sample {n}"),
            StageSpec::Update { columns, func } => {
                let cols: Vec<String> = columns.iter().map(ToString::to_string).collect();
                write!(f, "update [{}] with {func:?}", cols.join(", "))
            }
        }
    }
}

/// A row source and the stages applied to it.
///
/// Stage methods return a new pipeline and leave `self` untouched:
///
/// ```ignore
/// let ny = people.filter(Compare::parse("city == NY")?);
/// let first = ny.head(5)?;       // people is still usable as is
/// ```
#[derive(Clone)]
pub struct DataPipeline {
    source: Arc<dyn RowSource>,
    stages: Vec<StageSpec>,
    config: PipelineConfig,
}

impl fmt::Debug for DataPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataPipeline")
            .field("columns", &self.source.schema().names())
            .field("stages", &self.stages)
            .finish()
    }
}

impl DataPipeline {
    pub fn new(source: Arc<dyn RowSource>) -> Self {
        Self {
            source,
            stages: Vec::new(),
            config: PipelineConfig::default(),
        }
    }

    pub fn from_source<S: RowSource + 'static>(source: S) -> Self {
        Self::new(Arc::new(source))
    }

    /// Pipeline over a CSV file, read with `config`'s delimiter and header
    /// settings.
    pub fn from_csv<P: AsRef<Path>>(path: P, config: PipelineConfig) -> Result<Self, ExecError> {
        let source = CsvSource::with_config(path, &config)?;
        Ok(Self::from_source(source).with_config(config))
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    pub fn source_schema(&self) -> &Schema {
        self.source.schema()
    }

    /// New pipeline with `stage` appended.
    pub fn then(&self, stage: StageSpec) -> Self {
        let mut next = self.clone();
        next.stages.push(stage);
        next
    }

    pub fn select<I, T>(&self, columns: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ColumnRef>,
    {
        self.then(StageSpec::Select(refs(columns)))
    }

    /// Select `columns` and name them `names`, pairwise.
    pub fn select_as<I, T, N, S>(&self, columns: I, names: N) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ColumnRef>,
        N: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = refs(columns);
        // rename by position so duplicate selections stay addressable
        let positions = refs(0..columns.len());
        self.then(StageSpec::Select(columns)).then(StageSpec::Rename {
            columns: positions,
            names: names.into_iter().map(Into::into).collect(),
        })
    }

    pub fn rename<I, T, N, S>(&self, columns: I, names: N) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ColumnRef>,
        N: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.then(StageSpec::Rename {
            columns: refs(columns),
            names: names.into_iter().map(Into::into).collect(),
        })
    }

    /// Move `columns` so the first of them sits at `pos` among the other
    /// columns; `None` moves them to the end.
    pub fn move_columns<I, T>(&self, columns: I, pos: Option<usize>) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ColumnRef>,
    {
        self.then(StageSpec::Move {
            columns: refs(columns),
            pos,
        })
    }

    pub fn filter<P: Predicate + 'static>(&self, predicate: P) -> Self {
        self.then(StageSpec::Filter(Arc::new(predicate)))
    }

    /// Drop the rows that satisfy `predicate`.
    pub fn delete<P: Predicate + 'static>(&self, predicate: P) -> Self {
        self.filter(Not(Arc::new(predicate)))
    }

    /// `filter(predicate).limit(limit)`.
    pub fn filter_with_limit<P: Predicate + 'static>(&self, predicate: P, limit: usize) -> Self {
        self.filter(predicate).limit(limit)
    }

    /// Filter with an optional row limit.
    pub fn where_<P: Predicate + 'static>(&self, predicate: P, limit: Option<usize>) -> Self {
        match limit {
            Some(k) => self.filter_with_limit(predicate, k),
            None => self.filter(predicate),
        }
    }

    pub fn limit(&self, n: usize) -> Self {
        self.then(StageSpec::Limit(n))
    }

    /// Uniform random sample of `n` rows. A seed makes it reproducible.
    pub fn sample(&self, n: usize, seed: Option<u64>) -> Self {
        self.then(StageSpec::Sample { n, seed })
    }

    pub fn update<I, T, F>(&self, columns: I, func: F) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ColumnRef>,
        F: RowFunction + 'static,
    {
        self.then(StageSpec::Update {
            columns: refs(columns),
            func: Arc::new(func),
        })
    }

    /// Schema of the rows leaving the last stage. Column references are
    /// checked without reading any row.
    pub fn schema(&self) -> Result<Schema, ExecError> {
        Ok(self
            .stage_schemas()?
            .pop()
            .unwrap_or_else(|| self.source.schema().clone()))
    }

    /// Schema after each stage, in stage order.
    pub fn stage_schemas(&self) -> Result<Vec<Schema>, ExecError> {
        let mut schema = self.source.schema().clone();
        let mut out = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            schema = stage.output_schema(&schema)?;
            out.push(schema.clone());
        }
        Ok(out)
    }

    /// Pipeline made of the first `n` stages.
    fn prefix(&self, n: usize) -> DataPipeline {
        DataPipeline {
            source: self.source.clone(),
            stages: self.stages[..n].to_vec(),
            config: self.config.clone(),
        }
    }

    /// Fold the stages, last to first, around `terminal`.
    fn build_chain<'a, C>(&self, terminal: C) -> BoxConsumer<'a, C::Output>
    where
        C: Consumer + 'a,
    {
        let mut chain: BoxConsumer<'a, C::Output> = Box::new(terminal);
        for (i, stage) in self.stages.iter().enumerate().rev() {
            let view = if stage.needs_view() {
                Some(Arc::new(self.prefix(i)) as Arc<dyn DataView>)
            } else {
                None
            };
            tracing::trace!(stage = stage.name(), position = i, "building stage");
            chain = stage.build(chain, view);
        }
        chain
    }

    /// Run the pipeline into `terminal` and return its result.
    pub fn run<C: Consumer>(&self, terminal: C) -> Result<C::Output, ExecError> {
        self.run_with_stats(terminal).map(|(out, _)| out)
    }

    /// Like [`run`](Self::run), also reporting what the driver observed.
    pub fn run_with_stats<C: Consumer>(
        &self,
        terminal: C,
    ) -> Result<(C::Output, RunStats), ExecError> {
        let terminal_name = terminal.name();
        let reached = Rc::new(Cell::new(0u64));
        let mut chain = self.build_chain(Tally {
            inner: terminal,
            reached: reached.clone(),
        });
        tracing::debug!(
            terminal = terminal_name,
            stages = self.stages.len(),
            "pipeline run started"
        );

        // Lookup errors surface here, before the source is touched.
        chain.open(self.source.schema())?;

        let mut stats = RunStats::default();
        {
            let reader = self.source.open()?;
            for item in reader {
                let (row_id, row) = item?;
                stats.rows_read += 1;
                if chain.consume(row_id, row)?.ends_stream() {
                    stats.stopped_early = true;
                    break;
                }
            }
        }

        let out = chain.close()?;
        stats.rows_forwarded = reached.get();
        let names: Vec<&str> = self.stages.iter().map(StageSpec::name).collect();
        metrics::emit_run(terminal_name, &names, &stats);
        Ok((out, stats))
    }

    pub fn to_df(&self) -> Result<DataFrame, ExecError> {
        self.run(DataFrameBuilder::new())
    }

    /// Frequency of distinct rows.
    pub fn distinct(&self) -> Result<Counter, ExecError> {
        self.run(Distinct::new())
    }

    /// Distinct values (or value tuples) of the surviving rows, sorted.
    pub fn distinct_values(
        &self,
        columns: Option<Vec<ColumnRef>>,
    ) -> Result<Vec<DistinctKey>, ExecError> {
        let counts = match columns {
            Some(cols) => self.run(Distinct::on(cols))?,
            None => self.distinct()?,
        };
        let mut keys: Vec<DistinctKey> = counts.iter().map(|(k, _)| k.clone()).collect();
        keys.sort();
        Ok(keys)
    }

    /// Frequency of distinct combinations of `columns`.
    pub fn distinct_on<I, T>(&self, columns: I) -> Result<Counter, ExecError>
    where
        I: IntoIterator<Item = T>,
        T: Into<ColumnRef>,
    {
        self.run(Distinct::on(refs(columns)))
    }

    /// First `n` surviving rows as a data frame.
    pub fn head(&self, n: usize) -> Result<DataFrame, ExecError> {
        self.limit(n).to_df()
    }

    /// `head` with the configured default row count.
    pub fn head_default(&self) -> Result<DataFrame, ExecError> {
        self.head(self.config.head_rows)
    }

    pub fn count(&self) -> Result<u64, ExecError> {
        self.run(RowCount::new())
    }

    pub fn collect(&self) -> Result<Vec<(RowId, Row)>, ExecError> {
        self.run(Collector::new())
    }

    pub fn write<W: RowWriter>(&self, writer: W) -> Result<WriteSummary, ExecError> {
        self.run(Write::new(writer))
    }

    /// Write the surviving rows to a CSV file. The delimiter follows the
    /// pipeline configuration and the file extension.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<WriteSummary, ExecError> {
        let path = path.as_ref();
        let delimiter = self.config.delimiter_for(&path.to_string_lossy());
        let writer = CsvWriter::to_path(path, delimiter)?;
        self.write(writer)
    }

    /// Lazily iterate the surviving rows.
    ///
    /// Nothing is opened until the first call to `next`. Every call to
    /// `iterrows` starts over with a new chain and a new reader. A pipeline
    /// with a sampling stage only releases rows at close, so it is run to
    /// completion on the first `next`.
    pub fn iterrows(&self) -> RowIter<'_> {
        RowIter {
            pipeline: self,
            state: IterState::Pending,
        }
    }
}

/// A pipeline is a view of the rows its stages produce; filters downstream of
/// it prepare full-view predicates by re-streaming it.
impl DataView for DataPipeline {
    fn schema(&self) -> Result<Schema, OpError> {
        Ok(DataPipeline::schema(self)?)
    }

    fn scan(
        &self,
        visit: &mut dyn FnMut(RowId, &[Scalar]) -> Result<(), OpError>,
    ) -> Result<(), OpError> {
        self.run(Visit { visit })?;
        Ok(())
    }
}

/// Counts the rows that reach the terminal it wraps.
struct Tally<C> {
    inner: C,
    reached: Rc<Cell<u64>>,
}

impl<C: Consumer> Consumer for Tally<C> {
    type Output = C::Output;

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn open(&mut self, schema: &Schema) -> Result<(), OpError> {
        self.inner.open(schema)
    }

    fn consume(&mut self, row_id: RowId, row: Row) -> Result<RowOutcome, OpError> {
        self.reached.set(self.reached.get() + 1);
        self.inner.consume(row_id, row)
    }

    fn close(&mut self) -> Result<C::Output, OpError> {
        self.inner.close()
    }
}

/// Terminal handing each row to a callback.
struct Visit<'v> {
    visit: &'v mut dyn FnMut(RowId, &[Scalar]) -> Result<(), OpError>,
}

impl Consumer for Visit<'_> {
    type Output = ();

    fn name(&self) -> &'static str {
        "visit"
    }

    fn open(&mut self, _schema: &Schema) -> Result<(), OpError> {
        Ok(())
    }

    fn consume(&mut self, row_id: RowId, row: Row) -> Result<RowOutcome, OpError> {
        (self.visit)(row_id, &row)?;
        Ok(RowOutcome::Drop)
    }

    fn close(&mut self) -> Result<(), OpError> {
        Ok(())
    }
}

enum IterState<'p> {
    Pending,
    Running {
        chain: BoxConsumer<'p, ()>,
        reader: RowReader<'p>,
    },
    Buffered(vec::IntoIter<(RowId, Row)>),
    Done,
}

/// Iterator returned by [`DataPipeline::iterrows`].
pub struct RowIter<'p> {
    pipeline: &'p DataPipeline,
    state: IterState<'p>,
}

impl<'p> RowIter<'p> {
    fn start(&self) -> Result<IterState<'p>, ExecError> {
        let pipeline = self.pipeline;
        if pipeline.stages.iter().any(StageSpec::buffers) {
            return Ok(IterState::Buffered(pipeline.collect()?.into_iter()));
        }
        let mut chain = pipeline.build_chain(PassThrough);
        chain.open(pipeline.source.schema())?;
        let reader = pipeline.source.open()?;
        tracing::debug!(stages = pipeline.stages.len(), "row iteration started");
        Ok(IterState::Running { chain, reader })
    }

    /// Release the reader and close the chain.
    fn finish(&mut self) -> Option<Result<(RowId, Row), ExecError>> {
        match std::mem::replace(&mut self.state, IterState::Done) {
            IterState::Running { mut chain, reader } => {
                drop(reader);
                chain.close().err().map(|e| Err(e.into()))
            }
            _ => None,
        }
    }

    fn fail(&mut self, e: ExecError) -> Option<Result<(RowId, Row), ExecError>> {
        self.state = IterState::Done;
        Some(Err(e))
    }
}

impl Iterator for RowIter<'_> {
    type Item = Result<(RowId, Row), ExecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, IterState::Pending) {
            match self.start() {
                Ok(state) => self.state = state,
                Err(e) => return self.fail(e),
            }
        }
        loop {
            let (chain, reader) = match &mut self.state {
                IterState::Running { chain, reader } => (chain, reader),
                IterState::Buffered(rows) => return rows.next().map(Ok),
                _ => return None,
            };
            let (row_id, row) = match reader.next() {
                None => return self.finish(),
                Some(Err(e)) => return self.fail(e.into()),
                Some(Ok(item)) => item,
            };
            match chain.consume(row_id, row) {
                Ok(RowOutcome::Forward(row)) => return Some(Ok((row_id, row))),
                Ok(RowOutcome::Drop) => {}
                Ok(RowOutcome::Stop) => return self.finish(),
                Ok(RowOutcome::Last(row)) => {
                    return match self.finish() {
                        Some(Err(e)) => Some(Err(e)),
                        _ => Some(Ok((row_id, row))),
                    }
                }
                Err(e) => return self.fail(e.into()),
            }
        }
    }
}
