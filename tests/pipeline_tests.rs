//! End-to-end behavior of the pipeline driver over in-memory sources.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use openclean::openclean_io::{Error as IoError, RowReader};
use openclean::openclean_operators::{Collector, DataFrameBuilder, Limit, PassThrough, RowCount};
use openclean::prelude::*;

fn cities() -> DataPipeline {
    let source = MemorySource::new(
        Schema::from_names(["city", "borough"]),
        vec![
            (RowId::new(0), row(["NY", "NY"])),
            (RowId::new(1), row(["LA", "CA"])),
            (RowId::new(2), row(["SF", "CA"])),
        ],
    )
    .unwrap();
    DataPipeline::from_source(source)
}

#[test]
fn test_select_filter_to_df() {
    let df = cities()
        .select(["city", "borough"])
        .filter(ColumnsEqual::new(refs(["city", "borough"])))
        .to_df()
        .unwrap();
    assert_eq!(df.shape(), (1, 2));
    assert_eq!(df.index(), &[RowId::new(0)]);
    assert_eq!(df.rows(), &[row(["NY", "NY"])]);
    assert_eq!(df.schema().names(), vec!["city", "borough"]);
}

#[test]
fn test_select_all_columns_is_identity() {
    let base = cities();
    let all = base.source_schema().columns.clone();
    let df = base.select(all.iter()).to_df().unwrap();
    let original = base.to_df().unwrap();
    assert_eq!(df, original);
}

#[test]
fn test_select_by_position_and_reorder() {
    let df = cities().select([1usize, 0, 1]).to_df().unwrap();
    assert_eq!(df.schema().names(), vec!["borough", "city", "borough"]);
    assert_eq!(df.rows()[1], row(["CA", "LA", "CA"]));
}

#[test]
fn test_row_ids_pass_through_unchanged() {
    let source = MemorySource::new(
        Schema::from_names(["v"]),
        vec![
            (RowId::new(40), row(["a"])),
            (RowId::new(7), row(["b"])),
            (RowId::new(99), row(["c"])),
        ],
    )
    .unwrap();
    let rows = DataPipeline::from_source(source)
        .update(["v"], StrTransform::Upper)
        .filter(Compare::parse("v != B").unwrap())
        .collect()
        .unwrap();
    assert_eq!(
        rows,
        vec![(RowId::new(40), row(["A"])), (RowId::new(99), row(["C"]))]
    );
}

#[test]
fn test_limit_exactness() {
    for m in [0i64, 1, 5, 12] {
        let source = MemorySource::from_rows(
            Schema::from_names(["n"]),
            (0..m).map(|v| row([v])).collect(),
        )
        .unwrap();
        let p = DataPipeline::from_source(source);
        for k in [0usize, 1, 3, 12, 20] {
            let df = p.limit(k).to_df().unwrap();
            let expected = k.min(m as usize);
            assert_eq!(df.num_rows(), expected, "limit({k}) over {m} rows");
            let ids: Vec<u64> = df.index().iter().map(|id| id.get()).collect();
            assert_eq!(ids, (0..expected as u64).collect::<Vec<_>>());
        }
    }
}

#[test]
fn test_limit_counts_surviving_rows_only() {
    let source = MemorySource::from_rows(
        Schema::from_names(["n"]),
        (0..50i64).map(|v| row([v])).collect(),
    )
    .unwrap();
    let rows = DataPipeline::from_source(source)
        .filter_with_limit(Compare::parse("n >= 10").unwrap(), 3)
        .collect()
        .unwrap();
    let values: Vec<Scalar> = rows.into_iter().map(|(_, r)| r[0].clone()).collect();
    assert_eq!(values, vec![Scalar::I64(10), Scalar::I64(11), Scalar::I64(12)]);
}

#[test]
fn test_limit_after_filter_reads_up_to_kth_match() {
    // a bad row right after the second match is never pulled
    let (p, _, released) = tracked(1_000, Some(5));
    let (n, stats) = p
        .filter_with_limit(Compare::parse("n >= 3").unwrap(), 2)
        .run_with_stats(RowCount::new())
        .unwrap();
    assert_eq!(n, 2);
    assert_eq!(stats.rows_read, 5);
    assert!(stats.stopped_early);
    assert_eq!(released.load(Ordering::SeqCst), 1);

    let (p, _, _) = tracked(1_000, None);
    let first: Vec<_> = p
        .filter_with_limit(Compare::parse("n == 0").unwrap(), 1)
        .iterrows()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(first, vec![(RowId::new(0), row([0i64]))]);
}

#[test]
fn test_distinct_counts() {
    let unary = MemorySource::from_rows(
        Schema::from_names(["v"]),
        [1i64, 2, 1, 3, 1].into_iter().map(|v| row([v])).collect(),
    )
    .unwrap();
    let counts = DataPipeline::from_source(unary).distinct().unwrap();
    assert_eq!(counts.len(), 3);
    assert_eq!(counts.get_value(&Scalar::I64(1)), 3);
    assert_eq!(counts.get_value(&Scalar::I64(2)), 1);
    assert_eq!(counts.get_value(&Scalar::I64(3)), 1);

    let binary = MemorySource::from_rows(
        Schema::from_names(["k", "n"]),
        vec![
            row([Scalar::from("A"), Scalar::I64(1)]),
            row([Scalar::from("A"), Scalar::I64(2)]),
            row([Scalar::from("B"), Scalar::I64(1)]),
            row([Scalar::from("B"), Scalar::I64(1)]),
        ],
    )
    .unwrap();
    let counts = DataPipeline::from_source(binary).distinct().unwrap();
    let key = |k: &str, n: i64| DistinctKey::Tuple(vec![Scalar::from(k), Scalar::I64(n)]);
    assert_eq!(counts.get(&key("A", 1)), 1);
    assert_eq!(counts.get(&key("A", 2)), 1);
    assert_eq!(counts.get(&key("B", 1)), 2);
    assert_eq!(counts.most_common()[0], (key("B", 1), 2));
}

#[test]
fn test_distinct_on_column_subset() {
    let counts = cities().distinct_on(["borough"]).unwrap();
    assert_eq!(counts.get_value(&Scalar::from("CA")), 2);
    assert_eq!(counts.total(), 3);
}

#[test]
fn test_rewire_produces_independent_chains() {
    let template = Limit::chained(2, PassThrough);
    let mut counted = template.with_downstream(RowCount::new()).unwrap();
    let mut framed = template.with_downstream(DataFrameBuilder::new()).unwrap();
    let schema = Schema::from_names(["v"]);
    counted.open(&schema).unwrap();
    framed.open(&schema).unwrap();

    for i in 0..3 {
        let _ = counted.consume(RowId::new(i), row(["x"])).unwrap();
    }
    // counted has hit its limit; framed is untouched
    assert_eq!(
        framed.consume(RowId::new(0), row(["y"])).unwrap(),
        RowOutcome::Drop
    );
    assert_eq!(counted.close().unwrap(), 2);
    assert_eq!(framed.close().unwrap().num_rows(), 1);
    assert!(template.with_downstream(Collector::new()).is_ok());
}

#[test]
fn test_full_view_filter_uses_upstream_rows() {
    let source = MemorySource::from_rows(
        Schema::from_names(["name", "score"]),
        vec![
            row(["a", "3"]),
            row(["b", "9"]),
            row(["c", "7"]),
            row(["d", "7"]),
        ],
    )
    .unwrap();
    let p = DataPipeline::from_source(source);

    let top = p.filter(EqualsColumnMax::new("score")).collect().unwrap();
    assert_eq!(top, vec![(RowId::new(1), row(["b", "9"]))]);

    // with b filtered out upstream, the maximum becomes 7
    let top = p
        .filter(Compare::parse("name != b").unwrap())
        .filter(EqualsColumnMax::new("score"))
        .select(["name"])
        .collect()
        .unwrap();
    let names: Vec<Row> = top.into_iter().map(|(_, r)| r).collect();
    assert_eq!(names, vec![row(["c"]), row(["d"])]);
}

#[test]
fn test_iterrows_is_lazy_and_restartable() {
    let p = cities().filter(Compare::parse("borough == CA").unwrap());
    let mut it = p.iterrows();
    assert_eq!(it.next().unwrap().unwrap(), (RowId::new(1), row(["LA", "CA"])));
    drop(it);

    let all: Vec<_> = p.iterrows().collect::<Result<_, _>>().unwrap();
    assert_eq!(all.len(), 2);
    let again: Vec<_> = p.iterrows().collect::<Result<_, _>>().unwrap();
    assert_eq!(all, again);
}

/// Source that counts how many readers were opened and released.
struct TrackedSource {
    schema: Schema,
    rows: usize,
    fail_at: Option<usize>,
    opened: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

struct TrackedReader {
    next: usize,
    rows: usize,
    fail_at: Option<usize>,
    released: Arc<AtomicUsize>,
}

impl Iterator for TrackedReader {
    type Item = Result<(RowId, Row), IoError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.rows {
            return None;
        }
        let i = self.next;
        self.next += 1;
        if self.fail_at == Some(i) {
            return Some(Err(IoError::Malformed(format!("bad row {i}"))));
        }
        Some(Ok((RowId::new(i as u64), row([i as i64]))))
    }
}

impl Drop for TrackedReader {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl RowSource for TrackedSource {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn open(&self) -> Result<RowReader<'_>, IoError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(TrackedReader {
            next: 0,
            rows: self.rows,
            fail_at: self.fail_at,
            released: self.released.clone(),
        }))
    }
}

fn tracked(rows: usize, fail_at: Option<usize>) -> (DataPipeline, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let opened = Arc::new(AtomicUsize::new(0));
    let released = Arc::new(AtomicUsize::new(0));
    let source = TrackedSource {
        schema: Schema::from_names(["n"]),
        rows,
        fail_at,
        opened: opened.clone(),
        released: released.clone(),
    };
    (DataPipeline::from_source(source), opened, released)
}

#[test]
fn test_source_released_on_every_exit_path() {
    // normal end
    let (p, opened, released) = tracked(5, None);
    assert_eq!(p.count().unwrap(), 5);
    assert_eq!(opened.load(Ordering::SeqCst), 1);
    assert_eq!(released.load(Ordering::SeqCst), 1);

    // early stop
    let (p, _, released) = tracked(1_000, None);
    assert_eq!(p.limit(2).count().unwrap(), 2);
    assert_eq!(released.load(Ordering::SeqCst), 1);

    // source error
    let (p, _, released) = tracked(10, Some(3));
    assert!(matches!(p.count(), Err(ExecError::Source(_))));
    assert_eq!(released.load(Ordering::SeqCst), 1);

    // predicate error
    let (p, _, released) = tracked(10, None);
    let failing = FnPredicate::new("fails on 4", |r: &[Scalar]| match r[0] {
        Scalar::I64(4) => Err(OpError::Eval("cannot evaluate 4".into())),
        _ => Ok(true),
    });
    let err = p.filter(failing).collect().unwrap_err();
    assert!(matches!(err, ExecError::Operator(OpError::Eval(_))));
    assert_eq!(released.load(Ordering::SeqCst), 1);

    // iterator dropped early
    let (p, _, released) = tracked(10, None);
    let mut it = p.iterrows();
    assert!(it.next().is_some());
    drop(it);
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[test]
fn test_lookup_error_before_source_is_opened() {
    let (p, opened, _) = tracked(3, None);
    let err = p.select(["missing"]).to_df().unwrap_err();
    assert!(matches!(err, ExecError::Operator(OpError::Schema(_))));
    assert_eq!(opened.load(Ordering::SeqCst), 0);
}

#[test]
fn test_rename_move_and_delete_compose() {
    let df = cities()
        .delete(Compare::parse("city == SF").unwrap())
        .rename(["borough"], ["state"])
        .move_columns(["state"], Some(0))
        .to_df()
        .unwrap();
    assert_eq!(df.schema().names(), vec!["state", "city"]);
    assert_eq!(df.rows(), &[row(["NY", "NY"]), row(["CA", "LA"])]);
    assert_eq!(df.index(), &[RowId::new(0), RowId::new(1)]);
}

#[test]
fn test_distinct_values_and_sample() {
    let values = cities().distinct_values(Some(refs(["borough"]))).unwrap();
    assert_eq!(values.len(), 2);

    let sampled = cities().sample(2, Some(11)).collect().unwrap();
    assert_eq!(sampled.len(), 2);
    assert_eq!(sampled, cities().sample(2, Some(11)).collect().unwrap());
    assert_eq!(cities().sample(10, None).count().unwrap(), 3);
}
