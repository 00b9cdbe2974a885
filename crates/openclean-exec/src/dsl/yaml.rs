//! YAML → `DataPipeline` for linear pipelines.
//!
//! Example:
//! ```yaml
//! config: { head_rows: 5 }
//! source: { path: "data/people.csv" }
//! steps:
//!   - op: select
//!     columns: ["name", "age", "city"]
//!   - op: filter
//!     expr: "age >= 18"
//!   - op: rename
//!     columns: ["city"]
//!     names: ["town"]
//!   - op: update
//!     columns: ["town"]
//!     transform: upper
//!   - op: limit
//!     count: 100
//! sink: { format: csv, destination: "out/adults.csv" }
//! ```
//!
//! Column references are names, positions, or ids written as `{id: N}`.
//!
//! Sinks: `csv`, `jsonl` (both need `destination`), `distinct` (optional
//! `columns`), `count`, and `head` (optional `rows`). Without a sink the
//! pipeline returns its first rows.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use openclean_core::config::{parse_delimiter, PipelineConfig};
use openclean_core::counter::Counter;
use openclean_core::frame::DataFrame;
use openclean_core::schema::ColumnRef;
use openclean_core::types::Scalar;
use openclean_io::{CsvSource, JsonlWriter};
use openclean_operators::eval::{
    ColumnsEqual, Compare, Const, EqualsColumnMax, Not, Predicate, RowFunction, StrTransform,
};
use openclean_operators::WriteSummary;

use crate::pipeline::{DataPipeline, ExecError, StageSpec};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDoc {
    #[serde(default)]
    pub config: Option<ConfigOverrides>,
    pub source: SourceDef,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default)]
    pub sink: Option<SinkDef>,
}

/// Settings that replace the ones coming from the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    pub head_rows: Option<usize>,
    pub csv_delimiter: Option<String>,
    pub csv_has_header: Option<bool>,
}

impl ConfigOverrides {
    pub fn apply(&self, cfg: &mut PipelineConfig) -> Result<(), ExecError> {
        if let Some(n) = self.head_rows {
            cfg.head_rows = n;
        }
        if let Some(d) = &self.csv_delimiter {
            cfg.csv_delimiter = Some(delimiter(d)?);
        }
        if let Some(h) = self.csv_has_header {
            cfg.csv_has_header = h;
        }
        Ok(())
    }
}

fn delimiter(s: &str) -> Result<u8, ExecError> {
    parse_delimiter(s).ok_or_else(|| ExecError::Dsl(format!("invalid delimiter '{s}'")))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceDef {
    pub path: String,
    #[serde(default)]
    pub delimiter: Option<String>,
    #[serde(default)]
    pub has_header: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum Step {
    /// Optional `names` rename the selected columns, pairwise.
    Select {
        columns: Vec<ColumnRef>,
        #[serde(default)]
        names: Option<Vec<String>>,
    },
    Rename {
        columns: Vec<ColumnRef>,
        names: Vec<String>,
    },
    /// Without a `position` the columns go to the end.
    Move {
        columns: Vec<ColumnRef>,
        #[serde(default)]
        position: Option<usize>,
    },
    /// `column OP literal`, optionally followed by a row limit.
    Filter {
        expr: String,
        #[serde(default)]
        limit: Option<usize>,
    },
    /// Drop the rows matching `column OP literal`.
    Delete {
        expr: String,
    },
    ColumnsEqual {
        columns: Vec<ColumnRef>,
    },
    /// Keep the rows holding the maximum of `column`.
    KeepMax {
        column: ColumnRef,
    },
    Limit {
        count: usize,
    },
    Sample {
        count: usize,
        #[serde(default)]
        seed: Option<u64>,
    },
    /// Exactly one of `transform` (`upper`, `lower`, `trim`) or `value`.
    Update {
        columns: Vec<ColumnRef>,
        #[serde(default)]
        transform: Option<String>,
        #[serde(default)]
        value: Option<String>,
    },
}

impl Step {
    /// Stage specs for this step. A filter with a limit yields two stages.
    fn to_stages(&self) -> Result<Vec<StageSpec>, ExecError> {
        Ok(match self {
            Step::Select {
                columns,
                names: None,
            } => vec![StageSpec::Select(columns.clone())],
            Step::Select {
                columns,
                names: Some(names),
            } => vec![
                StageSpec::Select(columns.clone()),
                StageSpec::Rename {
                    columns: (0..columns.len()).map(ColumnRef::ByPosition).collect(),
                    names: names.clone(),
                },
            ],
            Step::Rename { columns, names } => vec![StageSpec::Rename {
                columns: columns.clone(),
                names: names.clone(),
            }],
            Step::Move { columns, position } => vec![StageSpec::Move {
                columns: columns.clone(),
                pos: *position,
            }],
            Step::Filter { expr, limit } => {
                let pred: Arc<dyn Predicate> = Arc::new(Compare::parse(expr)?);
                let mut stages = vec![StageSpec::Filter(pred)];
                stages.extend(limit.map(StageSpec::Limit));
                stages
            }
            Step::Delete { expr } => {
                let pred: Arc<dyn Predicate> = Arc::new(Compare::parse(expr)?);
                vec![StageSpec::Filter(Arc::new(Not(pred)))]
            }
            Step::ColumnsEqual { columns } => {
                vec![StageSpec::Filter(Arc::new(ColumnsEqual::new(columns.clone())))]
            }
            Step::KeepMax { column } => {
                vec![StageSpec::Filter(Arc::new(EqualsColumnMax::new(column.clone())))]
            }
            Step::Limit { count } => vec![StageSpec::Limit(*count)],
            Step::Sample { count, seed } => vec![StageSpec::Sample {
                n: *count,
                seed: *seed,
            }],
            Step::Update {
                columns,
                transform,
                value,
            } => {
                let func: Arc<dyn RowFunction> = match (transform, value) {
                    (Some(t), None) => Arc::new(t.parse::<StrTransform>()?),
                    (None, Some(v)) => Arc::new(Const(Scalar::from(v.as_str()))),
                    _ => {
                        return Err(ExecError::Dsl(
                            "update needs exactly one of 'transform' or 'value'".into(),
                        ))
                    }
                };
                vec![StageSpec::Update {
                    columns: columns.clone(),
                    func,
                }]
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "format")]
pub enum SinkDef {
    Csv {
        destination: String,
    },
    Jsonl {
        destination: String,
    },
    Distinct {
        #[serde(default)]
        columns: Option<Vec<ColumnRef>>,
    },
    Count,
    Head {
        #[serde(default)]
        rows: Option<usize>,
    },
}

impl Default for SinkDef {
    fn default() -> Self {
        SinkDef::Head { rows: None }
    }
}

/// Result of executing a parsed pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkResult {
    Written(WriteSummary),
    Distinct(Counter),
    Count(u64),
    Frame(DataFrame),
}

impl fmt::Display for SinkResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkResult::Written(s) => write!(f, "wrote {} rows", s.rows),
            SinkResult::Count(n) => write!(f, "{n}"),
            SinkResult::Distinct(counts) => {
                for (key, n) in counts.most_common() {
                    writeln!(f, "{key}\t{n}")?;
                }
                Ok(())
            }
            SinkResult::Frame(df) => {
                writeln!(f, "{}", df.schema().names().join("\t"))?;
                for (_, row) in df.iterrows() {
                    let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
                    writeln!(f, "{}", cells.join("\t"))?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParsedPipeline {
    pub doc: PipelineDoc,
    pub stages: Vec<StageSpec>,
}

/// Parse and check a YAML pipeline. Nothing is read from disk.
pub fn parse_yaml_pipeline(yaml_src: &str) -> Result<ParsedPipeline, ExecError> {
    let doc: PipelineDoc =
        serde_yaml::from_str(yaml_src).map_err(|e| ExecError::Dsl(e.to_string()))?;
    let mut stages = Vec::new();
    for step in &doc.steps {
        stages.extend(step.to_stages()?);
    }
    if let Some(cfg) = &doc.config {
        cfg.apply(&mut PipelineConfig::default())?;
    }
    tracing::debug!(steps = doc.steps.len(), stages = stages.len(), "parsed yaml pipeline");
    Ok(ParsedPipeline { doc, stages })
}

impl ParsedPipeline {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ExecError> {
        let src = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ExecError::Source(e.into()))?;
        parse_yaml_pipeline(&src)
    }

    pub fn sink(&self) -> SinkDef {
        self.doc.sink.clone().unwrap_or_default()
    }

    /// `base` with the document's `config` section and source settings
    /// applied on top.
    pub fn config(&self, base: PipelineConfig) -> Result<PipelineConfig, ExecError> {
        let mut cfg = base;
        if let Some(overrides) = &self.doc.config {
            overrides.apply(&mut cfg)?;
        }
        if let Some(d) = &self.doc.source.delimiter {
            cfg.csv_delimiter = Some(delimiter(d)?);
        }
        if let Some(h) = self.doc.source.has_header {
            cfg.csv_has_header = h;
        }
        Ok(cfg)
    }

    /// Open the source (reading its header) and append the stages.
    pub fn build(&self, base: PipelineConfig) -> Result<DataPipeline, ExecError> {
        self.build_with(self.config(base)?)
    }

    /// Like [`build`](Self::build), using `cfg` exactly as given.
    pub fn build_with(&self, cfg: PipelineConfig) -> Result<DataPipeline, ExecError> {
        let source = CsvSource::with_config(&self.doc.source.path, &cfg)?;
        let mut pipeline = DataPipeline::from_source(source).with_config(cfg);
        for stage in &self.stages {
            pipeline = pipeline.then(stage.clone());
        }
        Ok(pipeline)
    }

    /// Build the pipeline and run it into the configured sink.
    pub fn execute(&self, base: PipelineConfig) -> Result<SinkResult, ExecError> {
        let pipeline = self.build(base)?;
        run_sink(&pipeline, &self.sink())
    }
}

/// Run `pipeline` into the terminal described by `sink`.
pub fn run_sink(pipeline: &DataPipeline, sink: &SinkDef) -> Result<SinkResult, ExecError> {
    Ok(match sink {
        SinkDef::Csv { destination } => SinkResult::Written(pipeline.write_csv(destination)?),
        SinkDef::Jsonl { destination } => {
            SinkResult::Written(pipeline.write(JsonlWriter::to_path(destination)?)?)
        }
        SinkDef::Distinct { columns: None } => SinkResult::Distinct(pipeline.distinct()?),
        SinkDef::Distinct {
            columns: Some(columns),
        } => SinkResult::Distinct(pipeline.distinct_on(columns.iter().cloned())?),
        SinkDef::Count => SinkResult::Count(pipeline.count()?),
        SinkDef::Head { rows } => SinkResult::Frame(match rows {
            Some(n) => pipeline.head(*n)?,
            None => pipeline.head_default()?,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use openclean_core::id::ColumnId;
    use openclean_core::types::row;
    use std::fs;

    const PEOPLE: &str = "name,age,city\nann,34,ny\nbob,17,la\ncid,51,ny\ndee,22,sf\n";

    fn people_csv(dir: &tempfile::TempDir) -> String {
        let path = dir.path().join("people.csv");
        fs::write(&path, PEOPLE).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn parses_steps_and_sink() {
        let parsed = parse_yaml_pipeline(
            r#"
source: { path: "people.csv" }
steps:
  - op: select
    columns: ["name", 2]
  - op: filter
    expr: "name != bob"
    limit: 10
sink: { format: count }
"#,
        )
        .unwrap();
        let names: Vec<_> = parsed.stages.iter().map(StageSpec::name).collect();
        assert_eq!(names, vec!["select", "filter", "limit"]);
        assert_eq!(parsed.sink(), SinkDef::Count);
        match &parsed.stages[0] {
            StageSpec::Select(cols) => {
                assert_eq!(cols, &vec![ColumnRef::from("name"), ColumnRef::from(2usize)])
            }
            other => panic!("unexpected stage {other}"),
        }
    }

    #[test]
    fn select_names_and_column_ids() {
        let parsed = parse_yaml_pipeline(
            r#"
source: { path: "people.csv" }
steps:
  - op: select
    columns: [{ id: 2 }, 0]
    names: [town, who]
  - op: move
    columns: [who]
    position: 0
  - op: sample
    count: 3
    seed: 9
"#,
        )
        .unwrap();
        let names: Vec<_> = parsed.stages.iter().map(StageSpec::name).collect();
        assert_eq!(names, vec!["select", "rename", "move", "sample"]);
        match &parsed.stages[0] {
            StageSpec::Select(cols) => assert_eq!(
                cols,
                &vec![ColumnRef::ById(ColumnId::new(2)), ColumnRef::ByPosition(0)]
            ),
            other => panic!("unexpected stage {other}"),
        }
    }

    #[test]
    fn rejects_unknown_ops_and_bad_yaml() {
        let unknown = "source: { path: x.csv }\nsteps:\n  - op: explode\n    column: a\n";
        assert!(matches!(parse_yaml_pipeline(unknown), Err(ExecError::Dsl(_))));
        assert!(parse_yaml_pipeline("invalid: yaml: [").is_err());
        assert!(parse_yaml_pipeline("steps: []").is_err());
    }

    #[test]
    fn rejects_bad_expressions_and_updates() {
        let bad_expr = "source: { path: x.csv }\nsteps:\n  - op: filter\n    expr: age\n";
        assert!(parse_yaml_pipeline(bad_expr).is_err());

        let both = "source: { path: x.csv }\nsteps:\n  - op: update\n    columns: [a]\n    transform: upper\n    value: x\n";
        assert!(matches!(parse_yaml_pipeline(both), Err(ExecError::Dsl(_))));
    }

    #[test]
    fn config_section_overrides_base() {
        let parsed = parse_yaml_pipeline(
            "config: { head_rows: 2, csv_delimiter: \";\" }\nsource: { path: x.csv, has_header: false }\n",
        )
        .unwrap();
        let cfg = parsed.config(PipelineConfig::default()).unwrap();
        assert_eq!(cfg.head_rows, 2);
        assert_eq!(cfg.csv_delimiter, Some(b';'));
        assert!(!cfg.csv_has_header);
    }

    #[test]
    fn executes_against_a_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = format!(
            "source: {{ path: \"{}\" }}\nsteps:\n  - op: filter\n    expr: \"age >= 18\"\n  - op: update\n    columns: [city]\n    transform: upper\n  - op: select\n    columns: [city]\nsink: {{ format: distinct }}\n",
            people_csv(&dir)
        );
        let result = parse_yaml_pipeline(&src)
            .unwrap()
            .execute(PipelineConfig::default())
            .unwrap();
        let counts = match result {
            SinkResult::Distinct(counts) => counts,
            other => panic!("expected distinct counts, got {other:?}"),
        };
        assert_eq!(counts.get_value(&Scalar::from("NY")), 2);
        assert_eq!(counts.get_value(&Scalar::from("SF")), 1);
        assert_eq!(counts.get_value(&Scalar::from("LA")), 0);
    }

    #[test]
    fn delete_rename_and_move_run_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let src = format!(
            "source: {{ path: \"{}\" }}\nsteps:\n  - op: delete\n    expr: \"city == ny\"\n  - op: rename\n    columns: [city]\n    names: [town]\n  - op: move\n    columns: [town]\n    position: 0\nsink: {{ format: head, rows: 5 }}\n",
            people_csv(&dir)
        );
        let result = parse_yaml_pipeline(&src)
            .unwrap()
            .execute(PipelineConfig::default())
            .unwrap();
        let df = match result {
            SinkResult::Frame(df) => df,
            other => panic!("expected a frame, got {other:?}"),
        };
        assert_eq!(df.schema().names(), vec!["town", "name", "age"]);
        assert_eq!(df.rows(), &[row(["la", "bob", "17"]), row(["sf", "dee", "22"])]);
    }

    #[test]
    fn default_sink_returns_head() {
        let dir = tempfile::tempdir().unwrap();
        let src = format!(
            "config: {{ head_rows: 2 }}\nsource: {{ path: \"{}\" }}\n",
            people_csv(&dir)
        );
        let result = parse_yaml_pipeline(&src)
            .unwrap()
            .execute(PipelineConfig::default())
            .unwrap();
        let df = match result {
            SinkResult::Frame(df) => df,
            other => panic!("expected a frame, got {other:?}"),
        };
        assert_eq!(df.num_rows(), 2);
        assert_eq!(df.rows()[1], row(["bob", "17", "la"]));
    }

    #[test]
    fn keep_max_and_jsonl_sink() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("oldest.jsonl");
        let src = format!(
            "source: {{ path: \"{}\" }}\nsteps:\n  - op: keep_max\n    column: age\n  - op: select\n    columns: [name]\nsink: {{ format: jsonl, destination: \"{}\" }}\n",
            people_csv(&dir),
            out.display()
        );
        let result = parse_yaml_pipeline(&src)
            .unwrap()
            .execute(PipelineConfig::default())
            .unwrap();
        assert_eq!(result, SinkResult::Written(WriteSummary { rows: 1 }));
        assert_eq!(fs::read_to_string(&out).unwrap(), "{\"name\":\"cid\"}\n");
    }
}
