//! YAML pipeline parsing and execution.

use std::fs;

use openclean::openclean_exec::dsl::{SinkDef, SinkResult};
use openclean::openclean_exec::{parse_yaml_pipeline, ParsedPipeline};
use openclean::prelude::*;

#[test]
fn test_parse_simple_pipeline() {
    let yaml = r#"
source:
  path: "data/input.csv"
steps:
  - op: filter
    expr: "id > 10"
  - op: select
    columns: ["id", "name"]
sink:
  format: csv
  destination: "output/result.csv"
"#;
    let parsed = parse_yaml_pipeline(yaml).unwrap();
    assert_eq!(parsed.stages.len(), 2);
    assert_eq!(
        parsed.sink(),
        SinkDef::Csv {
            destination: "output/result.csv".into()
        }
    );
}

#[test]
fn test_parse_invalid_yaml() {
    assert!(parse_yaml_pipeline("invalid: yaml: [").is_err());
}

#[test]
fn test_parse_missing_op_field() {
    let yaml = r#"
source: { path: "in.csv" }
steps:
  - expr: "a == 1"
"#;
    assert!(parse_yaml_pipeline(yaml).is_err());
}

#[test]
fn test_run_pipeline_file_to_csv() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("boroughs.csv");
    let output = dir.path().join("same.csv");
    fs::write(&input, "city,borough\nNY,NY\nLA,CA\nSF,CA\n").unwrap();

    let yaml_path = dir.path().join("pipeline.yaml");
    fs::write(
        &yaml_path,
        format!(
            "source: {{ path: \"{}\" }}\nsteps:\n  - op: select\n    columns: [city, borough]\n  - op: columns_equal\n    columns: [city, borough]\nsink: {{ format: csv, destination: \"{}\" }}\n",
            input.display(),
            output.display()
        ),
    )
    .unwrap();

    let parsed = ParsedPipeline::from_path(&yaml_path).unwrap();
    let result = parsed.execute(PipelineConfig::default()).unwrap();
    assert_eq!(
        result,
        SinkResult::Written(openclean::openclean_operators::WriteSummary { rows: 1 })
    );
    assert_eq!(fs::read_to_string(&output).unwrap(), "city,borough\nNY,NY\n");
}

#[test]
fn test_count_and_update_steps() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("names.csv");
    fs::write(&input, "name\n ann \nbob\n ann\n").unwrap();
    let yaml = format!(
        "source: {{ path: \"{}\" }}\nsteps:\n  - op: update\n    columns: [name]\n    transform: trim\n  - op: filter\n    expr: \"name == ann\"\nsink: {{ format: count }}\n",
        input.display()
    );
    let result = parse_yaml_pipeline(&yaml)
        .unwrap()
        .execute(PipelineConfig::default())
        .unwrap();
    assert_eq!(result, SinkResult::Count(2));
}
