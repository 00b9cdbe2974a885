//! Declarative pipeline definitions.

pub mod yaml;

pub use yaml::{
    parse_yaml_pipeline, run_sink, ConfigOverrides, ParsedPipeline, PipelineDoc, SinkDef,
    SinkResult, SourceDef, Step,
};
