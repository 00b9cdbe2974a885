//! openclean CLI: run and inspect stream pipelines over CSV files.

use clap::{Parser, Subcommand};
use openclean_core::config::{parse_delimiter, PipelineConfig};
use openclean_core::schema::ColumnRef;
use openclean_exec::dsl::{run_sink, SinkDef, SinkResult};
use openclean_exec::{DataPipeline, ParsedPipeline};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "openclean")]
#[command(about = "Streaming row pipelines for data cleaning", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every command that reads CSV.
#[derive(clap::Args, Debug, Default)]
struct CsvFlags {
    /// Field delimiter (single character, or `\t`)
    #[arg(long)]
    delimiter: Option<String>,

    /// Treat the first record as data instead of a header
    #[arg(long)]
    no_header: bool,

    /// Default row count for `head`
    #[arg(long)]
    head_rows: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a pipeline from a YAML file
    Run {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,

        #[command(flatten)]
        csv: CsvFlags,
    },

    /// Validate a pipeline YAML file (syntax and step check)
    Validate {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,
    },

    /// Show the stages of a pipeline and the schema after each one
    Explain {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        pipeline: PathBuf,

        #[command(flatten)]
        csv: CsvFlags,
    },

    /// Print the first rows of a CSV file
    Head {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Number of rows (defaults to the configured head size)
        #[arg(short)]
        n: Option<usize>,

        #[command(flatten)]
        csv: CsvFlags,
    },

    /// Count distinct values (or value combinations) in a CSV file
    Distinct {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Comma-separated key columns (all columns when omitted)
        #[arg(long)]
        columns: Option<String>,

        #[command(flatten)]
        csv: CsvFlags,
    },

    /// Count the rows of a CSV file
    Count {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        #[command(flatten)]
        csv: CsvFlags,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let res = match cli.command {
        Commands::Run { pipeline, csv } => run_pipeline(&pipeline, &csv),
        Commands::Validate { pipeline } => validate_pipeline(&pipeline).map(|()| {
            println!("✓ Pipeline is valid");
        }),
        Commands::Explain { pipeline, csv } => explain_pipeline(&pipeline, &csv),
        Commands::Head { input, n, csv } => {
            run_on_csv(&input, &csv, SinkDef::Head { rows: n })
        }
        Commands::Distinct {
            input,
            columns,
            csv,
        } => {
            let columns = columns.map(|c| {
                c.split(',')
                    .map(|s| ColumnRef::from(s.trim()))
                    .collect::<Vec<_>>()
            });
            run_on_csv(&input, &csv, SinkDef::Distinct { columns })
        }
        Commands::Count { input, csv } => run_on_csv(&input, &csv, SinkDef::Count),
    };

    if let Err(e) = res {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr; `RUST_LOG` selects the level (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Apply command-line flags on top of `cfg`. Flags win over the environment
/// and over a pipeline's `config` section.
fn apply_cli_overrides(
    cfg: &mut PipelineConfig,
    flags: &CsvFlags,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(d) = &flags.delimiter {
        cfg.csv_delimiter =
            Some(parse_delimiter(d).ok_or_else(|| format!("invalid delimiter '{d}'"))?);
    }
    if flags.no_header {
        cfg.csv_has_header = false;
    }
    if let Some(n) = flags.head_rows {
        cfg.head_rows = n;
    }
    Ok(())
}

fn load(
    pipeline_path: &Path,
    flags: &CsvFlags,
) -> Result<(ParsedPipeline, DataPipeline), Box<dyn std::error::Error>> {
    let parsed = ParsedPipeline::from_path(pipeline_path)?;
    let mut config = parsed.config(PipelineConfig::from_env())?;
    apply_cli_overrides(&mut config, flags)?;
    let pipeline = parsed.build_with(config)?;
    Ok((parsed, pipeline))
}

fn run_pipeline(
    pipeline_path: &Path,
    flags: &CsvFlags,
) -> Result<(), Box<dyn std::error::Error>> {
    let (parsed, pipeline) = load(pipeline_path, flags)?;
    tracing::info!(
        pipeline = %pipeline_path.display(),
        stages = pipeline.stages().len(),
        "running pipeline"
    );
    let result = run_sink(&pipeline, &parsed.sink())?;
    print_result(&result);
    Ok(())
}

fn validate_pipeline(pipeline_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let _ = ParsedPipeline::from_path(pipeline_path)?;
    Ok(())
}

fn explain_pipeline(
    pipeline_path: &Path,
    flags: &CsvFlags,
) -> Result<(), Box<dyn std::error::Error>> {
    let (parsed, pipeline) = load(pipeline_path, flags)?;

    println!("Pipeline");
    println!("========");
    println!();
    println!("Source: {}", parsed.doc.source.path);
    println!("  Columns: {}", pipeline.source_schema().names().join(", "));
    println!();
    println!("Stages:");
    let schemas = pipeline.stage_schemas()?;
    for (i, (stage, schema)) in pipeline.stages().iter().zip(&schemas).enumerate() {
        println!("  {}. {}", i + 1, stage);
        println!("     -> [{}]", schema.names().join(", "));
    }
    println!();
    println!("Sink: {:?}", parsed.sink());
    Ok(())
}

fn run_on_csv(
    input: &Path,
    flags: &CsvFlags,
    sink: SinkDef,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = PipelineConfig::from_env();
    apply_cli_overrides(&mut config, flags)?;
    let pipeline = DataPipeline::from_csv(input, config)?;
    tracing::debug!(input = %input.display(), sink = ?sink, "running on csv");
    let result = run_sink(&pipeline, &sink)?;
    print_result(&result);
    Ok(())
}

fn print_result(result: &SinkResult) {
    let out = result.to_string();
    if out.ends_with('\n') {
        print!("{out}");
    } else {
        println!("{out}");
    }
}
