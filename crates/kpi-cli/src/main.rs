//! KPI Objectives CLI
//!
//! The `kpi` command validates KPI task rows and writes their objectives.
//!
//! ## Commands
//!
//! - `process`: Run a single or bulk submission through the pipeline
//! - `deadline`: Show how a deadline string is normalized
//! - `seed`: Print the variation seed for a row identity
//! - `catalog`: Validate a phrase catalog and print its digest

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kpi_core::{
    obs, process_submission, process_submission_parallel, variation_seed, BatchReport, Catalog,
    DeadlineParser, PipelineConfig, PipelineContext, Submission, YearPolicy,
};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "kpi")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "KPI row validation and objective generation", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a submission and print the finished rows
    Process {
        /// Submission JSON file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pipeline configuration (TOML)
        #[arg(short, long, env = "KPI_CONFIG")]
        config: Option<PathBuf>,

        /// Phrase catalog (JSON); the built-in catalog is used if omitted
        #[arg(long, env = "KPI_CATALOG")]
        catalog: Option<PathBuf>,

        /// Override the reference year
        #[arg(long)]
        reference_year: Option<i32>,

        /// Override the year policy (`strict` or `lenient`)
        #[arg(long)]
        year_policy: Option<YearPolicy>,

        /// Process rows on the blocking worker pool
        #[arg(long)]
        parallel: bool,

        /// Print only the batch summary
        #[arg(long)]
        summary_only: bool,
    },

    /// Normalize a deadline string
    Deadline {
        /// Deadline text as submitted
        text: String,

        /// Year to compare against (default: current UTC year)
        #[arg(long)]
        reference_year: Option<i32>,
    },

    /// Print the variation seed for a row identity
    Seed {
        #[arg(long)]
        role: String,

        #[arg(long)]
        task_type: String,

        #[arg(long, default_value = "")]
        company: String,

        #[arg(long)]
        row_id: i64,
    },

    /// Validate a phrase catalog and print its digest
    Catalog {
        /// Catalog file (default: built-in catalog)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    kpi_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Process {
            input,
            output,
            config,
            catalog,
            reference_year,
            year_policy,
            parallel,
            summary_only,
        } => {
            let mut config = PipelineConfig::load(config.as_deref())
                .context("Failed to load pipeline configuration")?;
            if let Some(year) = reference_year {
                config = config.with_reference_year(year);
            }
            if let Some(policy) = year_policy {
                config = config.with_year_policy(policy);
            }
            cmd_process(
                &input,
                output.as_deref(),
                config,
                catalog.as_deref(),
                parallel,
                summary_only,
            )
            .await
        }
        Commands::Deadline {
            text,
            reference_year,
        } => cmd_deadline(&text, reference_year),
        Commands::Seed {
            role,
            task_type,
            company,
            row_id,
        } => {
            println!("{}", variation_seed(&role, &task_type, &company, row_id));
            Ok(())
        }
        Commands::Catalog { path } => cmd_catalog(path.as_deref()),
    }
}

fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    let catalog = match path {
        Some(path) => Catalog::from_path(path)
            .with_context(|| format!("Failed to load catalog from {:?}", path))?,
        None => Catalog::builtin().context("Built-in catalog failed validation")?,
    };
    obs::emit_catalog_loaded(
        catalog.digest(),
        catalog.templates().len(),
        catalog.document().matrix.len(),
    );
    Ok(catalog)
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read submission from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path).context(format!("Failed to read {:?}", path))
    }
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, &json).context(format!("Failed to write to {:?}", path))?;
            info!("Wrote report to {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

async fn cmd_process(
    input: &Path,
    output: Option<&Path>,
    config: PipelineConfig,
    catalog_path: Option<&Path>,
    parallel: bool,
    summary_only: bool,
) -> Result<()> {
    let catalog = Arc::new(load_catalog(catalog_path)?);
    let ctx = PipelineContext::new(catalog, config).context("Failed to build pipeline")?;

    let text = read_input(input)?;
    let submission = Submission::from_json(&text).context("Submission rejected")?;

    let report: BatchReport = if parallel {
        process_submission_parallel(Arc::new(ctx), submission).await?
    } else {
        process_submission(&ctx, submission)?
    };

    if summary_only {
        write_json(&report.summary, output)
    } else {
        write_json(&report, output)
    }
}

fn cmd_deadline(text: &str, reference_year: Option<i32>) -> Result<()> {
    let year = reference_year.unwrap_or_else(|| PipelineConfig::default().resolve_reference_year());
    let parser = DeadlineParser::new().context("Failed to compile deadline grammars")?;
    let result = parser.parse(text, year);

    #[derive(Serialize)]
    struct DeadlineReport<'a> {
        input: &'a str,
        reference_year: i32,
        canonical: Option<String>,
        #[serde(flatten)]
        result: kpi_core::DeadlineResult,
    }

    write_json(
        &DeadlineReport {
            input: text,
            reference_year: year,
            canonical: result.canonical(),
            result,
        },
        None,
    )
}

fn cmd_catalog(path: Option<&Path>) -> Result<()> {
    let catalog = load_catalog(path)?;
    let doc = catalog.document();

    println!("Digest: {}", catalog.digest());
    println!("Version: {}", doc.version);
    println!("Matrix buckets: {}", doc.matrix.len());
    println!("Templates: {}", doc.templates.len());
    println!("Verbs: {}", doc.verbs.len());
    println!("Tail rules: {}", doc.tails.len());
    println!("Synonyms: {}", catalog.synonyms().len());

    Ok(())
}
