use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dbalens::explain::PlanLintConfig;
use dbalens::report::{PlanReport, SchemaReport};
use dbalens::schema::lint::SchemaLintConfig;
use dbalens::{analyze_ddl, analyze_explain};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Danger-level findings were reported.
const EXIT_DANGER: u8 = 1;
/// Input could not be read or parsed.
const EXIT_INPUT_ERROR: u8 = 2;

/// dbalens - PostgreSQL schema and query plan analyzer
#[derive(Parser, Debug)]
#[command(name = "dbalens")]
#[command(about = "Lint PostgreSQL DDL and EXPLAIN ANALYZE output", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output format
    #[arg(short, long, default_value = "text", value_enum, global = true)]
    format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE", global = true)]
    output: Option<PathBuf>,

    /// Log skipped statements and clauses to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze CREATE TABLE / ALTER TABLE / CREATE INDEX statements
    Schema {
        /// DDL file, or `-` for stdin
        #[arg(value_name = "FILE", default_value = "-")]
        input: PathBuf,

        /// Report tables with more columns than this
        #[arg(long, default_value_t = SchemaLintConfig::default().wide_table_columns)]
        wide_table_columns: usize,
    },
    /// Analyze EXPLAIN (ANALYZE, FORMAT JSON) output
    Explain {
        /// Plan JSON file, or `-` for stdin
        #[arg(value_name = "FILE", default_value = "-")]
        input: PathBuf,

        /// Report sequential scans returning more rows than this
        #[arg(long, default_value_t = PlanLintConfig::default().seq_scan_rows)]
        seq_scan_rows: u64,

        /// Report nodes taking more than this share of execution time
        #[arg(long, default_value_t = PlanLintConfig::default().bottleneck_percent)]
        bottleneck_percent: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable report
    Text,
    /// Full analysis as JSON
    Json,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(has_danger) => {
            if has_danger {
                ExitCode::from(EXIT_DANGER)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("dbalens: error: {e:#}");
            ExitCode::from(EXIT_INPUT_ERROR)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("dbalens=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Run the selected analysis. Returns whether danger findings were reported.
fn run(args: Args) -> Result<bool> {
    let (rendered, has_danger) = match args.command {
        Command::Schema {
            input,
            wide_table_columns,
        } => {
            let source = read_input(&input)?;
            let config = SchemaLintConfig { wide_table_columns };
            let analysis = analyze_ddl(&source, &config)
                .with_context(|| format!("Failed to analyze {}", display_name(&input)))?;

            let rendered = match args.format {
                OutputFormat::Text => SchemaReport(&analysis).to_string(),
                OutputFormat::Json => serde_json::to_string_pretty(&analysis)?,
            };
            (rendered, analysis.has_danger())
        }
        Command::Explain {
            input,
            seq_scan_rows,
            bottleneck_percent,
        } => {
            let source = read_input(&input)?;
            let config = PlanLintConfig {
                seq_scan_rows,
                bottleneck_percent,
                ..PlanLintConfig::default()
            };
            let analysis = analyze_explain(&source, &config)
                .with_context(|| format!("Failed to analyze {}", display_name(&input)))?;

            let rendered = match args.format {
                OutputFormat::Text => PlanReport(&analysis).to_string(),
                OutputFormat::Json => serde_json::to_string_pretty(&analysis)?,
            };
            (rendered, analysis.has_danger())
        }
    };

    match &args.output {
        Some(path) => fs::write(path, &rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            print!("{}", rendered);
            if !rendered.ends_with('\n') {
                println!();
            }
        }
    }

    Ok(has_danger)
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn display_name(path: &Path) -> String {
    if is_stdin(path) {
        "<stdin>".to_string()
    } else {
        path.display().to_string()
    }
}

fn read_input(path: &Path) -> Result<String> {
    if is_stdin(path) {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read from stdin")?;
        Ok(content)
    } else {
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
    }
}
