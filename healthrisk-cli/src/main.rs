//! healthrisk CLI - explainable diabetes and cardiac risk scoring

// Global invariants enforced:
// - stdout carries only command output; diagnostics go to stderr
// - Deterministic output ordering
// - Identical input yields byte-for-byte identical output

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use healthrisk_core::config::{self, ResolvedConfig, MAX_LIMIT};
use healthrisk_core::input::{CardiacRecord, DiabetesRecord};
use healthrisk_core::store::{
    AssessmentStore, FileStore, StoredAssessment, RECORD_SCHEMA_VERSION,
};
use healthrisk_core::trends::{self, summarize_history};
use healthrisk_core::{
    build_report, compare, render_json, render_text, score, AssessedInput, AssessmentReport,
    Domain, ReportOptions, RiskResult,
};
use rayon::prelude::*;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "healthrisk")]
#[command(about = "Explainable diabetes and cardiac risk scoring")]
#[command(version = env!("HEALTHRISK_VERSION"))]
struct Cli {
    /// Log debug events to stderr (overrides HEALTHRISK_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a diabetes assessment record
    Diabetes(AssessArgs),
    /// Score a cardiac assessment record
    Cardiac(AssessArgs),
    /// Compare two saved results (current first)
    Compare {
        /// Current result file (stored record, report or bare result)
        current: PathBuf,

        /// Previous result file
        previous: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Show history metrics for a subject
    History {
        #[arg(long)]
        subject: String,

        #[arg(long)]
        domain: DomainArg,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Path to config file (default: auto-discover)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Score every `*.json` record in a directory
    Batch {
        /// Directory of input records
        dir: PathBuf,

        #[arg(long)]
        domain: DomainArg,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Validate or show the configuration
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
struct AssessArgs {
    /// Input record (JSON), or `-` for stdin
    input: PathBuf,

    /// Subject identifier; enables comparison with the latest stored record
    #[arg(long)]
    subject: Option<String>,

    /// Persist the result in the store
    #[arg(long, requires = "subject")]
    save: bool,

    /// Output format
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Path to config file (default: auto-discover)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show only the top N recommendations (overrides config file)
    #[arg(long, conflicts_with = "all")]
    top: Option<usize>,

    /// Show only the top N explanation statements (overrides config file)
    #[arg(long)]
    explain_top: Option<usize>,

    /// Show every recommendation
    #[arg(long)]
    all: bool,

    /// Omit the safety disclaimer
    #[arg(long)]
    no_disclaimer: bool,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file without scoring anything
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum DomainArg {
    Diabetes,
    Cardiac,
}

impl From<DomainArg> for Domain {
    fn from(arg: DomainArg) -> Self {
        match arg {
            DomainArg::Diabetes => Domain::Diabetes,
            DomainArg::Cardiac => Domain::Cardiac,
        }
    }
}

/// Anything the `compare` command accepts as a result file
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum ResultFile {
    Stored(Box<StoredAssessment>),
    Report(Box<AssessmentReport>),
    Bare(Box<RiskResult>),
}

impl ResultFile {
    fn into_result(self) -> anyhow::Result<RiskResult> {
        match self {
            ResultFile::Stored(record) => {
                if record.schema_version != RECORD_SCHEMA_VERSION {
                    anyhow::bail!(
                        "record schema version mismatch: expected {}, got {}",
                        RECORD_SCHEMA_VERSION,
                        record.schema_version
                    );
                }
                Ok(record.result)
            }
            ResultFile::Report(report) => Ok(report.result),
            ResultFile::Bare(result) => Ok(*result),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Diabetes(args) => run_assess(Domain::Diabetes, args),
        Commands::Cardiac(args) => run_assess(Domain::Cardiac, args),
        Commands::Compare {
            current,
            previous,
            format,
        } => {
            let current = load_result_file(&current)?;
            let previous = load_result_file(&previous)?;
            let comparison = compare(&current, &previous)?;

            match format {
                OutputFormat::Json => println!("{}", comparison.to_json()?),
                OutputFormat::Text => {
                    println!(
                        "{} risk: {} -> {} ({:+}, {})",
                        comparison.domain,
                        comparison.previous_score,
                        comparison.current_score,
                        comparison.delta,
                        comparison.direction.as_str()
                    );
                    if let Some(transition) = &comparison.level_transition {
                        println!("Level: {} -> {}", transition.from, transition.to);
                    }
                    for reason in &comparison.reasons {
                        println!("  - {reason}");
                    }
                }
            }
            Ok(())
        }
        Commands::History {
            subject,
            domain,
            format,
            config: config_path,
        } => {
            let resolved = load_config(config_path.as_deref())?;
            let store = FileStore::new(&resolved.store_dir);
            let domain = Domain::from(domain);
            let records = store.history(&subject, domain)?;

            match summarize_history(&records) {
                Some(summary) => match format {
                    OutputFormat::Json => println!(
                        "{}",
                        serde_json::to_string_pretty(&summary)
                            .context("failed to serialize history to JSON")?
                    ),
                    OutputFormat::Text => print!("{}", trends::render_text(&summary)),
                },
                None => println!("No {domain} assessments recorded for {subject}."),
            }
            Ok(())
        }
        Commands::Batch {
            dir,
            domain,
            format,
        } => run_batch(&dir, Domain::from(domain), format),
        Commands::Config { action } => match action {
            ConfigAction::Validate { path } => {
                let project_root = std::env::current_dir()?;
                match config::load_and_resolve(&project_root, path.as_deref()) {
                    Ok(config) => {
                        if let Some(ref p) = config.config_path {
                            println!("Config valid: {}", p.display());
                        } else {
                            println!("No config file found. Using defaults.");
                        }
                    }
                    Err(e) => {
                        eprintln!("Config validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                }
                Ok(())
            }
            ConfigAction::Show { path } => {
                let resolved = load_config(path.as_deref())?;
                println!("Configuration:");
                if let Some(ref p) = resolved.config_path {
                    println!("  Source: {}", p.display());
                } else {
                    println!("  Source: defaults (no config file found)");
                }
                println!();
                println!("Store:");
                println!("  dir: {}", resolved.store_dir.display());
                println!();
                println!("Views:");
                println!("  recommendation_limit: {}", resolved.recommendation_limit);
                println!(
                    "  explanation_limit: {}",
                    resolved
                        .explanation_limit
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "all".to_string())
                );
                println!("  include_disclaimer: {}", resolved.include_disclaimer);
                Ok(())
            }
        },
    }
}

fn run_assess(domain: Domain, args: AssessArgs) -> anyhow::Result<()> {
    for (flag, value) in [("--top", args.top), ("--explain-top", args.explain_top)] {
        if let Some(n) = value {
            check_limit(flag, n)?;
        }
    }

    let resolved = load_config(args.config.as_deref())?;

    let json = read_input(&args.input)?;
    let input = parse_input(domain, &json)
        .with_context(|| format!("invalid input record: {}", args.input.display()))?;
    let result = score(&input)?;

    let options = report_options(&resolved, &args);

    let mut store = FileStore::new(&resolved.store_dir);
    let previous = match &args.subject {
        Some(subject) => store.latest(subject, domain)?,
        None => None,
    };
    if let Some(prev) = &previous {
        debug!(record = %prev.id, "comparing with latest stored assessment");
    }

    let mut report = build_report(result, previous.as_ref().map(|p| &p.result), &options)?;
    report.subject = args.subject.clone();

    if args.save {
        if let Some(subject) = &args.subject {
            let id = store.save(subject, &report.result)?;
            report.record_id = Some(id.to_string());
        }
    }

    match args.format {
        OutputFormat::Text => print!("{}", render_text(&report)),
        OutputFormat::Json => println!("{}", render_json(&report)?),
    }
    Ok(())
}

fn run_batch(dir: &Path, domain: Domain, format: OutputFormat) -> anyhow::Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {}", dir.display());
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    files.sort();
    info!(count = files.len(), dir = %dir.display(), "scoring batch");

    let outcomes: Vec<(PathBuf, anyhow::Result<RiskResult>)> = files
        .into_par_iter()
        .map(|path| {
            let outcome = read_input(&path)
                .and_then(|json| parse_input(domain, &json))
                .and_then(|input| score(&input).map_err(anyhow::Error::from));
            (path, outcome)
        })
        .collect();

    let failures = outcomes.iter().filter(|(_, o)| o.is_err()).count();

    match format {
        OutputFormat::Text => {
            for (path, outcome) in &outcomes {
                match outcome {
                    Ok(result) => println!(
                        "{}\t{}\t{}",
                        path.display(),
                        result.composite_score,
                        result.risk_level
                    ),
                    Err(e) => println!("{}\terror\t{:#}", path.display(), e),
                }
            }
        }
        OutputFormat::Json => {
            let entries: Vec<serde_json::Value> = outcomes
                .iter()
                .map(|(path, outcome)| match outcome {
                    Ok(result) => json!({
                        "file": path.display().to_string(),
                        "composite_score": result.composite_score,
                        "risk_level": result.risk_level,
                        "summary": healthrisk_core::summarize(result),
                    }),
                    Err(e) => json!({
                        "file": path.display().to_string(),
                        "error": format!("{e:#}"),
                    }),
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&entries)
                    .context("failed to serialize batch results to JSON")?
            );
        }
    }

    if failures > 0 {
        warn!(failures, total = outcomes.len(), "some records could not be scored");
        anyhow::bail!("{} of {} records could not be scored", failures, outcomes.len());
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        match std::env::var("HEALTHRISK_LOG") {
            Ok(value) => EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new("warn")),
            Err(_) => EnvFilter::new("warn"),
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(config_path: Option<&Path>) -> anyhow::Result<ResolvedConfig> {
    let project_root = std::env::current_dir()?;
    let resolved = config::load_and_resolve(&project_root, config_path)
        .context("failed to load configuration")?;
    if let Some(path) = &resolved.config_path {
        info!(path = %path.display(), "using config");
    }
    Ok(resolved)
}

fn check_limit(flag: &str, n: usize) -> anyhow::Result<()> {
    if n == 0 || n > MAX_LIMIT {
        anyhow::bail!("{} must be between 1 and {} (got {})", flag, MAX_LIMIT, n);
    }
    Ok(())
}

/// CLI flags override config file values
fn report_options(resolved: &ResolvedConfig, args: &AssessArgs) -> ReportOptions {
    let mut options = ReportOptions::from(resolved);
    if args.all {
        options.recommendation_limit = None;
    } else if let Some(top) = args.top {
        options.recommendation_limit = Some(top);
    }
    if args.explain_top.is_some() {
        options.explanation_limit = args.explain_top;
    }
    if args.no_disclaimer {
        options.include_disclaimer = false;
    }
    options
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        return std::io::read_to_string(std::io::stdin()).context("failed to read stdin");
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read input file: {}", path.display()))
}

fn parse_input(domain: Domain, json: &str) -> anyhow::Result<AssessedInput> {
    let input = match domain {
        Domain::Diabetes => {
            let record: DiabetesRecord =
                serde_json::from_str(json).context("failed to parse diabetes record")?;
            AssessedInput::Diabetes(record.validate()?)
        }
        Domain::Cardiac => {
            let record: CardiacRecord =
                serde_json::from_str(json).context("failed to parse cardiac record")?;
            AssessedInput::Cardiac(record.validate()?)
        }
    };
    Ok(input)
}

fn load_result_file(path: &Path) -> anyhow::Result<RiskResult> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read result file: {}", path.display()))?;
    let file: ResultFile = serde_json::from_str(&json)
        .with_context(|| format!("not a stored record, report or result: {}", path.display()))?;
    file.into_result()
        .with_context(|| format!("unusable result file: {}", path.display()))
}
