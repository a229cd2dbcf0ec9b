#![deny(missing_docs)]
//! Grader command-line interface.
//!
//! Grades a candidate's Python code with a fixed set of analysis tools and
//! ranks previously graded candidates against each other.

use clap::{Args, Parser, Subcommand, ValueEnum};
use grader_core::{
    CandidateRecord, GradeSettings, ProcessRunner, RankingTables, ReportStore, StdFileSystem,
    TokioProcessRunner, ToolConfig, ToolKind, aggregate, load_all, rank, record_schema_json,
    render_candidate_markdown, render_candidate_text, render_json, render_ranking_markdown,
    render_ranking_text,
};
use log::info;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser)]
#[command(name = "grader", version, about = "Python code grader")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate or rank candidate reports.
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },
    /// Print the JSON schema of persisted candidate records.
    Schema,
}

#[derive(Subcommand)]
enum ReportCommand {
    /// Grade one candidate and persist its report.
    Generate(GenerateArgs),
    /// Rank every graded candidate found in a directory.
    Rank(RankArgs),
}

#[derive(Args, Clone)]
struct GenerateArgs {
    /// Root of the candidate's source tree.
    #[arg(long)]
    source: PathBuf,
    /// Package directory inside the source root to grade.
    #[arg(long)]
    package: Option<String>,
    /// Name of the report directory to create.
    #[arg(long)]
    report: String,
    /// Candidate name stored in the record.
    #[arg(long)]
    candidate: String,
    /// Replace an existing report with the same name.
    #[arg(long)]
    overwrite: bool,
    /// Directory holding generated reports.
    #[arg(long, env = "GRADER_REPORTS_DIR", default_value = "reports")]
    reports_dir: PathBuf,
    /// Python interpreter used to launch the tools.
    #[arg(long, env = "GRADER_PYTHON", default_value = grader_core::DEFAULT_PYTHON)]
    python: String,
    /// Per-tool timeout in seconds.
    #[arg(
        long,
        env = "GRADER_TIMEOUT_SECS",
        default_value_t = grader_core::DEFAULT_TIMEOUT.as_secs()
    )]
    timeout: u64,
    /// Tools to run (repeatable or comma-separated); all tools when omitted.
    #[arg(long = "tool", value_delimiter = ',')]
    tools: Vec<String>,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Clone)]
struct RankArgs {
    /// Name of the ranking directory to create.
    #[arg(long)]
    report: String,
    /// Directory whose subdirectories hold candidate reports.
    #[arg(long, env = "GRADER_REPORTS_DIR", default_value = "reports")]
    candidates: PathBuf,
    /// Replace an existing ranking with the same name.
    #[arg(long)]
    overwrite: bool,
    /// Directory holding generated rankings.
    #[arg(long, env = "GRADER_RANKINGS_DIR", default_value = "rankings")]
    rankings_dir: PathBuf,
    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Clone)]
struct OutputArgs {
    /// Output format for the printed summary.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write the summary to a file instead of stdout.
    #[arg(long = "report-output")]
    report_output: Option<PathBuf>,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> CliResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Report { command } => match command {
            ReportCommand::Generate(args) => run_generate(args).await?,
            ReportCommand::Rank(args) => run_rank(args).await?,
        },
        Commands::Schema => println!("{}", record_schema_json()?),
    }

    Ok(())
}

#[cfg(test)]
fn main() {}

async fn run_generate(args: GenerateArgs) -> CliResult<()> {
    let record = generate_record(&args, TokioProcessRunner::new()).await?;
    emit_record(&record, &args.output).await
}

async fn generate_record<R>(args: &GenerateArgs, runner: R) -> CliResult<CandidateRecord>
where
    R: ProcessRunner + Send + 'static,
{
    let store = ReportStore::new(StdFileSystem::new(), &args.reports_dir);
    let report_path = store.check_available(&args.report, args.overwrite)?;
    let settings = grade_settings(args, report_path);
    let configs = select_tools(&settings, &args.tools)?;
    let report = args.report.clone();
    let candidate = args.candidate.clone();

    info!(
        "grading {candidate} from {}",
        settings.code_dir().display()
    );
    let record = tokio::task::spawn_blocking(move || -> grader_core::Result<CandidateRecord> {
        let record = aggregate(&candidate, &settings, &configs, &runner)?;
        store.save_record(&report, &record, &render_candidate_markdown(&record))?;
        Ok(record)
    })
    .await??;
    Ok(record)
}

async fn run_rank(args: RankArgs) -> CliResult<()> {
    let tables = rank_candidates(&args).await?;
    emit_ranking(&tables, &args.output).await
}

async fn rank_candidates(args: &RankArgs) -> CliResult<RankingTables> {
    let store = ReportStore::new(StdFileSystem::new(), &args.rankings_dir);
    store.check_available(&args.report, args.overwrite)?;
    let candidates = args.candidates.clone();
    let report = args.report.clone();

    let tables = tokio::task::spawn_blocking(move || -> grader_core::Result<RankingTables> {
        let set = load_all(&StdFileSystem::new(), &candidates)?;
        info!(
            "loaded {} candidates from {} ({} skipped)",
            set.len(),
            candidates.display(),
            set.skipped.len()
        );
        let tables = rank(&set);
        store.save_ranking(&report, &tables, &render_ranking_markdown(&tables))?;
        Ok(tables)
    })
    .await??;
    Ok(tables)
}

fn select_tools(settings: &GradeSettings, ids: &[String]) -> CliResult<Vec<ToolConfig>> {
    let mut selected = Vec::new();
    for id in ids.iter().filter(|id| !id.trim().is_empty()) {
        let tool = ToolKind::parse(id).ok_or_else(|| format!("unknown tool: {id}"))?;
        selected.push(tool);
    }
    Ok(ToolConfig::all_defaults(settings)
        .into_iter()
        .filter(|config| selected.is_empty() || selected.contains(&config.tool))
        .collect())
}

fn grade_settings(args: &GenerateArgs, report_path: PathBuf) -> GradeSettings {
    let mut settings = GradeSettings::new(&args.source, absolute(report_path));
    settings.package = args
        .package
        .as_deref()
        .map(str::trim)
        .filter(|package| !package.is_empty())
        .map(str::to_string);
    settings.python = args.python.clone();
    settings.timeout = Duration::from_secs(args.timeout.max(1));
    settings
}

// Tools run from the source root, so output paths handed to them must not be
// relative to the caller's directory.
fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(&path))
        .unwrap_or(path)
}

async fn emit_record(record: &CandidateRecord, output: &OutputArgs) -> CliResult<()> {
    let contents = match output.format {
        OutputFormat::Text => render_candidate_text(record),
        OutputFormat::Markdown => render_candidate_markdown(record),
        OutputFormat::Json => render_json(record)?,
    };
    emit_output(output, contents).await
}

async fn emit_ranking(tables: &RankingTables, output: &OutputArgs) -> CliResult<()> {
    let contents = match output.format {
        OutputFormat::Text => render_ranking_text(tables),
        OutputFormat::Markdown => render_ranking_markdown(tables),
        OutputFormat::Json => render_json(tables)?,
    };
    emit_output(output, contents).await
}

async fn emit_output(output: &OutputArgs, contents: String) -> CliResult<()> {
    if let Some(path) = &output.report_output {
        if let Some(parent) = path.parent().filter(|parent| parent != &Path::new("")) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await?;
    } else {
        print!("{contents}");
    }
    Ok(())
}
