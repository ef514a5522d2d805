//! Runs the configured task rules against Asana.
//!
//! Usage:
//!
//! ```text
//! tasksweep [--execute] [--log-level LEVEL] [--config-dir DIR] [--format text|json] -m rules
//! ```
//!
//! Without `--execute` every rule runs in report-only mode: matching tasks
//! are listed in the summary but nothing is moved. The configuration
//! directory must hold `rules.toml`; the access token comes from
//! `secrets.toml` in the same directory or from `TASKSWEEP_ASANA_TOKEN`.

use std::env;
use std::io::{self, Write};
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use mockable::DefaultClock;
use tasksweep::config::{ASANA_TOKEN_ENV, ConfigError, RulesConfig, Secrets};
use tasksweep::rule::{
    adapters::AsanaTaskTracker,
    ports::TrackerError,
    services::{RuleRegistry, RuleRunner, RunSummary, SummaryRenderError},
};
use thiserror::Error;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "tasksweep", version, about = "Moves tasks between sections by rule")]
struct Cli {
    /// Apply moves instead of only reporting them.
    #[arg(short, long)]
    execute: bool,

    /// Minimum log level written to stderr. `RUST_LOG` adds directives.
    #[arg(short, long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    /// Directory holding `rules.toml` and `secrets.toml`.
    #[arg(short, long, default_value = "config")]
    config_dir: Utf8PathBuf,

    /// Summary output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Modules to run.
    #[arg(short, long, value_enum, num_args = 1..)]
    modules: Vec<Module>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Self::ERROR,
            LogLevel::Warn => Self::WARN,
            LogLevel::Info => Self::INFO,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Trace => Self::TRACE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Module {
    Rules,
    All,
}

impl Cli {
    fn runs_rules(&self) -> bool {
        self.modules
            .iter()
            .any(|module| matches!(module, Module::Rules | Module::All))
    }
}

/// Errors that end the run before any rule could report.
#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to create tracker client: {0}")]
    Tracker(#[from] TrackerError),
    #[error(transparent)]
    Render(#[from] SummaryRenderError),
    #[error("failed to write summary: {0}")]
    Output(#[from] io::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level);
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "run aborted");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::from_default_env().add_directive(LevelFilter::from(level).into());
    // A subscriber installed by an embedding process wins.
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .is_err()
    {
        info!("tracing subscriber already installed");
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    if !cli.runs_rules() {
        writeln!(stdout, "Run had no modules to run.")?;
        return Ok(());
    }

    let rules = RulesConfig::load(&cli.config_dir)?;
    let token = Secrets::load(&cli.config_dir)?.asana_token(env::var(ASANA_TOKEN_ENV).ok())?;
    let tracker = AsanaTaskTracker::new(token)?;

    let runner = RuleRunner::new(RuleRegistry::with_builtin_rules());
    let mut loaded = runner.load_all(&rules);
    let summary = runner.run(&mut loaded, &tracker, &DefaultClock, !cli.execute);

    let rendered = render(&summary, cli.format)?;
    writeln!(stdout, "{}", rendered.trim_end())?;
    Ok(())
}

fn render(summary: &RunSummary, format: OutputFormat) -> Result<String, SummaryRenderError> {
    match format {
        OutputFormat::Text => summary.render_text(),
        OutputFormat::Json => summary.to_json(),
    }
}
