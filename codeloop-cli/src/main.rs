//! # codeloop CLI
//!
//! Runs one assistant round inside the orchestrator's container.
//!
//! Usage:
//!   codeloop [OPTIONS] [generate]
//!   codeloop [OPTIONS] scaffold
//!
//! Examples:
//!   codeloop
//!   codeloop --explanation-out /out/app/explanation --next-out /out/state/next
//!   codeloop --spec ./spec --prior-source ./app.py --source-out ./out/app.py
//!   codeloop scaffold --next-out /out/state/next
//!
//! Credentials come from `PREM_API_KEY` and `PREM_PROJECT_ID`, optionally
//! loaded from a `.ayup-env` file first. Exit status is 0 on success, 2 when
//! configuration or inputs are wrong, 1 when the completion call fails.

use clap::{Args, Parser, Subcommand};
use codeloop_runner::provider::prem::DEFAULT_BASE_URL;
use codeloop_runner::{
    scaffold, AssistantName, Credentials, Error, GenerationTarget, IoPaths, PremProvider,
    ProviderConfig, Result, Runner, RunnerConfig,
};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "codeloop")]
#[command(author, version, about = "codeloop - one round of LLM code generation")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    paths: PathArgs,

    /// Port the generated app must listen on
    #[arg(long, global = true, env = "CODELOOP_PORT", default_value_t = 5000)]
    port: u16,

    /// Assistant the orchestrator should run next (written to --next-out)
    #[arg(long, global = true, env = "CODELOOP_NEXT_ASSISTANT", default_value = "builtin:python")]
    next_assistant: AssistantName,

    /// Completion API base URL
    #[arg(long, global = true, env = "PREM_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Model override; the project default is used otherwise
    #[arg(long, global = true, env = "PREM_MODEL")]
    model: Option<String>,

    /// Dotenv file loaded before credentials are resolved; skipped when absent
    #[arg(long, global = true, env = "CODELOOP_ENV_FILE", default_value = ".ayup-env")]
    env_file: PathBuf,

    /// Log every conversation turn and the raw response
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Ask the model for a new version of the app (default)
    Generate,
    /// Write a fixed hello-world app without calling the model
    Scaffold,
}

#[derive(Args, Debug, Clone)]
struct PathArgs {
    /// Spec describing the app
    #[arg(long, global = true, env = "CODELOOP_SPEC", default_value = "/in/app/spec")]
    spec: PathBuf,

    /// Source produced by the previous round
    #[arg(long, global = true, env = "CODELOOP_PRIOR_SOURCE", default_value = "/in/app/__main__.py")]
    prior_source: PathBuf,

    /// Raw answer from the previous round
    #[arg(long, global = true, env = "CODELOOP_PRIOR_EXPLANATION", default_value = "/in/app/explanation")]
    prior_explanation: PathBuf,

    /// Log of the previous execution
    #[arg(long, global = true, env = "CODELOOP_LOG", default_value = "/in/log")]
    log: PathBuf,

    /// Correction to ask for
    #[arg(long, global = true, env = "CODELOOP_FIX", default_value = "/in/app/fix")]
    fix: PathBuf,

    /// Where the generated source is written
    #[arg(long, global = true, env = "CODELOOP_SOURCE_OUT", default_value = "/out/app/__main__.py")]
    source_out: PathBuf,

    /// Where the raw answer is written (not written when omitted)
    #[arg(long, global = true, env = "CODELOOP_EXPLANATION_OUT")]
    explanation_out: Option<PathBuf>,

    /// Where the next-assistant marker is written (not written when omitted)
    #[arg(long, global = true, env = "CODELOOP_NEXT_OUT")]
    next_out: Option<PathBuf>,
}

impl PathArgs {
    fn to_io_paths(&self) -> IoPaths {
        let mut paths = IoPaths::container_defaults()
            .with_spec(&self.spec)
            .with_prior_source(&self.prior_source)
            .with_prior_explanation(&self.prior_explanation)
            .with_log(&self.log)
            .with_fix(&self.fix)
            .with_source_out(&self.source_out);
        if let Some(path) = &self.explanation_out {
            paths = paths.with_explanation_out(path);
        }
        if let Some(path) = &self.next_out {
            paths = paths.with_next_out(path);
        }
        paths
    }
}

impl Cli {
    fn runner_config(&self) -> RunnerConfig {
        let target = GenerationTarget::python().with_port(self.port);
        let mut config = RunnerConfig::new(self.paths.to_io_paths(), target);
        if let Some(model) = &self.model {
            config = config.with_model(model);
        }
        if self.paths.next_out.is_some() {
            config = config.with_next_assistant(self.next_assistant.clone());
        }
        config
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

/// Load `path` into the process environment without overriding variables
/// that are already set. A missing file is not an error.
fn load_env_file(path: &Path) -> Result<()> {
    match dotenvy::from_path(path) {
        Ok(()) => {
            info!(path = %path.display(), "env file loaded");
            Ok(())
        }
        Err(e) if e.not_found() => {
            debug!(path = %path.display(), "env file not found");
            Ok(())
        }
        Err(e) => Err(Error::config_invalid(format!(
            "Failed to load env file '{}': {}",
            path.display(),
            e
        ))
        .with_operation("cli::load_env_file")
        .with_context("path", path.display().to_string())
        .set_source(e)),
    }
}

async fn generate(cli: &Cli) -> Result<()> {
    load_env_file(&cli.env_file)?;
    let credentials = Credentials::from_env()?;

    let provider = PremProvider::new(
        ProviderConfig::prem(credentials.api_key.clone()).with_base_url(&cli.base_url),
    )?;
    let runner = Runner::new(provider, credentials, cli.runner_config());

    let outcome = runner.run().await?;
    info!(
        blocks = outcome.blocks,
        bytes = outcome.source_bytes,
        explanation = outcome.explanation_written,
        next = outcome.next_written,
        "round complete"
    );
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Commands::Generate) {
        Commands::Generate => generate(&cli).await,
        Commands::Scaffold => scaffold::write(&cli.runner_config()),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(err) = run(cli).await {
        error!(category = %err.category(), "{}", err);
        debug!("{:?}", err);
        std::process::exit(err.exit_code());
    }
}
