use crate::source::http::{ApiSettings, DEFAULT_API_BASE};
use crate::source::DEFAULT_LIMIT;
use crate::structures::{Environment, RunDate};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "flowscope")]
#[command(about = "Batch pipeline status dashboard", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub api: ApiArgs,

    /// JSON pipeline configuration (defaults to the built-in DEV/UAT/PROD pipelines)
    #[arg(long, global = true)]
    pub pipelines: Option<PathBuf>,

    /// Log debug events to stderr
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve every stage of a pipeline for a run date
    Status(StatusArgs),
    /// List the stages and folders tracked for an environment
    Stages(StagesArgs),
    /// List baseline experiment ids started on a date
    Experiments(ExperimentsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ApiArgs {
    /// Base URL of the status API
    #[arg(long, global = true, env = "FLOWSCOPE_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// API key sent as x-api-key
    #[arg(long, global = true, env = "FLOWSCOPE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Skip TLS certificate verification
    #[arg(long, global = true, default_value_t = false)]
    pub insecure: bool,
}

impl ApiArgs {
    pub fn settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.api_base.clone(),
            api_key: self.api_key.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            accept_invalid_certs: self.insecure,
        }
    }
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Environment to inspect (DEV, UAT/QA, PROD)
    #[arg(long)]
    pub env: Environment,

    /// Run date, YYYY-MM-DD or YYMMDD (defaults to today)
    #[arg(long)]
    pub date: Option<RunDate>,

    /// Records requested per status query
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    pub limit: usize,

    /// Print each stage snapshot as a JSON line
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Write the run report to this file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Return exit code 2 if any stage failed
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Cancel the run after this many seconds
    #[arg(long)]
    pub deadline_secs: Option<u64>,
}

#[derive(Args, Debug)]
pub struct StagesArgs {
    /// Environment to list (DEV, UAT/QA, PROD)
    #[arg(long)]
    pub env: Environment,
}

#[derive(Args, Debug)]
pub struct ExperimentsArgs {
    /// Simulation date, YYYY-MM-DD or YYMMDD (defaults to today)
    #[arg(long)]
    pub date: Option<RunDate>,
}
