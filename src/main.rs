use anyhow::Result;
use clap::Parser;
use flowscope::cli::{Cli, Commands};
use flowscope::config::PipelineConfig;
use flowscope::experiments::run_experiments;
use flowscope::pipeline::{self, status};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.pipelines {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::builtin(),
    };

    match cli.command {
        Commands::Status(args) => {
            let strict = args.strict;
            let outcome = status::run_status(args, &cli.api, config)?;
            if strict && outcome.failed_stages > 0 {
                return Ok(ExitCode::from(2));
            }
        }
        Commands::Stages(args) => {
            pipeline::run_stages(args, &config)?;
        }
        Commands::Experiments(args) => {
            run_experiments(args, &cli.api)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "flowscope=debug" } else { "flowscope=info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
