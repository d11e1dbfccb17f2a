pub mod aggregate;
pub mod classify;
pub mod definition;
pub mod engine;
pub mod report;
pub mod resolve;
pub mod status;

pub use aggregate::RunAggregate;
pub use classify::classify;
pub use engine::{AggregationEngine, CancelToken, Run};
pub use report::RunReport;
pub use resolve::resolve;

use crate::cli::StagesArgs;
use crate::config::PipelineConfig;
use anyhow::Result;
use colored::Colorize;

/// Prints the stage list and folder set of one environment.
pub fn run_stages(args: StagesArgs, config: &PipelineConfig) -> Result<()> {
    let pipeline = config.pipeline(args.env)?;
    let stages = pipeline.stages(&config.labels);

    println!("{} pipeline, {} stages", args.env.to_string().bold(), stages.len());
    println!("Folders: {}", pipeline.folders.join(", "));
    for (i, stage) in stages.iter().enumerate() {
        println!("{:>3}. {:<20} {}", i + 1, stage.label, stage.job_name.dimmed());
    }
    Ok(())
}
