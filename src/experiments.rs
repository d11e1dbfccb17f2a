use crate::cli::{ApiArgs, ExperimentsArgs};
use crate::source::{ExperimentLookup, HttpExperimentLookup};
use crate::structures::RunDate;
use anyhow::{Context, Result};
use tracing::info;

pub fn run_experiments(args: ExperimentsArgs, api: &ApiArgs) -> Result<()> {
    let date = args.date.unwrap_or_else(RunDate::today);
    let lookup = HttpExperimentLookup::new(api.settings())?;
    let ids = lookup
        .list_experiments(date)
        .with_context(|| format!("Failed to list experiments for {}", date))?;

    info!(date=%date, experiments=ids.len(), "experiments listed");
    if ids.is_empty() {
        println!("No baseline experiments found for {}", date);
    }
    for id in ids {
        println!("{id}");
    }
    Ok(())
}
