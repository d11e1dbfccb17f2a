use crate::pipeline::aggregate::RunAggregate;
use crate::structures::{Environment, RunDate, StageSnapshot, StatusClass};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Everything one run produced, for export.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub environment: Environment,
    pub run_date: RunDate,
    pub started_at: String,
    pub finished_at: String,
    pub cancelled: bool,
    pub stages: Vec<StageSnapshot>,
    pub summary: RunAggregate,
}

impl RunReport {
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).context("Failed to create report file")?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self).context("Failed to write report file")?;
        Ok(())
    }

    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }

    pub fn stages_in(&self, class: StatusClass) -> impl Iterator<Item = &StageSnapshot> {
        self.stages.iter().filter(move |s| s.class == class)
    }
}
