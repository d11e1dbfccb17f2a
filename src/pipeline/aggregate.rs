use crate::structures::StatusClass;
use serde::Serialize;

/// Run-wide counters, updated once per resolved stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunAggregate {
    pub total: usize,
    pub completed: usize,
    pub running: usize,
    pub failed: usize,
    pub pending: usize,
    pub progress_percent: f64,
}

impl RunAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one more stage under `class`. Earlier stages are never revisited.
    pub fn record(&mut self, class: StatusClass) {
        self.total += 1;
        match class {
            StatusClass::Completed => self.completed += 1,
            StatusClass::Running => self.running += 1,
            StatusClass::Failed => self.failed += 1,
            StatusClass::Pending => {}
        }
        self.pending = self.total - (self.completed + self.running + self.failed);
        self.progress_percent = progress_percent(self.completed, self.total);
    }

    pub fn count(&self, class: StatusClass) -> usize {
        match class {
            StatusClass::Completed => self.completed,
            StatusClass::Running => self.running,
            StatusClass::Failed => self.failed,
            StatusClass::Pending => self.pending,
        }
    }
}

/// `completed / total` as a percentage rounded to two decimals; 0 for an empty run.
pub fn progress_percent(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let pct = completed as f64 / total as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}
