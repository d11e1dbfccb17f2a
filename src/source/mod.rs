//! Seams to the external systems the engine reads from.

pub mod http;

use crate::error::SourceError;
use crate::structures::{JobStatusRecord, RunDate};

pub use http::{ApiSettings, HttpExperimentLookup, HttpStatusSource};

/// Default number of records requested per status query.
pub const DEFAULT_LIMIT: usize = 1000;

/// Answers "what did this job do in this folder on this date".
///
/// An empty list means the source was reachable but has no run of the job.
/// Implementations are queried from several worker threads at once.
pub trait StatusSource: Send + Sync {
    fn fetch(
        &self,
        job_name: &str,
        folder: &str,
        run_date: RunDate,
        limit: usize,
    ) -> Result<Vec<JobStatusRecord>, SourceError>;
}

impl<S: StatusSource + ?Sized> StatusSource for &S {
    fn fetch(
        &self,
        job_name: &str,
        folder: &str,
        run_date: RunDate,
        limit: usize,
    ) -> Result<Vec<JobStatusRecord>, SourceError> {
        (**self).fetch(job_name, folder, run_date, limit)
    }
}

impl<S: StatusSource + ?Sized> StatusSource for Box<S> {
    fn fetch(
        &self,
        job_name: &str,
        folder: &str,
        run_date: RunDate,
        limit: usize,
    ) -> Result<Vec<JobStatusRecord>, SourceError> {
        (**self).fetch(job_name, folder, run_date, limit)
    }
}

/// Lists the baseline experiments started on a date.
pub trait ExperimentLookup {
    fn list_experiments(&self, date: RunDate) -> Result<Vec<String>, SourceError>;
}
