use crate::config::PipelineConfig;
use crate::error::{Error, Result, SourceError};
use crate::pipeline::aggregate::RunAggregate;
use crate::pipeline::classify::classify;
use crate::pipeline::report::RunReport;
use crate::pipeline::resolve::resolve;
use crate::source::{StatusSource, DEFAULT_LIMIT};
use crate::structures::{
    Environment, Observation, RawStatusRecord, ResolvedStatus, RunDate, StageDefinition,
    StageSnapshot, StatusClass,
};
use chrono::Utc;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Shared flag that stops a run between stages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Resolves every stage of an environment's pipeline against a status source.
pub struct AggregationEngine<S> {
    source: S,
    config: PipelineConfig,
    limit: usize,
}

impl<S: StatusSource> AggregationEngine<S> {
    pub fn new(source: S, config: PipelineConfig) -> Self {
        Self {
            source,
            config,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Records requested per status query.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Starts a run. Nothing is queried until the returned iterator is pulled.
    ///
    /// Fails when `environment` has no pipeline configured, or when the
    /// run's folder query workers cannot be started.
    pub fn run(&self, environment: Environment, run_date: RunDate) -> Result<Run<'_, S>> {
        let pipeline = self.config.pipeline(environment)?;
        let stages = pipeline.stages(&self.config.labels);
        // One worker per folder, so a stage costs its slowest folder.
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(pipeline.folders.len().max(1))
            .thread_name(move |i| format!("flowscope-{}-folder-{i}", environment.as_str()))
            .build()
            .map_err(|e| Error::WorkerPool(e.to_string()))?;
        info!(
            env=%environment,
            run_date=%run_date,
            stages=stages.len(),
            folders=pipeline.folders.len(),
            "run started"
        );
        Ok(Run {
            source: &self.source,
            environment,
            run_date,
            limit: self.limit,
            stages,
            folders: &pipeline.folders,
            pool,
            next_stage: 0,
            aggregate: RunAggregate::new(),
            cancel: CancelToken::new(),
            finished: false,
        })
    }
}

/// One pass over a pipeline, yielding a [`StageSnapshot`] per stage in order.
pub struct Run<'a, S> {
    source: &'a S,
    environment: Environment,
    run_date: RunDate,
    limit: usize,
    stages: Vec<StageDefinition>,
    folders: &'a [String],
    pool: rayon::ThreadPool,
    next_stage: usize,
    aggregate: RunAggregate,
    cancel: CancelToken,
    finished: bool,
}

impl<'a, S: StatusSource> Run<'a, S> {
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn run_date(&self) -> RunDate {
        self.run_date
    }

    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }

    /// Aggregate over the stages emitted so far; the run summary once drained.
    pub fn summary(&self) -> &RunAggregate {
        &self.aggregate
    }

    /// Drains the remaining stages into a report.
    pub fn collect_report(self) -> RunReport {
        self.collect_report_with(|_| {})
    }

    /// Like [`Run::collect_report`], handing each snapshot to `on_stage` as it
    /// is emitted.
    pub fn collect_report_with(mut self, mut on_stage: impl FnMut(&StageSnapshot)) -> RunReport {
        let started_at = Utc::now().to_rfc3339();
        let mut snapshots = Vec::with_capacity(self.stages.len());
        for snapshot in self.by_ref() {
            on_stage(&snapshot);
            snapshots.push(snapshot);
        }
        RunReport {
            environment: self.environment,
            run_date: self.run_date,
            started_at,
            finished_at: Utc::now().to_rfc3339(),
            cancelled: snapshots.iter().any(|s| s.cancelled),
            stages: snapshots,
            summary: self.aggregate,
        }
    }

    /// Queries every folder for `job_name` in parallel. Results keep folder order.
    fn observe(&self, job_name: &str) -> Vec<RawStatusRecord> {
        self.pool.install(|| self.collect_observations(job_name))
    }

    fn collect_observations(&self, job_name: &str) -> Vec<RawStatusRecord> {
        self.folders
            .par_iter()
            .map(|folder| {
                if self.cancel.is_cancelled() {
                    return RawStatusRecord::failed(folder.as_str(), SourceError::Cancelled);
                }
                let started = Instant::now();
                let response = self.source.fetch(job_name, folder, self.run_date, self.limit);
                let observation = Observation::from_response(response);
                match &observation {
                    Observation::Failed(error) => warn!(
                        job=%job_name,
                        folder=%folder,
                        error=%error,
                        "folder observation failed"
                    ),
                    _ => debug!(
                        job=%job_name,
                        folder=%folder,
                        observation=?observation,
                        elapsed_ms=started.elapsed().as_millis(),
                        "folder observed"
                    ),
                }
                RawStatusRecord {
                    folder: folder.clone(),
                    observation,
                }
            })
            .collect()
    }
}

impl<'a, S: StatusSource> Iterator for Run<'a, S> {
    type Item = StageSnapshot;

    fn next(&mut self) -> Option<StageSnapshot> {
        if self.finished || self.next_stage >= self.stages.len() {
            return None;
        }
        let index = self.next_stage;
        self.next_stage += 1;
        let stage = self.stages[index].clone();

        let started = Instant::now();
        let observations = if self.cancel.is_cancelled() {
            Vec::new()
        } else {
            self.observe(&stage.job_name)
        };

        // A stage interrupted by cancellation is reported but not resolved.
        let cancelled = self.cancel.is_cancelled();
        let (resolved, class) = if cancelled {
            self.finished = true;
            (ResolvedStatus::unknown(&stage.job_name), StatusClass::Pending)
        } else {
            let resolved = resolve(&stage.job_name, &observations);
            let class = classify(&resolved.status);
            (resolved, class)
        };
        self.aggregate.record(class);

        if cancelled {
            warn!(env=%self.environment, stage=index + 1, job=%stage.job_name, "run cancelled");
        } else {
            info!(
                env=%self.environment,
                stage=index + 1,
                job=%stage.job_name,
                status=%resolved.status,
                folder=%resolved.source_folder,
                class=%class,
                progress=self.aggregate.progress_percent,
                elapsed_ms=started.elapsed().as_millis(),
                "stage resolved"
            );
        }

        Some(StageSnapshot {
            stage_index: index + 1,
            stage_count: self.stages.len(),
            job_name: stage.job_name,
            label: stage.label,
            observations,
            resolved,
            class,
            aggregate: self.aggregate,
            cancelled,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            return (0, Some(0));
        }
        let remaining = self.stages.len() - self.next_stage;
        // Cancellation can end the run early.
        (0, Some(remaining))
    }
}
