//! Status monitor for multi-stage batch pipelines.
//!
//! For a run date, every stage of an environment's pipeline is looked up in
//! each scheduler folder it may run in, the folder answers are reduced to one
//! authoritative status, classified, and folded into run-wide progress.
//! [`AggregationEngine::run`] yields one [`StageSnapshot`] per stage.

pub mod cli;
pub mod config;
pub mod error;
pub mod experiments;
pub mod pipeline;
pub mod source;
pub mod structures;

pub use config::PipelineConfig;
pub use error::{Error, Result, SourceError};
pub use pipeline::{AggregationEngine, CancelToken, Run, RunAggregate, RunReport};
pub use structures::{
    Environment, JobStatusRecord, Observation, RawStatusRecord, ResolvedStatus, RunDate,
    StageDefinition, StageSnapshot, StatusClass,
};
