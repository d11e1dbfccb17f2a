//! Pipeline configuration: which jobs are tracked per environment, which
//! scheduler folders they may run in, and how jobs are labelled.

use crate::error::{Error, Result};
use crate::pipeline::definition::{EnvironmentPipeline, JobEntry, LabelRule, LabelTable};
use crate::structures::Environment;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub environments: Vec<EnvironmentPipeline>,
    #[serde(default)]
    pub labels: LabelTable,
}

impl PipelineConfig {
    /// Reads and validates a JSON pipeline configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        debug!(path=?path, environments=config.environments.len(), "loaded pipeline configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for pipeline in &self.environments {
            if !seen.insert(pipeline.environment) {
                return Err(Error::InvalidConfig {
                    message: format!("environment {} is defined twice", pipeline.environment),
                });
            }
            if pipeline.folders.is_empty() {
                return Err(Error::InvalidConfig {
                    message: format!("environment {} has no folders", pipeline.environment),
                });
            }
            if let Some(blank) = pipeline.jobs.iter().find(|j| j.job_name().trim().is_empty()) {
                return Err(Error::InvalidConfig {
                    message: format!(
                        "environment {} has a job with an empty name ({:?})",
                        pipeline.environment, blank
                    ),
                });
            }
        }
        Ok(())
    }

    pub fn pipeline(&self, environment: Environment) -> Result<&EnvironmentPipeline> {
        self.environments
            .iter()
            .find(|p| p.environment == environment)
            .ok_or_else(|| Error::EnvironmentNotConfigured {
                environment: environment.to_string(),
            })
    }

    /// The baseline simulation pipelines as deployed in DEV, UAT and PROD.
    pub fn builtin() -> Self {
        Self {
            environments: vec![
                EnvironmentPipeline {
                    environment: Environment::Dev,
                    folders: names(&["D1_PPE_BASELINE", "D1_PPE_BASELINE-0700"]),
                    jobs: prefixed_jobs("D1_PPE_", &NON_PROD_STEPS),
                },
                EnvironmentPipeline {
                    environment: Environment::Uat,
                    folders: names(&["Q1_PPE_BASELINE"]),
                    jobs: prefixed_jobs("Q1_PPE_", &NON_PROD_STEPS),
                },
                EnvironmentPipeline {
                    environment: Environment::Prod,
                    folders: names(&["PPE_BASELINE-0200"]),
                    jobs: prod_jobs(),
                },
            ],
            labels: LabelTable::new(
                LABEL_RULES
                    .iter()
                    .map(|(pattern, label)| LabelRule::new(pattern, label))
                    .collect(),
            ),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn prefixed_jobs(prefix: &str, steps: &[&str]) -> Vec<JobEntry> {
    steps
        .iter()
        .map(|step| JobEntry::Name(format!("{prefix}{step}")))
        .collect()
}

fn prod_jobs() -> Vec<JobEntry> {
    let mut jobs = prefixed_jobs("PPE_", &PROD_STEPS);
    // The second EXEC_FUNC_COMMAND-1 run validates the PRIMARY step.
    jobs[PROD_PRIMARY_FUNC_STAGE] = JobEntry::Labelled {
        job_name: "PPE_EXEC_FUNC_COMMAND-1".to_string(),
        label: "PRIMARY FUNC VAL".to_string(),
    };
    jobs
}

const PROD_PRIMARY_FUNC_STAGE: usize = 12;

const NON_PROD_STEPS: [&str; 24] = [
    "FETCHEXPID",
    "INSERT",
    "EXEC_DCOS",
    "EXEC_STBL",
    "EXEC_STBL_HIST",
    "EXEC_RAW",
    "EXEC_RAW_DQ",
    "EXEC_RAW_FUNC",
    "EXEC_DAILY",
    "EXEC_DAILY_DQ",
    "DELETE_PRIMARY",
    "EXEC_PRIMARY",
    "EXEC_DB_REFRESH",
    "EXEC_PRIMARY_DQ",
    "PRIMARY_FUNC",
    "EXEC_POD-3",
    "MONITORANDDELETE",
    "BASELINE_STATUSUPDATE",
    "REFRESH_DAILY_STACKED",
    "REFRESH_VCCM_DAILYSTACK",
    "REFRESH_WEEKLYSTACKED",
    "REFRESH_VCCM_WEEKLYSTACKED",
    "REFRESH_BUILDPLAN",
    "REFRESH_BASELINEPURGE",
];

// PROD names the RAW/DAILY/PRIMARY steps by command number.
const PROD_STEPS: [&str; 22] = [
    "FETCHEXPID",
    "INSERT",
    "EXEC_DCOS",
    "EXEC_STBL",
    "EXEC_STBL_HIST",
    "EXEC_COMMAND-1",
    "EXEC_DQ_COMMAND-1",
    "EXEC_FUNC_COMMAND-1",
    "EXEC_COMMAND-2",
    "EXEC_DQ_COMMAND-2",
    "EXEC_COMMAND-3",
    "EXEC_DQ_COMMAND-3",
    "EXEC_FUNC_COMMAND-1",
    "EXEC_POD-3",
    "MONITORANDDELETE",
    "BASELINE_STATUSUPDATE",
    "REFRESH_DAILY_STACKED",
    "REFRESH_VCCM_DAILYSTACK",
    "REFRESH_WEEKLYSTACKED",
    "REFRESH_VCCM_WEEKLYSTACKED",
    "REFRESH_BUILDPLAN",
    "REFRESH_BASELINEPURGE",
];

// EXEC_FUNC_COMMAND-1 is listed once, as RAW FUNC VAL, with the rest of the
// COMMAND-1 family; its PRIMARY rerun is labelled in `prod_jobs`.
const LABEL_RULES: [(&str, &str); 31] = [
    ("FETCHEXPID", "FETCH EXP ID"),
    ("INSERT", "INSERT EXP ID"),
    ("EXEC_DCOS", "DCOS"),
    ("EXEC_STBL", "STBL"),
    ("EXEC_STBL_HIST", "STBL HISTORIC"),
    ("EXEC_RAW", "RAW"),
    ("EXEC_COMMAND-1", "RAW"),
    ("EXEC_RAW_DQ", "RAW DQ"),
    ("EXEC_DQ_COMMAND-1", "RAW DQ"),
    ("EXEC_RAW_FUNC", "RAW FUNC VAL"),
    ("EXEC_FUNC_COMMAND-1", "RAW FUNC VAL"),
    ("EXEC_DAILY", "DAILY"),
    ("EXEC_COMMAND-2", "DAILY"),
    ("EXEC_DAILY_DQ", "DAILY DQ"),
    ("EXEC_DQ_COMMAND-2", "DAILY DQ"),
    ("DELETE_PRIMARY", "PRIMARY DELETE"),
    ("EXEC_PRIMARY", "PRIMARY"),
    ("EXEC_COMMAND-3", "PRIMARY"),
    ("EXEC_DB_REFRESH", "DB REFRESH"),
    ("EXEC_PRIMARY_DQ", "PRIMARY DQ"),
    ("EXEC_DQ_COMMAND-3", "PRIMARY DQ"),
    ("PRIMARY_FUNC", "PRIMARY FUNC VAL"),
    ("EXEC_POD-3", "POD-3"),
    ("MONITORANDDELETE", "MONITOR AND DELETE"),
    ("BASELINE_STATUSUPDATE", "UPDATE POD STATUS"),
    ("REFRESH_DAILY_STACKED", "REPORT REFRESH"),
    ("REFRESH_VCCM_DAILYSTACK", "REPORT REFRESH"),
    ("REFRESH_WEEKLYSTACKED", "REPORT REFRESH"),
    ("REFRESH_VCCM_WEEKLYSTACKED", "REPORT REFRESH"),
    ("REFRESH_BUILDPLAN", "REPORT REFRESH"),
    ("REFRESH_BASELINEPURGE", "REPORT REFRESH"),
];
