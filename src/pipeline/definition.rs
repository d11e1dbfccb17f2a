use crate::structures::{Environment, StageDefinition};
use serde::{Deserialize, Serialize};

/// Label given to jobs no rule matches.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// A job-name fragment and the label it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRule {
    pub pattern: String,
    pub label: String,
}

impl LabelRule {
    pub fn new(pattern: &str, label: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            label: label.to_string(),
        }
    }
}

/// Ordered label rules.
///
/// The longest pattern contained in the job name wins, so `EXEC_RAW_DQ`
/// beats `EXEC_RAW`. Patterns of equal length are decided by table order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelTable {
    rules: Vec<LabelRule>,
}

impl LabelTable {
    pub fn new(rules: Vec<LabelRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[LabelRule] {
        &self.rules
    }

    pub fn label_for(&self, job_name: &str) -> &str {
        let mut best: Option<&LabelRule> = None;
        for rule in &self.rules {
            if rule.pattern.is_empty() || !job_name.contains(rule.pattern.as_str()) {
                continue;
            }
            // Strictly longer only: the earlier rule keeps a tie.
            match best {
                Some(b) if rule.pattern.len() <= b.pattern.len() => {}
                _ => best = Some(rule),
            }
        }
        best.map_or(UNKNOWN_LABEL, |rule| rule.label.as_str())
    }
}

/// A job entry in a pipeline: a bare job name, or a name with a fixed label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobEntry {
    Name(String),
    Labelled { job_name: String, label: String },
}

impl JobEntry {
    pub fn job_name(&self) -> &str {
        match self {
            JobEntry::Name(name) => name,
            JobEntry::Labelled { job_name, .. } => job_name,
        }
    }
}

/// The stages and folders tracked for one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentPipeline {
    pub environment: Environment,
    pub folders: Vec<String>,
    pub jobs: Vec<JobEntry>,
}

impl EnvironmentPipeline {
    /// Stage definitions in pipeline order, labels resolved through `labels`.
    pub fn stages(&self, labels: &LabelTable) -> Vec<StageDefinition> {
        self.jobs
            .iter()
            .map(|entry| match entry {
                JobEntry::Name(name) => StageDefinition {
                    job_name: name.clone(),
                    label: labels.label_for(name).to_string(),
                },
                JobEntry::Labelled { job_name, label } => StageDefinition {
                    job_name: job_name.clone(),
                    label: label.clone(),
                },
            })
            .collect()
    }
}
