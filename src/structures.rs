use crate::error::{Error, SourceError};
use crate::pipeline::aggregate::RunAggregate;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Status reported for a job no folder produced data for.
pub const UNKNOWN_STATUS: &str = "Unknown";
/// Source folder reported alongside [`UNKNOWN_STATUS`].
pub const NO_SOURCE_FOLDER: &str = "N/A";

/// Deployment environment a pipeline runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Environment {
    Dev,
    Uat,
    Prod,
}

impl Environment {
    pub const ALL: [Environment; 3] = [Environment::Dev, Environment::Uat, Environment::Prod];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "DEV",
            Environment::Uat => "UAT",
            Environment::Prod => "PROD",
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEV" => Ok(Environment::Dev),
            "UAT" | "QA" => Ok(Environment::Uat),
            "PROD" => Ok(Environment::Prod),
            _ => Err(Error::UnknownEnvironment {
                name: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Calendar date a pipeline run is evaluated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunDate(NaiveDate);

impl RunDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn today() -> Self {
        Self(chrono::Local::now().date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Scheduler `historyRunDate` form, `YYMMDD`.
    pub fn history_run_date(&self) -> String {
        self.0.format("%y%m%d").to_string()
    }

    /// `YYYY-MM-DD`, as used by the experiment lookup.
    pub fn iso(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl Display for RunDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.iso())
    }
}

impl FromStr for RunDate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = if s.len() == 6 && s.bytes().all(|b| b.is_ascii_digit()) {
            NaiveDate::parse_from_str(s, "%y%m%d")
        } else {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
        };
        parsed.map(RunDate).map_err(|_| Error::InvalidRunDate {
            input: s.to_string(),
        })
    }
}

/// One stage of a pipeline: the scheduler job and its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub job_name: String,
    pub label: String,
}

/// A row returned by the job status source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatusRecord {
    #[serde(rename = "jobId", default, deserialize_with = "null_as_empty")]
    pub job_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// What a single folder query produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum Observation {
    Reported(String),
    /// The source answered but had nothing for this job.
    Empty,
    Failed(SourceError),
}

impl Observation {
    /// Reduces a source response to the observation resolution consults:
    /// the first record wins, and a blank status counts as no data.
    pub fn from_response(response: Result<Vec<JobStatusRecord>, SourceError>) -> Self {
        match response {
            Ok(records) => match records.into_iter().next() {
                Some(record) if !record.status.trim().is_empty() => {
                    Observation::Reported(record.status)
                }
                _ => Observation::Empty,
            },
            Err(e) => Observation::Failed(e),
        }
    }

    pub fn status(&self) -> Option<&str> {
        match self {
            Observation::Reported(status) => Some(status),
            _ => None,
        }
    }
}

/// A folder observation for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawStatusRecord {
    pub folder: String,
    pub observation: Observation,
}

impl RawStatusRecord {
    pub fn reported(folder: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            observation: Observation::Reported(status.into()),
        }
    }

    pub fn empty(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            observation: Observation::Empty,
        }
    }

    pub fn failed(folder: impl Into<String>, error: SourceError) -> Self {
        Self {
            folder: folder.into(),
            observation: Observation::Failed(error),
        }
    }
}

/// The authoritative status chosen for a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedStatus {
    pub job_name: String,
    pub status: String,
    pub source_folder: String,
}

impl ResolvedStatus {
    pub fn unknown(job_name: &str) -> Self {
        Self {
            job_name: job_name.to_string(),
            status: UNKNOWN_STATUS.to_string(),
            source_folder: NO_SOURCE_FOLDER.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.source_folder == NO_SOURCE_FOLDER
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusClass {
    Completed,
    Running,
    Failed,
    Pending,
}

impl Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// State emitted after each stage is resolved.
#[derive(Debug, Clone, Serialize)]
pub struct StageSnapshot {
    /// 1-based position in the pipeline.
    pub stage_index: usize,
    pub stage_count: usize,
    pub job_name: String,
    pub label: String,
    pub observations: Vec<RawStatusRecord>,
    pub resolved: ResolvedStatus,
    pub class: StatusClass,
    pub aggregate: RunAggregate,
    pub cancelled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parsing_is_case_insensitive_with_qa_alias() {
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Dev);
        assert_eq!(" Prod ".parse::<Environment>().unwrap(), Environment::Prod);
        assert_eq!("QA".parse::<Environment>().unwrap(), Environment::Uat);
        assert!(matches!(
            "STAGING".parse::<Environment>(),
            Err(Error::UnknownEnvironment { .. })
        ));
    }

    #[test]
    fn environment_deserializes_from_any_case() {
        let envs: Vec<Environment> = serde_json::from_str(r#"["dev", "Qa", "UAT", "prod"]"#).unwrap();
        assert_eq!(
            envs,
            [Environment::Dev, Environment::Uat, Environment::Uat, Environment::Prod]
        );
        assert!(serde_json::from_str::<Environment>(r#""staging""#).is_err());
        assert_eq!(serde_json::to_string(&Environment::Uat).unwrap(), r#""UAT""#);
    }

    #[test]
    fn status_record_tolerates_null_fields() {
        let record: JobStatusRecord =
            serde_json::from_str(r#"{"jobId": null, "status": "Ended OK"}"#).unwrap();
        assert_eq!(record.job_id, "");
        assert_eq!(record.status, "Ended OK");

        let record: JobStatusRecord = serde_json::from_str(r#"{"jobId": "j1", "status": null}"#).unwrap();
        assert_eq!(record.status, "");
        assert_eq!(Observation::from_response(Ok(vec![record])), Observation::Empty);

        let record: JobStatusRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record.job_id, "");
    }

    #[test]
    fn run_date_accepts_both_forms() {
        let iso: RunDate = "2025-03-07".parse().unwrap();
        let short: RunDate = "250307".parse().unwrap();
        assert_eq!(iso, short);
        assert_eq!(iso.history_run_date(), "250307");
        assert_eq!(iso.iso(), "2025-03-07");
    }

    #[test]
    fn run_date_rejects_garbage() {
        for bad in ["", "2025-13-01", "251340", "07/03/2025", "2503070"] {
            assert!(bad.parse::<RunDate>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn first_record_wins_and_blank_status_is_empty() {
        let records = vec![
            JobStatusRecord {
                job_id: "a".into(),
                status: "Ended OK".into(),
            },
            JobStatusRecord {
                job_id: "b".into(),
                status: "Ended Not OK".into(),
            },
        ];
        assert_eq!(
            Observation::from_response(Ok(records)),
            Observation::Reported("Ended OK".into())
        );

        let blank = vec![JobStatusRecord {
            job_id: "a".into(),
            status: "  ".into(),
        }];
        assert_eq!(Observation::from_response(Ok(blank)), Observation::Empty);
        assert_eq!(Observation::from_response(Ok(Vec::new())), Observation::Empty);
        assert_eq!(
            Observation::from_response(Err(SourceError::Timeout)),
            Observation::Failed(SourceError::Timeout)
        );
    }
}
