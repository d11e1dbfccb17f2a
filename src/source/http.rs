use super::{ExperimentLookup, StatusSource};
use crate::error::{Error, Result, SourceError};
use crate::structures::{JobStatusRecord, RunDate};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Prefix the experiment endpoint puts on ids when it swallowed a failure.
const ERROR_PAYLOAD_PREFIX: &str = "Error:";

/// Where the status API lives and how to talk to it.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub accept_invalid_certs: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            accept_invalid_certs: false,
        }
    }
}

impl ApiSettings {
    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), name)
    }

    fn client(&self) -> Result<Client> {
        Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(|e| Error::HttpClient(e.to_string()))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("accept", "application/json");
        match &self.api_key {
            Some(key) => request.header("x-api-key", key),
            None => request,
        }
    }
}

fn transport_error(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout
    } else {
        SourceError::Transport(e.to_string())
    }
}

fn read_body(response: Response) -> std::result::Result<String, SourceError> {
    response.text().map_err(transport_error)
}

/// Both the backend proxy's bare list and the scheduler's own envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum StatusPayload {
    List(Vec<JobStatusRecord>),
    Envelope {
        #[serde(default)]
        statuses: Vec<JobStatusRecord>,
    },
}

/// Job status lookups over the `job_status` endpoint.
pub struct HttpStatusSource {
    client: Client,
    settings: ApiSettings,
}

impl HttpStatusSource {
    pub fn new(settings: ApiSettings) -> Result<Self> {
        let client = settings.client()?;
        Ok(Self { client, settings })
    }
}

impl StatusSource for HttpStatusSource {
    fn fetch(
        &self,
        job_name: &str,
        folder: &str,
        run_date: RunDate,
        limit: usize,
    ) -> std::result::Result<Vec<JobStatusRecord>, SourceError> {
        let url = self.settings.endpoint("job_status");
        let started = Instant::now();
        let request = self.client.get(&url).query(&[
            ("limit", limit.to_string()),
            ("jobname", job_name.to_string()),
            ("folder", folder.to_string()),
            ("historyRunDate", run_date.history_run_date()),
        ]);
        let response = self
            .settings
            .authorize(request)
            .send()
            .map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(job=%job_name, folder=%folder, "no status recorded");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            warn!(job=%job_name, folder=%folder, status=status.as_u16(), "status query failed");
            return Err(SourceError::Http {
                status: status.as_u16(),
            });
        }

        let body = read_body(response)?;
        let payload: StatusPayload =
            serde_json::from_str(&body).map_err(|e| SourceError::Decode(e.to_string()))?;
        let records = match payload {
            StatusPayload::List(records) => records,
            StatusPayload::Envelope { statuses } => statuses,
        };
        debug!(
            job=%job_name,
            folder=%folder,
            records=records.len(),
            elapsed_ms=started.elapsed().as_millis(),
            "status query answered"
        );
        Ok(records)
    }
}

#[derive(Deserialize)]
struct ExperimentRow {
    experiment_id: String,
}

/// Experiment id lookups over the `experiments` endpoint.
pub struct HttpExperimentLookup {
    client: Client,
    settings: ApiSettings,
}

impl HttpExperimentLookup {
    pub fn new(settings: ApiSettings) -> Result<Self> {
        let client = settings.client()?;
        Ok(Self { client, settings })
    }
}

impl ExperimentLookup for HttpExperimentLookup {
    fn list_experiments(&self, date: RunDate) -> std::result::Result<Vec<String>, SourceError> {
        let url = self.settings.endpoint("experiments");
        let request = self.client.get(&url).query(&[("date", date.iso())]);
        let response = self
            .settings
            .authorize(request)
            .send()
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
            });
        }

        let body = read_body(response)?;
        let rows: Vec<ExperimentRow> =
            serde_json::from_str(&body).map_err(|e| SourceError::Decode(e.to_string()))?;

        // The endpoint reports its own failures as a fake experiment id.
        if let Some(row) = rows
            .iter()
            .find(|r| r.experiment_id.starts_with(ERROR_PAYLOAD_PREFIX))
        {
            let message = row.experiment_id[ERROR_PAYLOAD_PREFIX.len()..].trim();
            return Err(SourceError::ErrorPayload(message.to_string()));
        }

        Ok(rows.into_iter().map(|r| r.experiment_id).collect())
    }
}
