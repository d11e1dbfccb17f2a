use flowscope::source::{ApiSettings, ExperimentLookup, HttpExperimentLookup, HttpStatusSource, StatusSource};
use flowscope::{AggregationEngine, Environment, PipelineConfig, RunDate, SourceError, StatusClass};
use httpmock::prelude::*;
use serde_json::json;
use std::time::Duration;

fn settings(server: &MockServer) -> ApiSettings {
    ApiSettings {
        base_url: server.url("/api"),
        api_key: None,
        timeout: Duration::from_secs(5),
        accept_invalid_certs: false,
    }
}

fn date() -> RunDate {
    "2025-03-07".parse().unwrap()
}

#[test]
fn fetch_sends_scheduler_query_parameters() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/job_status")
            .query_param("jobname", "D1_PPE_INSERT")
            .query_param("folder", "D1_PPE_BASELINE")
            .query_param("historyRunDate", "250307")
            .query_param("limit", "1000")
            .header("x-api-key", "secret");
        then.status(200).json_body(json!([
            {"jobId": "ctm:00abc", "status": "Ended OK"},
            {"jobId": "ctm:00abd", "status": "Ended Not OK"}
        ]));
    });

    let mut settings = settings(&server);
    settings.api_key = Some("secret".into());
    let source = HttpStatusSource::new(settings).unwrap();
    let records = source
        .fetch("D1_PPE_INSERT", "D1_PPE_BASELINE", date(), 1000)
        .unwrap();

    mock.assert();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].job_id, "ctm:00abc");
    assert_eq!(records[0].status, "Ended OK");
}

#[test]
fn fetch_accepts_scheduler_envelope() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/job_status");
        then.status(200).json_body(json!({
            "statuses": [{"jobId": "ctm:1", "status": "Wait Condition", "folder": "X"}],
            "returned": 1,
            "total": 1
        }));
    });

    let source = HttpStatusSource::new(settings(&server)).unwrap();
    let records = source.fetch("JOB", "F", date(), 10).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, "Wait Condition");
}

#[test]
fn null_job_id_does_not_discard_the_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/job_status");
        then.status(200).json_body(json!({
            "statuses": [{"jobId": null, "status": "Ended OK"}]
        }));
    });

    let source = HttpStatusSource::new(settings(&server)).unwrap();
    let records = source.fetch("JOB", "F", date(), 10).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].job_id, "");
    assert_eq!(records[0].status, "Ended OK");
}

#[test]
fn not_found_is_an_empty_answer() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/job_status");
        then.status(404)
            .json_body(json!({"detail": "No job statuses found."}));
    });

    let source = HttpStatusSource::new(settings(&server)).unwrap();
    assert_eq!(source.fetch("JOB", "F", date(), 10).unwrap(), Vec::new());
}

#[test]
fn server_error_is_a_source_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/job_status");
        then.status(500)
            .json_body(json!({"detail": "API request failed"}));
    });

    let source = HttpStatusSource::new(settings(&server)).unwrap();
    assert_eq!(
        source.fetch("JOB", "F", date(), 10).unwrap_err(),
        SourceError::Http { status: 500 }
    );
}

#[test]
fn garbage_body_is_a_decode_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/job_status");
        then.status(200).body("<html>proxy error</html>");
    });

    let source = HttpStatusSource::new(settings(&server)).unwrap();
    assert!(matches!(
        source.fetch("JOB", "F", date(), 10),
        Err(SourceError::Decode(_))
    ));
}

#[test]
fn slow_source_times_out() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/job_status");
        then.status(200)
            .delay(Duration::from_millis(800))
            .json_body(json!([]));
    });

    let mut settings = settings(&server);
    settings.timeout = Duration::from_millis(100);
    let source = HttpStatusSource::new(settings).unwrap();
    assert_eq!(
        source.fetch("JOB", "F", date(), 10).unwrap_err(),
        SourceError::Timeout
    );
}

#[test]
fn unreachable_source_is_a_transport_error() {
    let settings = ApiSettings {
        base_url: "http://127.0.0.1:1/api".into(),
        timeout: Duration::from_secs(2),
        ..ApiSettings::default()
    };
    let source = HttpStatusSource::new(settings).unwrap();
    assert!(matches!(
        source.fetch("JOB", "F", date(), 10),
        Err(SourceError::Transport(_)) | Err(SourceError::Timeout)
    ));
}

#[test]
fn engine_over_http_resolves_across_folders() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/job_status")
            .query_param("folder", "D1_PPE_BASELINE");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/job_status")
            .query_param("folder", "D1_PPE_BASELINE-0700");
        then.status(200)
            .json_body(json!([{"jobId": "ctm:7", "status": "Ended OK"}]));
    });

    let source = HttpStatusSource::new(settings(&server)).unwrap();
    let engine = AggregationEngine::new(source, PipelineConfig::builtin());
    let snapshots: Vec<_> = engine.run(Environment::Dev, date()).unwrap().collect();

    assert_eq!(snapshots.len(), 24);
    assert!(snapshots.iter().all(|s| s.class == StatusClass::Completed));
    assert!(snapshots
        .iter()
        .all(|s| s.resolved.source_folder == "D1_PPE_BASELINE-0700"));
    assert_eq!(snapshots[23].aggregate.progress_percent, 100.0);
}

#[test]
fn lists_experiment_ids() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/experiments")
            .query_param("date", "2025-03-07");
        then.status(200).json_body(json!([
            {"experiment_id": "EXP-20250307-01"},
            {"experiment_id": "EXP-20250307-02"}
        ]));
    });

    let lookup = HttpExperimentLookup::new(settings(&server)).unwrap();
    let ids = lookup.list_experiments(date()).unwrap();
    mock.assert();
    assert_eq!(ids, vec!["EXP-20250307-01", "EXP-20250307-02"]);
}

#[test]
fn experiment_error_payload_is_not_an_id() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/experiments");
        then.status(200).json_body(json!([
            {"experiment_id": "Error: could not connect to server"}
        ]));
    });

    let lookup = HttpExperimentLookup::new(settings(&server)).unwrap();
    assert_eq!(
        lookup.list_experiments(date()).unwrap_err(),
        SourceError::ErrorPayload("could not connect to server".into())
    );
}
