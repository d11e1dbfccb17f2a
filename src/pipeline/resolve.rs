use crate::pipeline::classify::{is_in_progress, is_terminal_success};
use crate::structures::{RawStatusRecord, ResolvedStatus};

/// Picks the authoritative status for a job out of its folder observations.
///
/// Only reported statuses take part. In folder order: the first terminal
/// success wins, then the first in-progress status, then the first reported
/// status whatever it says. With nothing reported the job is Unknown.
pub fn resolve(job_name: &str, results: &[RawStatusRecord]) -> ResolvedStatus {
    let reported: Vec<(&str, &str)> = results
        .iter()
        .filter_map(|r| r.observation.status().map(|s| (r.folder.as_str(), s)))
        .collect();

    let winner = reported
        .iter()
        .find(|(_, status)| is_terminal_success(status))
        .or_else(|| reported.iter().find(|(_, status)| is_in_progress(status)))
        .or_else(|| reported.first());

    match winner {
        Some((folder, status)) => ResolvedStatus {
            job_name: job_name.to_string(),
            status: (*status).to_string(),
            source_folder: (*folder).to_string(),
        },
        None => ResolvedStatus::unknown(job_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::structures::{NO_SOURCE_FOLDER, UNKNOWN_STATUS};

    fn transport() -> SourceError {
        SourceError::Transport("connection refused".into())
    }

    #[test]
    fn success_in_any_folder_wins() {
        let results = vec![
            RawStatusRecord::reported("F1", "Running"),
            RawStatusRecord::reported("F2", "Ended OK"),
            RawStatusRecord::failed("F3", transport()),
        ];
        let resolved = resolve("JOB", &results);
        assert_eq!(resolved.status, "Ended OK");
        assert_eq!(resolved.source_folder, "F2");
    }

    #[test]
    fn first_in_progress_wins_without_success() {
        let results = vec![
            RawStatusRecord::reported("F1", "Ended Not OK"),
            RawStatusRecord::reported("F2", "Wait Condition"),
            RawStatusRecord::reported("F3", "Running"),
        ];
        let resolved = resolve("JOB", &results);
        assert_eq!(resolved.status, "Wait Condition");
        assert_eq!(resolved.source_folder, "F2");
    }

    #[test]
    fn falls_back_to_first_reported_status() {
        let results = vec![
            RawStatusRecord::failed("F1", SourceError::Http { status: 500 }),
            RawStatusRecord::empty("F2"),
            RawStatusRecord::reported("F3", "Ended Not OK"),
            RawStatusRecord::reported("F4", "Wait User"),
        ];
        let resolved = resolve("JOB", &results);
        assert_eq!(resolved.status, "Ended Not OK");
        assert_eq!(resolved.source_folder, "F3");
    }

    #[test]
    fn nothing_reported_is_unknown() {
        let results = vec![
            RawStatusRecord::failed("F1", transport()),
            RawStatusRecord::empty("F2"),
        ];
        let resolved = resolve("JOB", &results);
        assert_eq!(resolved.status, UNKNOWN_STATUS);
        assert_eq!(resolved.source_folder, NO_SOURCE_FOLDER);
        assert!(resolved.is_unknown());

        assert!(resolve("JOB", &[]).is_unknown());
    }

    #[test]
    fn error_payload_never_becomes_a_status() {
        let results = vec![RawStatusRecord::failed(
            "F1",
            SourceError::ErrorPayload("Error: relation does not exist".into()),
        )];
        assert!(resolve("JOB", &results).is_unknown());
    }
}
