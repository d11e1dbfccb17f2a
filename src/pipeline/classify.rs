use crate::structures::StatusClass;

/// Marker of a job that finished successfully.
pub const ENDED_OK: &str = "Ended OK";
/// Marker of a job that finished with an error.
pub const ENDED_NOT_OK: &str = "Ended Not OK";
/// Markers of a job that is queued on a condition or executing.
pub const IN_PROGRESS: [&str; 2] = ["Wait Condition", "Running"];

pub fn is_terminal_success(status: &str) -> bool {
    status.contains(ENDED_OK)
}

pub fn is_in_progress(status: &str) -> bool {
    IN_PROGRESS.iter().any(|marker| status.contains(marker))
}

/// Maps a scheduler status to its class. Unrecognised statuses are Pending.
pub fn classify(status: &str) -> StatusClass {
    if is_terminal_success(status) {
        StatusClass::Completed
    } else if is_in_progress(status) {
        StatusClass::Running
    } else if status.contains(ENDED_NOT_OK) {
        StatusClass::Failed
    } else {
        StatusClass::Pending
    }
}
