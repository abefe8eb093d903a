//! Exit code constants for the swarmjob CLI.
//!
//! Codes in the 0-255 range below 10 describe failures of swarmjob itself,
//! detected before or while talking to the orchestrator. Once a task has run,
//! its container exit code is relayed verbatim instead. The two negative
//! sentinels are reserved for monitor-level outcomes that never produced a
//! container exit code.

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// Invalid request: missing image/base, bad timeout, malformed mount or env-file.
pub const USER_ERROR: i32 = 1;

/// Orchestrator unreachable or version query failed.
pub const CONNECTIVITY_FAILURE: i32 = 2;

/// Log display requested but the orchestrator cannot stream service logs.
pub const CAPABILITY_FAILURE: i32 = 3;

/// A requested secret does not exist.
pub const RESOLUTION_FAILURE: i32 = 4;

/// The orchestrator rejected the service spec or an API call failed.
pub const SUBMISSION_FAILURE: i32 = 5;

/// Forced exit code for a rejected task that reported container exit code 0.
pub const REJECTED_TASK: i32 = 255;

/// The submitted service could not be found when polling started.
pub const NO_SERVICE: i32 = -999;

/// No task reached a terminal state before the deadline.
pub const TIMED_OUT: i32 = -998;
