//! Terminal task to process exit code.

use crate::exit_codes::REJECTED_TASK;
use crate::swarm::{Task, TaskState};

/// Exit code for a terminal task.
///
/// The container's exit code is used verbatim, except that a rejected task
/// never ran a container and so can't report success. A task without a
/// container status maps to 0 when complete and to 255 otherwise.
pub fn map_exit_code(task: &Task) -> i32 {
    let state = task.state();
    match task.container_exit_code() {
        Some(0) if state == TaskState::Rejected => REJECTED_TASK,
        Some(code) => code,
        None if state == TaskState::Complete => 0,
        None => REJECTED_TASK,
    }
}
