//! Polling a submitted service until one of its tasks stops.

use super::Console;
use crate::swarm::{Orchestrator, Task};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How polling ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// A task reached Complete, Failed or Rejected.
    Terminal(Task),
    /// The deadline passed with no terminal task.
    TimedOut,
    /// The service could not be found, so there was nothing to poll.
    NoService,
}

/// The first task in listing order that is in a terminal state.
///
/// The orchestrator does not guarantee a listing order, so with several
/// terminal tasks the pick is only as stable as the listing.
pub fn first_terminal(tasks: &[Task]) -> Option<&Task> {
    tasks.iter().find(|t| t.state().is_terminal())
}

/// Poll the service's tasks every `interval` until one is terminal or
/// `deadline` passes.
///
/// Tasks are always checked once, even when the deadline has already passed.
/// The wait before each retry is capped at the time left, so a timeout is
/// reported at most one interval after the deadline. A failed task listing is
/// logged and retried on the next tick.
pub fn poll(
    orchestrator: &dyn Orchestrator,
    service_id: &str,
    deadline: Instant,
    interval: Duration,
    verbose: bool,
    console: &mut Console<'_>,
) -> PollOutcome {
    let service = match orchestrator.list_services(service_id) {
        Ok(services) => services.into_iter().next(),
        Err(e) => {
            warn!(%service_id, error = %e, "service lookup failed");
            None
        }
    };
    let Some(service) = service else {
        return PollOutcome::NoService;
    };

    if verbose {
        let updated = service
            .updated_at
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        console.line(format!("ID: {} Updated at: {}", service.id, updated));
    }

    let mut polls = 0u32;
    loop {
        polls += 1;
        match orchestrator.list_tasks(&service.id) {
            Ok(tasks) => {
                if let Some(task) = first_terminal(&tasks) {
                    debug!(task_id = %task.id, state = %task.state(), polls, "task finished");
                    return PollOutcome::Terminal(task.clone());
                }
            }
            Err(e) => warn!(%service_id, error = %e, "task listing failed"),
        }

        if verbose {
            console.print(".");
        }

        let now = Instant::now();
        if now >= deadline {
            debug!(%service_id, polls, "deadline passed");
            return PollOutcome::TimedOut;
        }
        thread::sleep(interval.min(deadline - now));
    }
}
