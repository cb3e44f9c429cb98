//! Detached side-effect tasks.
//!
//! Work started here runs after `place_order` has already committed (or, for
//! profile reconciliation, in parallel with it) and is never joined by the
//! request. Each task gets a bounded deadline so an unavailable collaborator
//! cannot leak tasks; the future itself is responsible for logging its own
//! domain-level errors.

use std::future::Future;
use std::time::Duration;

use metrics::counter;
use tokio::time::timeout;
use tracing::warn;

/// Spawn `work` without joining it. If the deadline passes the task is
/// dropped where it stands and the timeout is logged and counted.
pub fn spawn_detached<F>(name: &'static str, deadline: Duration, work: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        if timeout(deadline, work).await.is_err() {
            warn!(
                task = name,
                deadline_ms = deadline.as_millis() as u64,
                "detached task exceeded its deadline and was abandoned"
            );
            counter!("checkout.detached_task.timeouts", 1, "task" => name);
        }
    });
}
