use std::time::Duration;

use tokio::time::Instant;

use crate::error::{CancellationError, DeadlineError, ShutdownSignalError};
use crate::shutdown::ShutdownListener;

/// The cancellation scope for a single unit of work.
///
/// Carries the unit's deadline, measured from the moment the context is
/// created, and a listener on the root shutdown scope. Threaded through every
/// blocking cluster call so that in-flight waits and streams are abandoned as
/// soon as either fires.
#[derive(Debug)]
pub struct ScenarioContext {
    timeout: Duration,
    deadline: Instant,
    listener: ShutdownListener,
}

impl ScenarioContext {
    pub fn new(timeout: Duration, listener: ShutdownListener) -> Self {
        Self {
            timeout,
            deadline: Instant::now() + timeout,
            listener,
        }
    }

    /// The instant at which this unit's deadline expires.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Resolves once this unit is cancelled, yielding the cause as an error
    /// value. Race against in-flight work in a `select!`.
    pub async fn cancelled(&mut self) -> CancellationError {
        tokio::select! {
            _ = tokio::time::sleep_until(self.deadline) => {
                CancellationError::Deadline(DeadlineError::new(self.timeout))
            }
            _ = self.listener.wait() => {
                CancellationError::Shutdown(ShutdownSignalError::default())
            }
        }
    }
}
