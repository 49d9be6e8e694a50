use std::time::Duration;

/// The error a unit of work resolves to when the root scope is cancelled.
#[derive(derive_more::Error, derive_more::Display, Debug)]
pub struct ShutdownSignalError {
    msg: String,
}

impl Default for ShutdownSignalError {
    fn default() -> Self {
        Self {
            msg: "execution cancelled by shutdown signal".to_string(),
        }
    }
}

/// The error a unit of work resolves to when its own deadline expires.
#[derive(derive_more::Error, derive_more::Display, Debug)]
#[display("deadline exceeded after {timeout:?}")]
pub struct DeadlineError {
    pub timeout: Duration,
}

impl DeadlineError {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// Why a [`crate::prelude::ScenarioContext`] stopped waiting.
#[derive(derive_more::Error, derive_more::Display, Debug)]
pub enum CancellationError {
    #[display("{_0}")]
    Deadline(DeadlineError),
    #[display("{_0}")]
    Shutdown(ShutdownSignalError),
}
