mod context;
mod error;
mod shutdown;

pub mod prelude {
    pub use crate::context::ScenarioContext;
    pub use crate::error::{CancellationError, DeadlineError, ShutdownSignalError};
    pub use crate::shutdown::{ShutdownHandle, ShutdownListener};
}
