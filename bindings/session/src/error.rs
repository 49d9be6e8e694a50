use nodeprobe_core::prelude::CancellationError;

/// Errors surfaced by [`crate::prelude::ClusterSession`] operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The server ended the watch stream before a steady phase was observed.
    #[error("watch closed unexpectedly")]
    WatchClosed,

    /// The server reported an error event on an open watch stream.
    #[error("watch failed: {0}")]
    Watch(String),

    /// The calling unit was cancelled while the operation was in flight.
    #[error(transparent)]
    Cancelled(#[from] CancellationError),

    #[error(transparent)]
    Api(#[from] kube::Error),

    /// The remote command failed. The reason includes the captured standard
    /// error text when the command produced any.
    #[error("remote command failed: {reason}")]
    ExecFailed { reason: String },

    #[error("exec stream io: {0}")]
    Stream(#[from] std::io::Error),

    /// The exec call did not hand back one of the requested stream channels.
    #[error("exec channel {0} unavailable")]
    ExecChannel(&'static str),
}

impl SessionError {
    /// Build the failure for a finished remote command, folding the captured
    /// standard error into the reason so callers can diagnose remote script
    /// failures from the message alone.
    pub(crate) fn exec_failed(message: Option<String>, stderr: &str) -> Self {
        let mut reason = message.unwrap_or_else(|| "command terminated abnormally".to_string());
        if !stderr.is_empty() {
            reason = format!("{reason}: {stderr}");
        }
        Self::ExecFailed { reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn exec_failure_includes_captured_stderr() {
        let err = SessionError::exec_failed(
            Some("command terminated with non-zero exit code".to_string()),
            "sh: cat: /data/1.txt: No such file or directory",
        );
        let text = err.to_string();
        assert!(text.contains("non-zero exit code"));
        assert!(text.contains("No such file or directory"));
    }

    #[test]
    fn exec_failure_without_stderr_keeps_the_status_message() {
        let err = SessionError::exec_failed(None, "");
        assert_eq!(
            err.to_string(),
            "remote command failed: command terminated abnormally"
        );
    }
}
