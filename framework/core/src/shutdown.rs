use tokio::sync::broadcast::{Receiver, Sender};

/// The root cancellation scope for a run.
///
/// One handle is created per process and shared with anything that may need to
/// stop the run early, such as the Ctrl-C handler. Every concurrent unit
/// derives its own [`ShutdownListener`] from this handle.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Sender<()>,
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self {
            sender: tokio::sync::broadcast::channel(1).0,
        }
    }

    /// Signal every listener that the run is over.
    pub fn shutdown(&self) {
        if self.sender.send(()).is_err() {
            // Nothing is listening, which is fine if all units already finished.
            log::debug!("Shutdown signalled with no remaining listeners");
        }
    }

    pub fn new_listener(&self) -> ShutdownListener {
        ShutdownListener::new(self.sender.subscribe())
    }
}

/// A per-unit view of the root cancellation scope.
#[derive(Debug)]
pub struct ShutdownListener {
    receiver: Receiver<()>,
}

impl ShutdownListener {
    pub(crate) fn new(receiver: Receiver<()>) -> Self {
        Self { receiver }
    }

    /// Point in time check whether the run has been cancelled.
    pub fn should_shutdown(&mut self) -> bool {
        use tokio::sync::broadcast::error::TryRecvError;
        match self.receiver.try_recv() {
            Ok(_) | Err(TryRecvError::Closed) => true,
            Err(_) => false,
        }
    }

    /// Wait for the run to be cancelled.
    ///
    /// Safe to race against other futures in a `select!` so that in-flight work
    /// is abandoned as soon as the signal arrives. Resolves if the handle is
    /// dropped, since no signal can arrive after that.
    pub async fn wait(&mut self) {
        let _ = self.receiver.recv().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listener_sees_shutdown() {
        let handle = ShutdownHandle::new();
        let mut listener = handle.new_listener();
        assert!(!listener.should_shutdown());

        handle.shutdown();
        assert!(listener.should_shutdown());
    }

    #[tokio::test]
    async fn wait_resolves_on_shutdown() {
        let handle = ShutdownHandle::new();
        let mut listener = handle.new_listener();

        let waiter = tokio::spawn(async move { listener.wait().await });
        handle.shutdown();
        waiter.await.expect("listener task panicked");
    }

    #[tokio::test]
    async fn wait_resolves_when_handle_dropped() {
        let handle = ShutdownHandle::new();
        let mut listener = handle.new_listener();
        drop(handle);
        listener.wait().await;
    }
}
