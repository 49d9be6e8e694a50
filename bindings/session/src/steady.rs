use futures::{Stream, StreamExt};
use k8s_openapi::api::core::v1::Pod;
use kube::api::WatchEvent;
use nodeprobe_core::prelude::ScenarioContext;

use crate::error::SessionError;

/// Phases in which a workload is considered steady for acceptance purposes.
const STEADY_PHASES: [&str; 3] = ["Running", "Succeeded", "Failed"];

pub(crate) fn is_steady(pod: &Pod) -> bool {
    match pod.status.as_ref().and_then(|status| status.phase.as_deref()) {
        Some(phase) => STEADY_PHASES.contains(&phase),
        None => false,
    }
}

/// Drive the watch event loop until the observed pod reaches a steady phase.
///
/// Exit conditions, checked in priority order on every iteration:
/// 1. the context is cancelled, which resolves to the cancellation cause;
/// 2. the stream ends without the session closing it, which is an error;
/// 3. the event carries a pod in a steady phase, which is success.
///
/// Transient phases keep the loop waiting. The stream is dropped on every
/// exit path, releasing the server-side watch.
pub(crate) async fn wait_for_steady_phase<S>(
    ctx: &mut ScenarioContext,
    mut events: S,
) -> Result<(), SessionError>
where
    S: Stream<Item = Result<WatchEvent<Pod>, kube::Error>> + Unpin,
{
    loop {
        tokio::select! {
            biased;
            cancelled = ctx.cancelled() => return Err(cancelled.into()),
            event = events.next() => match event {
                None => return Err(SessionError::WatchClosed),
                Some(Ok(
                    WatchEvent::Added(pod)
                    | WatchEvent::Modified(pod)
                    | WatchEvent::Deleted(pod),
                )) => {
                    if is_steady(&pod) {
                        return Ok(());
                    }
                }
                Some(Ok(WatchEvent::Error(response))) => {
                    return Err(SessionError::Watch(response.message));
                }
                Some(Ok(WatchEvent::Bookmark(_))) => {}
                Some(Err(err)) => return Err(err.into()),
            },
        }
    }
}
