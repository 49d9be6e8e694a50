use nodeprobe_session::prelude::ClusterSession;

/// Namespace every scenario workload is created in.
pub(crate) const NAMESPACE: &str = "default";

/// Best-effort removal of a scenario's workload.
///
/// Cleanup runs after the scenario body regardless of its outcome and must
/// not change that outcome, so a failed delete is logged instead of returned.
pub(crate) async fn cleanup_pod(session: &ClusterSession, namespace: &str, name: &str) {
    if let Err(error) = session.delete_pod(namespace, name).await {
        log::warn!("Failed to clean up pod {namespace}/{name}: {error}");
    }
}
