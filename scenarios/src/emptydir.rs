use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{
    Container, EmptyDirVolumeSource, Pod, PodSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::PostParams;
use nodeprobe_core::prelude::ScenarioContext;
use nodeprobe_runner::prelude::Scenario;
use nodeprobe_session::prelude::ClusterSession;

use crate::support::{cleanup_pod, NAMESPACE};

const POD_NAME: &str = "persistent-empty-dir";
const INITIAL_IMAGE: &str = "alpine:3.10";
const UPDATED_IMAGE: &str = "alpine:3.8";

/// How long the agent is given to begin acting on the pod update before the
/// steady wait resumes. Without it the wait can observe the pre-update pod
/// still in a steady phase and pass vacuously.
const UPDATE_SETTLE: Duration = Duration::from_secs(5);

/// Checks that an emptyDir volume keeps its contents across an in-place pod
/// update. Writes a marker file, swaps the container image, and reads the
/// marker back once the pod settles again.
pub struct EmptyDir;

#[async_trait]
impl Scenario for EmptyDir {
    fn name(&self) -> &str {
        "emptydir"
    }

    fn description(&self) -> &str {
        "emptyDir should not be cleared after updating pod"
    }

    async fn run(
        &self,
        ctx: &mut ScenarioContext,
        session: Arc<ClusterSession>,
    ) -> anyhow::Result<()> {
        session
            .pods(NAMESPACE)
            .create(&PostParams::default(), &pod_spec(session.node_name()))
            .await
            .context("create pod")?;

        let outcome = check_marker_survives_update(ctx, &session).await;
        cleanup_pod(&session, NAMESPACE, POD_NAME).await;
        outcome
    }
}

async fn check_marker_survives_update(
    ctx: &mut ScenarioContext,
    session: &ClusterSession,
) -> anyhow::Result<()> {
    session
        .wait_until_steady(ctx, NAMESPACE, POD_NAME)
        .await
        .context("wait for pod creation")?;

    session
        .exec_in_container(
            ctx,
            NAMESPACE,
            POD_NAME,
            POD_NAME,
            &["sh", "-c", "date > /data/1.txt"],
        )
        .await
        .context("write marker file")?;

    let pods = session.pods(NAMESPACE);
    let mut pod = pods.get(POD_NAME).await.context("fetch pod for update")?;
    let spec = pod
        .spec
        .as_mut()
        .context("fetched pod is missing its spec")?;
    spec.containers[0].image = Some(UPDATED_IMAGE.to_string());
    pods.replace(POD_NAME, &PostParams::default(), &pod)
        .await
        .context("update pod")?;

    tokio::time::sleep(UPDATE_SETTLE).await;
    session
        .wait_until_steady(ctx, NAMESPACE, POD_NAME)
        .await
        .context("wait for pod after update")?;

    let output = session
        .exec_in_container(
            ctx,
            NAMESPACE,
            POD_NAME,
            POD_NAME,
            &["sh", "-c", "cat /data/1.txt"],
        )
        .await
        .context("read marker file back")?;
    anyhow::ensure!(
        !output.stdout.is_empty(),
        "marker file came back empty after the update"
    );
    Ok(())
}

fn pod_spec(node_name: &str) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(POD_NAME.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![Container {
                name: POD_NAME.to_string(),
                image: Some(INITIAL_IMAGE.to_string()),
                command: Some(vec![
                    "sh".to_string(),
                    "-c".to_string(),
                    "sleep 86400".to_string(),
                ]),
                volume_mounts: Some(vec![VolumeMount {
                    name: "data".to_string(),
                    mount_path: "/data".to_string(),
                    ..Default::default()
                }]),
                ..Default::default()
            }],
            restart_policy: Some("Never".to_string()),
            node_name: Some(node_name.to_string()),
            volumes: Some(vec![Volume {
                name: "data".to_string(),
                empty_dir: Some(EmptyDirVolumeSource::default()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn volume_and_mount_share_a_name() {
        let pod = pod_spec("virtual-kubelet");
        let spec = pod.spec.expect("pod must have a spec");

        let volumes = spec.volumes.as_ref().expect("pod must declare volumes");
        assert_eq!(volumes.len(), 1);
        assert_eq!(volumes[0].name, "data");
        assert!(volumes[0].empty_dir.is_some());

        let mounts = spec.containers[0]
            .volume_mounts
            .as_ref()
            .expect("container must mount the volume");
        assert_eq!(mounts[0].name, volumes[0].name);
        assert_eq!(mounts[0].mount_path, "/data");
    }

    #[test]
    fn container_outlives_the_scenario_by_sleeping() {
        let pod = pod_spec("virtual-kubelet");
        let spec = pod.spec.expect("pod must have a spec");
        let command = spec.containers[0]
            .command
            .as_ref()
            .expect("container must have a command");
        assert_eq!(command, &["sh", "-c", "sleep 86400"]);
    }
}
