use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Container, EnvVar, Pod, PodSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::PostParams;
use nodeprobe_core::prelude::ScenarioContext;
use nodeprobe_runner::prelude::Scenario;
use nodeprobe_session::prelude::ClusterSession;

use crate::support::{cleanup_pod, NAMESPACE};

const POD_NAME: &str = "request-uri-too-large";
const ENV_COUNT: usize = 100;
const CONTAINER_COUNT: usize = 11;

/// Checks that a pod spec the size of a busy production deployment, many
/// containers each with a long environment, makes it through the agent's
/// ingress path instead of bouncing with a 414.
pub struct RequestUriTooLarge;

#[async_trait]
impl Scenario for RequestUriTooLarge {
    fn name(&self) -> &str {
        "request-uri-too-large"
    }

    fn description(&self) -> &str {
        "the ingress proxy should not reject large pod specs with 414 request uri too large"
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

        let outcome = session
            .wait_until_steady(ctx, NAMESPACE, POD_NAME)
            .await
            .context("wait for pod creation");
        cleanup_pod(&session, NAMESPACE, POD_NAME).await;
        outcome
    }
}

fn pod_spec(node_name: &str) -> Pod {
    // Sized after a production pod observed to trip the 414 limit.
    let env: Vec<EnvVar> = (0..ENV_COUNT)
        .map(|i| EnvVar {
            name: format!("MockKey{i}"),
            value: Some(format!("ThisIsALongMockString{i}")),
            ..Default::default()
        })
        .collect();
    let containers = (0..CONTAINER_COUNT)
        .map(|i| Container {
            name: format!("test{i}"),
            image: Some("busybox".to_string()),
            env: Some(env.clone()),
            ..Default::default()
        })
        .collect();

    let annotations = BTreeMap::from([
        ("k8s.aliyun.com/eci-cpu".to_string(), "1".to_string()),
        ("k8s.aliyun.com/eci-memory".to_string(), "2Gi".to_string()),
    ]);

    Pod {
        metadata: ObjectMeta {
            name: Some(POD_NAME.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            annotations: Some(annotations),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers,
            restart_policy: Some("Never".to_string()),
            node_name: Some(node_name.to_string()),
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
    fn pod_is_as_large_as_the_production_shape_that_tripped_414() {
        let pod = pod_spec("virtual-kubelet");
        let spec = pod.spec.expect("pod must have a spec");

        assert_eq!(spec.containers.len(), CONTAINER_COUNT);
        for container in &spec.containers {
            let env = container.env.as_ref().expect("container must have env");
            assert_eq!(env.len(), ENV_COUNT);
        }
    }

    #[test]
    fn pod_carries_the_compute_class_annotations() {
        let pod = pod_spec("virtual-kubelet");
        let annotations = pod
            .metadata
            .annotations
            .expect("pod must carry annotations");

        assert_eq!(
            annotations.get("k8s.aliyun.com/eci-cpu").map(String::as_str),
            Some("1")
        );
        assert_eq!(
            annotations
                .get("k8s.aliyun.com/eci-memory")
                .map(String::as_str),
            Some("2Gi")
        );
    }
}
