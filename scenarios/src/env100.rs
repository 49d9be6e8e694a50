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

const POD_NAME: &str = "100env";
const ENV_COUNT: usize = 110;

/// Checks that the node agent accepts a container carrying well over one
/// hundred environment variables, a size that has tripped over request
/// limits in intermediate proxies before.
pub struct Env100;

#[async_trait]
impl Scenario for Env100 {
    fn name(&self) -> &str {
        "env100"
    }

    fn description(&self) -> &str {
        "a container can carry more than 100 env vars"
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
    let env = (0..ENV_COUNT)
        .map(|i| EnvVar {
            name: format!("key{i}"),
            value: Some(format!("value{i}")),
            ..Default::default()
        })
        .collect();

    Pod {
        metadata: ObjectMeta {
            name: Some(POD_NAME.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![Container {
                name: POD_NAME.to_string(),
                image: Some("alpine:3.10".to_string()),
                env: Some(env),
                ..Default::default()
            }],
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
    fn pod_carries_more_than_100_env_vars() {
        let pod = pod_spec("virtual-kubelet");
        let spec = pod.spec.expect("pod must have a spec");
        let env = spec.containers[0].env.as_ref().expect("container must have env");

        assert!(env.len() > 100);
        assert_eq!(env.len(), ENV_COUNT);
        assert_eq!(env[0].name, "key0");
        assert_eq!(env[0].value.as_deref(), Some("value0"));
    }

    #[test]
    fn pod_is_pinned_to_the_target_node_and_never_restarts() {
        let pod = pod_spec("virtual-kubelet");
        let spec = pod.spec.expect("pod must have a spec");

        assert_eq!(spec.node_name.as_deref(), Some("virtual-kubelet"));
        assert_eq!(spec.restart_policy.as_deref(), Some("Never"));
        assert_eq!(pod.metadata.namespace.as_deref(), Some(NAMESPACE));
    }
}
