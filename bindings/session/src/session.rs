use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, AttachParams, DeleteParams, WatchParams};
use kube::Client;
use nodeprobe_core::prelude::ScenarioContext;
use tokio::io::AsyncReadExt;

use crate::error::SessionError;
use crate::steady;

/// Captured output of a remote command, trimmed of surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Mediates all cluster API access on behalf of scenarios.
///
/// Holds the shared client handle and the identity of the node under test.
/// One session is created per run and shared across every concurrent
/// scenario; the client is safe for concurrent use per kube's contract.
pub struct ClusterSession {
    client: Client,
    node_name: String,
}

impl ClusterSession {
    pub fn new(client: Client, node_name: impl Into<String>) -> Self {
        Self {
            client,
            node_name: node_name.into(),
        }
    }

    /// The fixed node that scenario workloads are pinned to.
    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// A pod API handle scoped to the given namespace, for the calls the
    /// session does not wrap (create, get, update).
    pub fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Block until the named pod reaches a steady phase (Running, Succeeded
    /// or Failed).
    ///
    /// Opens a single watch scoped to the pod by field selector. There is no
    /// reconnection: a failure to open the watch surfaces immediately, and a
    /// stream the server closes before a steady phase is an error.
    pub async fn wait_until_steady(
        &self,
        ctx: &mut ScenarioContext,
        namespace: &str,
        name: &str,
    ) -> Result<(), SessionError> {
        log::debug!("Waiting for pod {namespace}/{name} to reach a steady phase");
        let params = WatchParams::default().fields(&format!("metadata.name={name}"));
        let events = self.pods(namespace).watch(&params, "0").await?.boxed();
        steady::wait_for_steady_phase(ctx, events).await
    }

    /// Delete the named pod with foreground cascade semantics, so children
    /// are removed before the pod itself disappears.
    ///
    /// Deleting a pod that does not exist surfaces whatever the API reports.
    pub async fn delete_pod(&self, namespace: &str, name: &str) -> Result<(), SessionError> {
        log::debug!("Deleting pod {namespace}/{name}");
        self.pods(namespace)
            .delete(name, &DeleteParams::foreground())
            .await?;
        Ok(())
    }

    /// Run a command inside a running container over a single bidirectional
    /// streaming call and capture its output.
    ///
    /// The process's own standard input is forwarded to the remote command.
    /// On success both captured streams are returned trimmed of surrounding
    /// whitespace. A failed command surfaces an error whose text includes the
    /// captured standard error, and the context deadline applies to the
    /// stream itself, so a hung remote command cannot outlive it.
    pub async fn exec_in_container(
        &self,
        ctx: &mut ScenarioContext,
        namespace: &str,
        pod: &str,
        container: &str,
        command: &[&str],
    ) -> Result<ExecOutput, SessionError> {
        log::debug!("Executing {command:?} in pod {namespace}/{pod}, container {container}");
        let params = AttachParams::default()
            .container(container)
            .stdin(true)
            .stdout(true)
            .stderr(true);
        let api = self.pods(namespace);
        let exec = api.exec(pod, command.iter().copied(), &params);

        let mut attached = tokio::select! {
            biased;
            cancelled = ctx.cancelled() => return Err(cancelled.into()),
            attached = exec => attached?,
        };

        let mut remote_stdin = attached
            .stdin()
            .ok_or(SessionError::ExecChannel("stdin"))?;
        let mut remote_stdout = attached
            .stdout()
            .ok_or(SessionError::ExecChannel("stdout"))?;
        let mut remote_stderr = attached
            .stderr()
            .ok_or(SessionError::ExecChannel("stderr"))?;
        let status = attached
            .take_status()
            .ok_or(SessionError::ExecChannel("status"))?;

        // Forward our own stdin for the lifetime of the remote command; the
        // task is abandoned once the command finishes or is cancelled.
        let stdin_forward = tokio::spawn(async move {
            let mut own_stdin = tokio::io::stdin();
            let _ = tokio::io::copy(&mut own_stdin, &mut remote_stdin).await;
        });

        let capture = async {
            let mut stdout = Vec::new();
            let mut stderr = Vec::new();
            let (stdout_read, stderr_read) = tokio::join!(
                remote_stdout.read_to_end(&mut stdout),
                remote_stderr.read_to_end(&mut stderr),
            );
            stdout_read?;
            stderr_read?;
            Ok::<_, std::io::Error>((stdout, stderr, status.await))
        };

        let (stdout, stderr, status) = tokio::select! {
            biased;
            cancelled = ctx.cancelled() => {
                stdin_forward.abort();
                return Err(cancelled.into());
            }
            captured = capture => {
                stdin_forward.abort();
                captured?
            }
        };

        attached.join().await?;

        let stdout = captured_text(&stdout);
        let stderr = captured_text(&stderr);
        if let Some(status) = status {
            if status.status.as_deref() == Some("Failure") {
                return Err(SessionError::exec_failed(status.message, &stderr));
            }
        }
        Ok(ExecOutput { stdout, stderr })
    }
}

fn captured_text(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf).trim().to_string()
}
