use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use nodeprobe_core::prelude::ShutdownHandle;
use nodeprobe_runner::prelude::{RunReport, ScenarioRegistry};
use nodeprobe_session::prelude::ClusterSession;

use crate::cli::NodeprobeCli;

mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = NodeprobeCli::parse();

    match execute(cli).await {
        Ok(report) => {
            print!("{report}");
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(error) => {
            log::error!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: NodeprobeCli) -> anyhow::Result<RunReport> {
    let client = build_client(cli.kubeconfig.as_deref()).await?;
    let session = Arc::new(ClusterSession::new(client, cli.nodename));

    let mut registry = ScenarioRegistry::new();
    nodeprobe_scenarios::register_all(&mut registry);
    log::debug!("Registered scenarios: {:?}", registry.names());

    let shutdown = ShutdownHandle::new();
    install_ctrl_c_handler(&shutdown);

    nodeprobe_runner::prelude::run(&registry, &cli.run, cli.test_timeout, session, &shutdown).await
}

async fn build_client(kubeconfig: Option<&Path>) -> anyhow::Result<Client> {
    let config = match kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("read kubeconfig at {}", path.display()))?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .context("interpret kubeconfig")?
        }
        None => Config::infer().await.context("infer cluster configuration")?,
    };
    Client::try_from(config).context("construct cluster client")
}

fn install_ctrl_c_handler(shutdown: &ShutdownHandle) {
    let shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Err(error) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {error}");
            return;
        }
        println!("Received shutdown signal, shutting down...");
        shutdown.shutdown();
    });
}
