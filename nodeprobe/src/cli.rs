use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Run acceptance scenarios against the node agent of a live cluster.
#[derive(Debug, Parser)]
#[command(about, long_about = None)]
pub struct NodeprobeCli {
    /// Path to the kubeconfig used to reach the cluster.
    ///
    /// When omitted, the configuration is inferred the usual way: the
    /// `KUBECONFIG` environment variable, `~/.kube/config`, or the in-cluster
    /// service account.
    #[clap(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Name of the node under test. Every scenario workload is pinned to it.
    #[clap(long, default_value = "virtual-kubelet")]
    pub nodename: String,

    /// Per-scenario deadline, for example `5m` or `90s`
    #[clap(long, value_parser = humantime::parse_duration, default_value = "5m")]
    pub test_timeout: Duration,

    /// Only run the scenarios whose name matches this regular expression.
    ///
    /// Shipped scenarios: `emptydir`, `env100`, `request-uri-too-large`.
    /// An empty expression runs all of them.
    #[clap(long, default_value = "")]
    pub run: String,
}
