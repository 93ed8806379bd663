use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::settings::ReconcileTimings;

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
    #[command(flatten)]
    pub global_args: GlobalArgs,
}

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// override default kubeconfig (in-cluster config is used when neither this nor a context is set)
    #[arg(long, global = true)]
    pub kube_config: Option<String>,
    /// override default kubeconfig context
    #[arg(long, global = true)]
    pub kube_context: Option<String>,
    /// enable verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose_logging: bool,
    /// enable trace output (more detailed than verbose, overrides it if present)
    #[arg(long = "trace", global = true)]
    pub trace_logging: bool,
}

impl GlobalArgs {
    pub fn get_log_level(&self) -> LogLevel {
        if self.trace_logging {
            return LogLevel::Trace;
        }

        if self.verbose_logging {
            return LogLevel::Verbose;
        }

        LogLevel::Normal
    }
}

pub enum LogLevel {
    Normal,
    Verbose,
    Trace,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// run the ExistingCluster and KubernetesCluster claim controllers
    #[command(alias = "r")]
    Run(RunArgs),
    /// print the provider's CRDs as YAML
    Crds(CrdsArgs),
    /// apply the provider's CRDs to the cluster
    #[command(alias = "i")]
    Install(InstallArgs),
    /// remove the provider's CRDs from the cluster
    #[command(alias = "u")]
    Uninstall(UninstallArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// seconds between reconciliations of healthy resources
    #[arg(long, env = "EXISTING_CLUSTER_SYNC_PERIOD_SECS", default_value_t = 60)]
    pub sync_period_secs: u64,
    /// seconds to wait before checking on a resource that isn't ready yet
    #[arg(long, env = "EXISTING_CLUSTER_WAIT_REQUEUE_SECS", default_value_t = 30)]
    pub wait_requeue_secs: u64,
    /// seconds to wait before retrying a failed reconciliation
    #[arg(long, env = "EXISTING_CLUSTER_ERROR_REQUEUE_SECS", default_value_t = 10)]
    pub error_requeue_secs: u64,
}

impl RunArgs {
    pub fn timings(&self) -> ReconcileTimings {
        ReconcileTimings {
            sync_period: Duration::from_secs(self.sync_period_secs),
            wait: Duration::from_secs(self.wait_requeue_secs),
            error_requeue: Duration::from_secs(self.error_requeue_secs),
        }
    }
}

#[derive(Debug, Args)]
pub struct CrdsArgs {
    /// also emit the KubernetesCluster claim CRD, normally installed by Crossplane
    #[arg(long)]
    pub include_claims: bool,
    /// if set, the CRDs will be written to a file instead of stdout
    #[arg(short = 'o', long)]
    pub output: Option<String>,
}

#[derive(Debug, Args)]
pub struct InstallArgs {
    /// also install the KubernetesCluster claim CRD, normally installed by Crossplane
    #[arg(long)]
    pub include_claims: bool,
    /// if set, no action will be taken on the cluster
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct UninstallArgs {
    /// also remove the KubernetesCluster claim CRD
    #[arg(long)]
    pub include_claims: bool,
    /// if set, no action will be taken on the cluster
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::Parser;

    use super::{Cli, Commands};

    #[test]
    fn run_defaults_to_crossplane_wait_periods() {
        let cli = Cli::try_parse_from(["existing-cluster-controller", "run"]).unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected the run command");
        };
        let timings = args.timings();

        assert_eq!(timings.sync_period, Duration::from_secs(60));
        assert_eq!(timings.wait, Duration::from_secs(30));
        assert_eq!(timings.error_requeue, Duration::from_secs(10));
    }

    #[test]
    fn global_args_are_accepted_after_subcommand() {
        let cli = Cli::try_parse_from([
            "existing-cluster-controller",
            "install",
            "--include-claims",
            "--kube-context",
            "kind-kind",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.global_args.kube_context.as_deref(), Some("kind-kind"));
        assert!(cli.global_args.verbose_logging);
        assert!(matches!(cli.command, Commands::Install(args) if args.include_claims));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;

        Cli::command().debug_assert();
    }
}
