use std::process::exit;

use clap::Parser;
use cli::{Cli, Commands, GlobalArgs, LogLevel};
use commands::{crds::crds, install::install, run::run, uninstall::uninstall};
use env_logger::Target;
use existing_cluster_core::kubernetes::operations::create_local_client;
use kube::Client;
use log::LevelFilter;

mod claim;
mod cli;
mod commands;
mod helpers;
mod managed;
mod settings;

pub const CLI_FIELD_MANAGER: &str = "existing-cluster-controller";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    configure_logging(&cli.global_args);

    match &cli.command {
        Commands::Run(args) => run(args, create_client(&cli.global_args).await).await?,
        Commands::Crds(args) => crds(args).await?,
        Commands::Install(args) => install(args, &create_client(&cli.global_args).await).await?,
        Commands::Uninstall(args) => {
            uninstall(args, &create_client(&cli.global_args).await).await?
        }
    }

    Ok(())
}

async fn create_client(global_args: &GlobalArgs) -> Client {
    match create_local_client(&global_args.kube_config, &global_args.kube_context).await {
        Ok(client) => client,
        Err(error) => {
            log::error!("Couldn't create client! {error:?}");
            exit(6)
        }
    }
}

fn configure_logging(global_args: &GlobalArgs) {
    let log_level = global_args.get_log_level();
    let mut logger = env_logger::builder();

    logger
        .format_module_path(matches!(log_level, LogLevel::Trace))
        .format_target(false)
        .target(Target::Stderr);

    match log_level {
        LogLevel::Normal => logger.filter(Some("existing_cluster"), LevelFilter::Info),
        LogLevel::Verbose => logger.filter(Some("existing_cluster"), LevelFilter::Debug),
        LogLevel::Trace => logger.filter(None, LevelFilter::Debug),
    };

    logger.init();
}
