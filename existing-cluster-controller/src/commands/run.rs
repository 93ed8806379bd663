use kube::Client;
use log::info;
use tokio::join;

use crate::{
    claim::start_claim_controllers, cli::RunArgs,
    managed::start_existing_cluster_controller,
};

pub async fn run(args: &RunArgs, client: Client) -> anyhow::Result<()> {
    let timings = args.timings();

    info!("Starting existing cluster provider controllers...");
    info!(
        "Syncing every {}s, waiting {}s for dependencies, retrying errors after {}s.",
        timings.sync_period.as_secs(),
        timings.wait.as_secs(),
        timings.error_requeue.as_secs()
    );

    join!(
        start_existing_cluster_controller(client.clone(), timings),
        start_claim_controllers(client, timings)
    );

    info!("Controllers stopped, shutting down...");

    Ok(())
}
