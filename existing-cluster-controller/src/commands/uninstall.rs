use existing_cluster_core::resources::crd::remove_v1beta1_crds;
use kube::Client;
use log::{info, warn};

use crate::cli::UninstallArgs;

pub async fn uninstall(args: &UninstallArgs, client: &Client) -> anyhow::Result<()> {
    info!("Uninstalling existing cluster provider CRDs...");

    if args.include_claims {
        warn!("KubernetesCluster claims are shared by every Crossplane provider, removing their CRD deletes all of them!");
    }

    remove_v1beta1_crds(client, args.dry_run, args.include_claims).await?;

    info!("Successfully uninstalled existing cluster provider CRDs!");

    Ok(())
}
