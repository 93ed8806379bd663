use existing_cluster_core::{helpers::AndIf, resources::crd::create_v1beta1_crds};
use kube::{api::PatchParams, Client};
use log::info;

use crate::{cli::InstallArgs, CLI_FIELD_MANAGER};

pub async fn install(args: &InstallArgs, client: &Client) -> anyhow::Result<()> {
    info!("Installing existing cluster provider CRDs...");

    let apply_params = PatchParams::apply(CLI_FIELD_MANAGER)
        .force()
        .and_if(args.dry_run, |p| p.dry_run());

    create_v1beta1_crds(client, &apply_params, args.include_claims).await?;

    info!("Successfully installed existing cluster provider CRDs!");

    Ok(())
}
