use anyhow::Context;
use existing_cluster_core::resources::crd::crds as provider_crds;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use log::info;

use crate::cli::CrdsArgs;

pub async fn crds(args: &CrdsArgs) -> anyhow::Result<()> {
    let crds = provider_crds(args.include_claims).context("Couldn't generate the CRDs!")?;
    let output = serialize_crds(&crds)?;

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, output)
                .await
                .context(format!("Couldn't write the CRDs to '{path}'!"))?;
            info!("Written {} CRDs to '{path}'!", crds.len());
        }
        None => print!("{output}"),
    }

    Ok(())
}

fn serialize_crds(crds: &[CustomResourceDefinition]) -> anyhow::Result<String> {
    let documents = crds
        .iter()
        .map(serde_yaml::to_string)
        .collect::<Result<Vec<_>, _>>()
        .context("Couldn't serialize the CRDs!")?;

    Ok(documents.join("---\n"))
}
