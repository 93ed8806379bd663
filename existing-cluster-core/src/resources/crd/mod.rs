use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{
    api::{DeleteParams, PatchParams},
    Client, CustomResourceExt, Resource,
};

use crate::{
    helpers::AndIf,
    kubernetes::operations::{apply_crd, try_remove_cluster_resource},
};

use self::{
    v1alpha1::kubernetes_cluster::KubernetesCluster,
    v1beta1::{
        existing_cluster::ExistingCluster, existing_cluster_class::ExistingClusterClass,
        provider::Provider,
    },
};

pub mod v1alpha1;
pub mod v1beta1;

/// `Kind.group/version`, the form used to name controllers after a kind.
pub fn kind_api_version<K: Resource<DynamicType = ()>>() -> String {
    format!("{}.{}", K::kind(&()), K::api_version(&()))
}

/// All CRDs served by the provider. The claim CRD is owned by Crossplane and
/// only included when explicitly requested.
pub fn crds(include_claims: bool) -> Result<Vec<CustomResourceDefinition>, serde_json::Error> {
    let mut crds = vec![
        Provider::crd(),
        ExistingCluster::crd(),
        ExistingClusterClass::crd()?,
    ];

    if include_claims {
        crds.push(KubernetesCluster::crd());
    }

    Ok(crds)
}

pub async fn create_v1beta1_crds(
    client: &Client,
    apply_params: &PatchParams,
    include_claims: bool,
) -> anyhow::Result<()> {
    for crd in crds(include_claims)? {
        apply_crd(client, &crd, apply_params).await?;
    }

    Ok(())
}

pub async fn remove_v1beta1_crds(
    client: &Client,
    dry_run: bool,
    include_claims: bool,
) -> anyhow::Result<()> {
    let delete_params = DeleteParams::foreground().and_if(dry_run, |p| p.dry_run());
    let mut names = vec![
        Provider::crd_name().to_owned(),
        ExistingCluster::crd_name().to_owned(),
        ExistingClusterClass::crd_name(),
    ];

    if include_claims {
        names.push(KubernetesCluster::crd_name().to_owned());
    }

    for name in names {
        try_remove_cluster_resource::<CustomResourceDefinition>(client, &name, &delete_params)
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        crds, kind_api_version, v1beta1::existing_cluster::ExistingCluster,
        v1beta1::existing_cluster_class::ExistingClusterClass,
    };

    #[test]
    fn kind_api_version_joins_kind_and_group_version() {
        assert_eq!(
            kind_api_version::<ExistingCluster>(),
            "ExistingCluster.container.dev.crossplane.io/v1beta1"
        );
        assert_eq!(
            kind_api_version::<ExistingClusterClass>(),
            "ExistingClusterClass.container.dev.crossplane.io/v1beta1"
        );
    }

    #[test]
    fn claim_crd_is_opt_in() {
        assert_eq!(crds(false).unwrap().len(), 3);
        assert_eq!(crds(true).unwrap().len(), 4);
    }
}
