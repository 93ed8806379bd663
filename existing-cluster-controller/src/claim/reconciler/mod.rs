use existing_cluster_core::{
    helpers::RequireMetadata,
    kubernetes::{
        operations::{apply_resource_status, merge_resource_spec},
        GetApi,
    },
    resources::{
        common::{ObjectReference, ResourceStatus},
        crd::{
            v1alpha1::kubernetes_cluster::KubernetesCluster,
            v1beta1::existing_cluster_class::ExistingClusterClass,
        },
    },
};
use kube::api::PatchParams;
use serde_json::json;

use self::{context::ReconcilerContext, error::ReconcilerError};

pub mod binding;
pub mod context;
pub mod defaulting;
pub mod error;
pub mod scheduling;

async fn set_class_ref(
    claim: &KubernetesCluster,
    class: &ExistingClusterClass,
    field_manager: &str,
    context: &ReconcilerContext,
) -> Result<(), ReconcilerError> {
    let name = claim.require_name_or(ReconcilerError::MissingObjectMetadata)?;
    let namespace = claim.require_namespace_or(ReconcilerError::MissingObjectMetadata)?;

    merge_resource_spec(
        &context.client.namespaced_api::<KubernetesCluster>(namespace),
        name,
        json!({ "classRef": ObjectReference::to(class) }),
        &PatchParams {
            field_manager: Some(field_manager.to_owned()),
            ..Default::default()
        },
    )
    .await
    .map_err(ReconcilerError::KubeApiError)?;

    Ok(())
}

async fn apply_claim_status(
    claim: &KubernetesCluster,
    status: &ResourceStatus,
    field_manager: &str,
    context: &ReconcilerContext,
) -> Result<(), ReconcilerError> {
    let name = claim.require_name_or(ReconcilerError::MissingObjectMetadata)?;
    let namespace = claim.require_namespace_or(ReconcilerError::MissingObjectMetadata)?;

    apply_resource_status(
        &context.client.namespaced_api::<KubernetesCluster>(namespace),
        name,
        status,
        &PatchParams::apply(field_manager).force(),
    )
    .await
    .map_err(ReconcilerError::KubeApiError)?;

    Ok(())
}
