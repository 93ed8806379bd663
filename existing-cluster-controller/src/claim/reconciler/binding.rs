use std::sync::Arc;

use existing_cluster_core::{
    helpers::RequireMetadata,
    kubernetes::{
        operations::{
            apply_resource, merge_resource_spec, merge_resource_status, try_delete_resource,
            try_get_cluster_resource, try_get_resource,
        },
        GetApi,
    },
    resources::{
        common::{
            condition::{Condition, ConditionType},
            BindingPhase, ObjectReference, ReclaimPolicy, SecretReference,
        },
        connection::generate_propagated_secret,
        crd::{
            v1alpha1::kubernetes_cluster::KubernetesCluster,
            v1beta1::{
                existing_cluster::ExistingCluster, existing_cluster_class::ExistingClusterClass,
            },
        },
    },
};
use k8s_openapi::api::core::v1::Secret;
use kube::{
    api::{DeleteParams, PatchParams, PostParams},
    core::ObjectMeta,
    runtime::{
        controller::Action,
        finalizer::{finalizer, Error as FinalizerError, Event as FinalizerEvent},
    },
    Resource, ResourceExt,
};
use log::{debug, info};
use serde_json::json;

use crate::claim::{
    configure::{configure_managed, DEFAULT_CONFIGURATORS},
    selection::{is_existing_cluster_claim, references_claim},
    BINDER_NAME, CLAIM_FINALIZER,
};

use super::{apply_claim_status, context::ReconcilerContext, error::ReconcilerError};

pub async fn reconcile_claim_binding(
    object: Arc<KubernetesCluster>,
    context: Arc<ReconcilerContext>,
) -> Result<Action, FinalizerError<ReconcilerError>> {
    if !is_existing_cluster_claim(&object) {
        return Ok(Action::await_change());
    }

    let namespace = object
        .require_namespace_or(ReconcilerError::MissingObjectMetadata)
        .map_err(FinalizerError::ApplyFailed)?
        .to_owned();
    let claim_api = context.client.namespaced_api::<KubernetesCluster>(&namespace);

    finalizer(&claim_api, CLAIM_FINALIZER, object, |event| async {
        match event {
            FinalizerEvent::Apply(claim) => try_bind(&claim, &context).await,
            FinalizerEvent::Cleanup(claim) => unbind(&claim, &context).await,
        }
    })
    .await
}

pub fn reconcile_claim_binding_error(
    _object: Arc<KubernetesCluster>,
    _error: &FinalizerError<ReconcilerError>,
    context: Arc<ReconcilerContext>,
) -> Action {
    Action::requeue(context.timings.error_requeue)
}

async fn try_bind(
    claim: &KubernetesCluster,
    context: &ReconcilerContext,
) -> Result<Action, ReconcilerError> {
    match bind(claim, context).await {
        Ok(action) => Ok(action),
        Err(error) => {
            let mut status = claim.resource_status();
            status.set_conditions([Condition::reconcile_error(&error)]);

            let _ = apply_claim_status(claim, &status, BINDER_NAME, context).await;

            Err(error)
        }
    }
}

async fn bind(
    claim: &KubernetesCluster,
    context: &ReconcilerContext,
) -> Result<Action, ReconcilerError> {
    let managed = match &claim.spec.claim_spec.resource_ref {
        Some(resource_ref) => {
            try_get_cluster_resource::<ExistingCluster>(&context.client, &resource_ref.name)
                .await
                .map_err(ReconcilerError::KubeApiError)?
                .ok_or_else(|| ReconcilerError::ManagedNotFound(resource_ref.name.to_owned()))?
        }
        None => provision(claim, context).await?,
    };
    let managed_name = managed.require_name_or(ReconcilerError::MissingObjectMetadata)?;

    match binding_step(claim, &managed) {
        BindingStep::BoundElsewhere => {
            return Err(ReconcilerError::ManagedBoundElsewhere(managed_name.to_owned()));
        }
        BindingStep::WaitUntilBindable => {
            let readiness = managed
                .resource_status()
                .condition(ConditionType::Ready)
                .map(|condition| condition.reason.to_string())
                .unwrap_or_else(|| "not observed yet".to_owned());
            debug!("Waiting for '{managed_name}' ExistingCluster to become bindable ({readiness})...");

            let mut status = claim.resource_status();
            status.set_conditions([Condition::creating(), Condition::reconcile_success()]);
            apply_claim_status(claim, &status, BINDER_NAME, context).await?;

            return Ok(Action::requeue(context.timings.wait));
        }
        BindingStep::Bind => (),
    }

    propagate_connection_secret(claim, &managed, context).await?;
    bind_managed(claim, &managed, context).await?;

    let mut status = claim.resource_status();
    status.binding_phase = Some(BindingPhase::Bound);
    status.set_conditions([Condition::available(), Condition::reconcile_success()]);
    apply_claim_status(claim, &status, BINDER_NAME, context).await?;

    Ok(Action::requeue(context.timings.sync_period))
}

/// Creates a new ExistingCluster for the claim from the class it was
/// scheduled to, then points the claim at it.
async fn provision(
    claim: &KubernetesCluster,
    context: &ReconcilerContext,
) -> Result<ExistingCluster, ReconcilerError> {
    let claim_name = claim.require_name_or(ReconcilerError::MissingObjectMetadata)?;
    let claim_namespace = claim.require_namespace_or(ReconcilerError::MissingObjectMetadata)?;
    let class_name = &claim
        .spec
        .claim_spec
        .class_ref
        .as_ref()
        .ok_or_else(|| ReconcilerError::MissingObjectData("classRef".into()))?
        .name;

    let class = try_get_cluster_resource::<ExistingClusterClass>(&context.client, class_name)
        .await
        .map_err(ReconcilerError::KubeApiError)?
        .ok_or_else(|| ReconcilerError::ClassNotFound(class_name.to_owned()))?;

    let mut managed = ExistingCluster {
        metadata: ObjectMeta::default(),
        spec: Default::default(),
        status: None,
    };
    configure_managed(claim, &class, &mut managed, &DEFAULT_CONFIGURATORS)
        .map_err(ReconcilerError::Configure)?;
    managed.spec.resource_spec.claim_ref = Some(ObjectReference::to(claim));
    managed.spec.resource_spec.class_ref = Some(ObjectReference::to(&class));

    let managed = context
        .client
        .global_api::<ExistingCluster>()
        .create(
            &PostParams {
                field_manager: Some(BINDER_NAME.to_owned()),
                ..Default::default()
            },
            &managed,
        )
        .await
        .map_err(ReconcilerError::KubeApiError)?;

    merge_resource_spec(
        &context.client.namespaced_api::<KubernetesCluster>(claim_namespace),
        claim_name,
        json!({ "resourceRef": ObjectReference::to(&managed) }),
        &binder_patch_params(),
    )
    .await
    .map_err(ReconcilerError::KubeApiError)?;

    info!(
        "Provisioned '{}' ExistingCluster for '{claim_name}' claim in '{claim_namespace}' namespace from '{class_name}' class!",
        managed.name_any()
    );

    Ok(managed)
}

/// Copies the managed cluster's connection secret into the claim's namespace.
async fn propagate_connection_secret(
    claim: &KubernetesCluster,
    managed: &ExistingCluster,
    context: &ReconcilerContext,
) -> Result<(), ReconcilerError> {
    let Some((source_ref, target_name)) = propagation_refs(claim, managed)? else {
        debug!(
            "'{}' ExistingCluster publishes no connection secret, nothing to propagate...",
            managed.name_any()
        );
        return Ok(());
    };
    let claim_namespace = claim.require_namespace_or(ReconcilerError::MissingObjectMetadata)?;

    let source = try_get_resource::<Secret>(&context.client, &source_ref.name, &source_ref.namespace)
        .await
        .map_err(ReconcilerError::KubeApiError)?
        .ok_or_else(|| {
            ReconcilerError::ConnectionSecretNotFound(format!(
                "{}/{}",
                source_ref.namespace, source_ref.name
            ))
        })?;

    let owner = claim
        .controller_owner_ref(&())
        .ok_or(ReconcilerError::MissingObjectMetadata)?;
    let secret = generate_propagated_secret(&source, target_name, claim_namespace, owner);

    apply_resource(
        &context.client,
        &secret,
        &PatchParams::apply(BINDER_NAME).force(),
    )
    .await
    .map_err(ReconcilerError::KubeApiError)?;

    Ok(())
}

async fn bind_managed(
    claim: &KubernetesCluster,
    managed: &ExistingCluster,
    context: &ReconcilerContext,
) -> Result<(), ReconcilerError> {
    let managed_name = managed.require_name_or(ReconcilerError::MissingObjectMetadata)?;
    let managed_api = context.client.global_api::<ExistingCluster>();

    if managed.spec.resource_spec.claim_ref.is_none() {
        merge_resource_spec(
            &managed_api,
            managed_name,
            json!({ "claimRef": ObjectReference::to(claim) }),
            &binder_patch_params(),
        )
        .await
        .map_err(ReconcilerError::KubeApiError)?;
    }

    if !managed.resource_status().is_bound() {
        merge_resource_status(
            &managed_api,
            managed_name,
            json!({ "bindingPhase": BindingPhase::Bound }),
            &binder_patch_params(),
        )
        .await
        .map_err(ReconcilerError::KubeApiError)?;

        info!(
            "Bound '{managed_name}' ExistingCluster to '{}' claim in '{}' namespace!",
            claim.name_any(),
            claim.namespace().unwrap_or_default()
        );
    }

    Ok(())
}

/// Deletes or releases the ExistingCluster bound to a deleted claim,
/// depending on its reclaim policy.
async fn unbind(
    claim: &KubernetesCluster,
    context: &ReconcilerContext,
) -> Result<Action, ReconcilerError> {
    let Some(resource_ref) = &claim.spec.claim_spec.resource_ref else {
        return Ok(Action::await_change());
    };

    let managed_api = context.client.global_api::<ExistingCluster>();
    let Some(managed) = managed_api
        .get_opt(&resource_ref.name)
        .await
        .map_err(ReconcilerError::KubeApiError)?
    else {
        return Ok(Action::await_change());
    };

    match reclaim_step(claim, &managed) {
        ReclaimStep::Ignore => (),
        ReclaimStep::Delete => {
            try_delete_resource(&managed_api, &resource_ref.name, &DeleteParams::background())
                .await
                .map_err(ReconcilerError::KubeApiError)?;

            info!("Deleted '{}' ExistingCluster of a deleted claim!", resource_ref.name);
        }
        ReclaimStep::Release => {
            merge_resource_spec(
                &managed_api,
                &resource_ref.name,
                json!({ "claimRef": null }),
                &binder_patch_params(),
            )
            .await
            .map_err(ReconcilerError::KubeApiError)?;
            merge_resource_status(
                &managed_api,
                &resource_ref.name,
                json!({ "bindingPhase": BindingPhase::Released }),
                &binder_patch_params(),
            )
            .await
            .map_err(ReconcilerError::KubeApiError)?;

            info!("Released '{}' ExistingCluster of a deleted claim!", resource_ref.name);
        }
    }

    Ok(Action::await_change())
}

fn binder_patch_params() -> PatchParams {
    PatchParams {
        field_manager: Some(BINDER_NAME.to_owned()),
        ..Default::default()
    }
}

#[derive(Debug, PartialEq, Eq)]
enum BindingStep {
    BoundElsewhere,
    WaitUntilBindable,
    Bind,
}

fn binding_step(claim: &KubernetesCluster, managed: &ExistingCluster) -> BindingStep {
    let bound_elsewhere = managed
        .spec
        .resource_spec
        .claim_ref
        .as_ref()
        .is_some_and(|claim_ref| !references_claim(claim_ref, claim));
    if bound_elsewhere {
        return BindingStep::BoundElsewhere;
    }

    let status = managed.resource_status();
    if status.is_bound() || status.is_bindable() {
        BindingStep::Bind
    } else {
        BindingStep::WaitUntilBindable
    }
}

/// Source of the propagated connection secret and the name of its copy,
/// which is the claim's name unless the claim asks for another one.
/// Nothing is propagated when the managed cluster publishes no secret.
fn propagation_refs<'a>(
    claim: &'a KubernetesCluster,
    managed: &'a ExistingCluster,
) -> Result<Option<(&'a SecretReference, &'a str)>, ReconcilerError> {
    let Some(source_ref) = &managed.spec.resource_spec.write_connection_secret_to_ref else {
        return Ok(None);
    };

    let target_name = match &claim.spec.claim_spec.write_connection_secret_to_ref {
        Some(secret_ref) => secret_ref.name.as_str(),
        None => claim.require_name_or(ReconcilerError::MissingObjectMetadata)?,
    };

    Ok(Some((source_ref, target_name)))
}

#[derive(Debug, PartialEq, Eq)]
enum ReclaimStep {
    Ignore,
    Delete,
    Release,
}

/// Clusters bound to another claim, or to none, are left alone.
fn reclaim_step(claim: &KubernetesCluster, managed: &ExistingCluster) -> ReclaimStep {
    let bound_to_claim = managed
        .spec
        .resource_spec
        .claim_ref
        .as_ref()
        .is_some_and(|claim_ref| references_claim(claim_ref, claim));

    match (bound_to_claim, managed.reclaim_policy()) {
        (false, _) => ReclaimStep::Ignore,
        (true, ReclaimPolicy::Delete) => ReclaimStep::Delete,
        (true, ReclaimPolicy::Retain) => ReclaimStep::Release,
    }
}

#[cfg(test)]
mod tests {
    use existing_cluster_core::resources::{
        common::{
            condition::Condition, BindingPhase, LocalSecretReference, ObjectReference,
            ReclaimPolicy, ResourceStatus, SecretReference,
        },
        crd::{
            v1alpha1::kubernetes_cluster::KubernetesCluster,
            v1beta1::existing_cluster::{ExistingCluster, ExistingClusterStatus},
        },
    };
    use kube::core::ObjectMeta;

    use super::{binding_step, propagation_refs, reclaim_step, BindingStep, ReclaimStep};

    const CLAIM: &str =
        include_str!("../../../../demos/container/kubernetescluster/resource-claim.yaml");

    fn claim() -> KubernetesCluster {
        let mut claim: KubernetesCluster = serde_yaml::from_str(CLAIM).unwrap();
        claim.metadata.uid = Some("claim-uid".to_owned());
        claim
    }

    fn other_claim() -> KubernetesCluster {
        let mut claim = claim();
        claim.metadata.name = Some("other-cluster".to_owned());
        claim.metadata.uid = Some("other-uid".to_owned());
        claim
    }

    fn managed(claim: Option<&KubernetesCluster>, phase: Option<BindingPhase>) -> ExistingCluster {
        let mut managed = ExistingCluster {
            metadata: ObjectMeta {
                name: Some("static-cluster".to_owned()),
                ..Default::default()
            },
            spec: Default::default(),
            status: Some(ExistingClusterStatus {
                resource_status: ResourceStatus {
                    conditions: vec![Condition::available()],
                    binding_phase: phase,
                },
                ..Default::default()
            }),
        };
        managed.spec.resource_spec.claim_ref = claim.map(ObjectReference::to);
        managed
    }

    #[test]
    fn unbound_clusters_are_bound() {
        let claim = claim();

        assert_eq!(
            binding_step(&claim, &managed(None, Some(BindingPhase::Unbound))),
            BindingStep::Bind
        );
        assert_eq!(
            binding_step(&claim, &managed(Some(&claim), Some(BindingPhase::Bound))),
            BindingStep::Bind
        );
    }

    #[test]
    fn clusters_not_yet_bindable_are_waited_for() {
        let claim = claim();

        assert_eq!(binding_step(&claim, &managed(None, None)), BindingStep::WaitUntilBindable);
        assert_eq!(
            binding_step(&claim, &managed(None, Some(BindingPhase::Released))),
            BindingStep::WaitUntilBindable
        );
    }

    #[test]
    fn clusters_claimed_by_another_claim_are_refused() {
        let claim = claim();
        let managed = managed(Some(&other_claim()), Some(BindingPhase::Bound));

        assert_eq!(binding_step(&claim, &managed), BindingStep::BoundElsewhere);
    }

    #[test]
    fn clusters_without_connection_secret_propagate_nothing() {
        let claim = claim();
        let managed = managed(None, Some(BindingPhase::Unbound));

        assert!(propagation_refs(&claim, &managed).unwrap().is_none());
        assert_eq!(binding_step(&claim, &managed), BindingStep::Bind);
    }

    #[test]
    fn propagated_secret_is_named_by_claim() {
        let mut claim = claim();
        let mut managed = managed(None, Some(BindingPhase::Unbound));
        let source = SecretReference {
            name: "cluster-uid".to_owned(),
            namespace: "crossplane-system".to_owned(),
        };
        managed.spec.resource_spec.write_connection_secret_to_ref = Some(source.clone());

        let (source_ref, target_name) = propagation_refs(&claim, &managed).unwrap().unwrap();
        assert_eq!(source_ref, &source);
        assert_eq!(target_name, "app-cluster-connection");

        claim.spec.claim_spec.write_connection_secret_to_ref = None;
        let (_, target_name) = propagation_refs(&claim, &managed).unwrap().unwrap();
        assert_eq!(target_name, "app-cluster");

        claim.spec.claim_spec.write_connection_secret_to_ref = Some(LocalSecretReference {
            name: "custom".to_owned(),
        });
        let (_, target_name) = propagation_refs(&claim, &managed).unwrap().unwrap();
        assert_eq!(target_name, "custom");
    }

    #[test]
    fn deleted_claims_delete_or_release_per_reclaim_policy() {
        let claim = claim();
        let mut managed = managed(Some(&claim), Some(BindingPhase::Bound));

        managed.spec.resource_spec.reclaim_policy = Some(ReclaimPolicy::Delete);
        assert_eq!(reclaim_step(&claim, &managed), ReclaimStep::Delete);

        managed.spec.resource_spec.reclaim_policy = Some(ReclaimPolicy::Retain);
        assert_eq!(reclaim_step(&claim, &managed), ReclaimStep::Release);
    }

    #[test]
    fn deleted_claims_leave_clusters_bound_elsewhere_alone() {
        let claim = claim();
        let mut managed = managed(Some(&other_claim()), Some(BindingPhase::Bound));
        managed.spec.resource_spec.reclaim_policy = Some(ReclaimPolicy::Delete);

        assert_eq!(reclaim_step(&claim, &managed), ReclaimStep::Ignore);

        managed.spec.resource_spec.claim_ref = None;
        assert_eq!(reclaim_step(&claim, &managed), ReclaimStep::Ignore);
    }
}
