use std::sync::Arc;

use existing_cluster_core::{
    helpers::RequireMetadata,
    kubernetes::{
        operations::{apply_resource, apply_resource_status, try_delete_resource},
        GetApi,
    },
    resources::{
        common::{condition::Condition, ReclaimPolicy},
        connection::{generate_connection_secret, ConnectionDetails},
        crd::v1beta1::existing_cluster::{ExistingCluster, ExistingClusterStatus},
    },
};
use k8s_openapi::api::core::v1::Secret;
use kube::{
    api::{DeleteParams, PatchParams},
    runtime::{
        controller::Action,
        finalizer::{finalizer, Error as FinalizerError, Event as FinalizerEvent},
    },
    Resource,
};
use log::{debug, info};

use self::{context::ReconcilerContext, error::ReconcilerError};

use super::{
    external::{ExternalClient, ExternalConnecter},
    MANAGED_FIELD_MANAGER, MANAGED_FINALIZER,
};

pub mod context;
pub mod error;

pub async fn reconcile_existing_cluster<C: ExternalConnecter>(
    object: Arc<ExistingCluster>,
    context: Arc<ReconcilerContext<C>>,
) -> Result<Action, FinalizerError<ReconcilerError>> {
    let cluster_api = context.client.global_api::<ExistingCluster>();

    finalizer(&cluster_api, MANAGED_FINALIZER, object, |event| async {
        match event {
            FinalizerEvent::Apply(cluster) => try_reconcile(&cluster, &context).await,
            FinalizerEvent::Cleanup(cluster) => cleanup(&cluster, &context).await,
        }
    })
    .await
}

pub fn reconcile_existing_cluster_error<C: ExternalConnecter>(
    _object: Arc<ExistingCluster>,
    _error: &FinalizerError<ReconcilerError>,
    context: Arc<ReconcilerContext<C>>,
) -> Action {
    Action::requeue(context.timings.error_requeue)
}

async fn try_reconcile<C: ExternalConnecter>(
    object: &ExistingCluster,
    context: &ReconcilerContext<C>,
) -> Result<Action, ReconcilerError> {
    match reconcile(object, context).await {
        Ok(action) => Ok(action),
        Err(error) => {
            let status = error_status(object, &error);
            let _ = apply_status(object, &status, context).await;

            Err(error)
        }
    }
}

/// Failed reconciliations are never synced, and a cluster that couldn't be
/// observed isn't available either.
fn error_status(object: &ExistingCluster, error: &ReconcilerError) -> ExistingClusterStatus {
    let mut status = object.status.clone().unwrap_or_default();
    status
        .resource_status
        .set_conditions([Condition::reconcile_error(error)]);

    if let ReconcilerError::External(_) = error {
        status.resource_status.set_conditions([Condition::unavailable()]);
    }

    status
}

async fn reconcile<C: ExternalConnecter>(
    object: &ExistingCluster,
    context: &ReconcilerContext<C>,
) -> Result<Action, ReconcilerError> {
    let mut cluster = object.clone();
    let external = context
        .connector
        .connect(&cluster)
        .await
        .map_err(ReconcilerError::Connect)?;

    let observation = external
        .observe(&mut cluster)
        .await
        .map_err(ReconcilerError::External)?;
    let mut connection_details = observation.connection_details;
    let mut requeue_after = context.timings.sync_period;

    if !observation.resource_exists {
        let creation = external
            .create(&mut cluster)
            .await
            .map_err(ReconcilerError::External)?;
        connection_details.extend(creation.connection_details);
        requeue_after = context.timings.wait;
    } else if !observation.resource_up_to_date {
        let update = external
            .update(&mut cluster)
            .await
            .map_err(ReconcilerError::External)?;
        connection_details.extend(update.connection_details);
    }

    publish_connection(&cluster, &connection_details, context).await?;

    let mut status = cluster.status.clone().unwrap_or_default();
    status
        .resource_status
        .set_conditions([Condition::reconcile_success()]);
    apply_status(&cluster, &status, context).await?;

    Ok(Action::requeue(requeue_after))
}

async fn cleanup<C: ExternalConnecter>(
    object: &ExistingCluster,
    context: &ReconcilerContext<C>,
) -> Result<Action, ReconcilerError> {
    let name = object.require_name_or(ReconcilerError::MissingObjectMetadata)?;
    let mut cluster = object.clone();

    if cluster.reclaim_policy() == ReclaimPolicy::Delete {
        let external = context
            .connector
            .connect(&cluster)
            .await
            .map_err(ReconcilerError::Connect)?;

        external
            .delete(&mut cluster)
            .await
            .map_err(ReconcilerError::External)?;

        let status = cluster.status.clone().unwrap_or_default();
        apply_status(&cluster, &status, context).await?;
    } else {
        debug!("Retaining '{name}' ExistingCluster, nothing to delete...");
    }

    unpublish_connection(&cluster, context).await?;

    info!("Cleaned up '{name}' ExistingCluster!");

    Ok(Action::await_change())
}

async fn publish_connection<C: ExternalConnecter>(
    cluster: &ExistingCluster,
    connection_details: &ConnectionDetails,
    context: &ReconcilerContext<C>,
) -> Result<(), ReconcilerError> {
    let Some(secret_ref) = &cluster.spec.resource_spec.write_connection_secret_to_ref else {
        return Ok(());
    };

    let owner = cluster
        .controller_owner_ref(&())
        .ok_or(ReconcilerError::MissingObjectMetadata)?;
    let secret = generate_connection_secret(secret_ref, connection_details, owner);

    apply_resource(
        &context.client,
        &secret,
        &PatchParams::apply(MANAGED_FIELD_MANAGER).force(),
    )
    .await
    .map_err(ReconcilerError::KubeApiError)?;

    Ok(())
}

async fn unpublish_connection<C: ExternalConnecter>(
    cluster: &ExistingCluster,
    context: &ReconcilerContext<C>,
) -> Result<(), ReconcilerError> {
    let Some(secret_ref) = &cluster.spec.resource_spec.write_connection_secret_to_ref else {
        return Ok(());
    };

    let secret_api = context.client.namespaced_api::<Secret>(&secret_ref.namespace);

    try_delete_resource(&secret_api, &secret_ref.name, &DeleteParams::default())
        .await
        .map_err(ReconcilerError::KubeApiError)
}

async fn apply_status<C: ExternalConnecter>(
    cluster: &ExistingCluster,
    status: &ExistingClusterStatus,
    context: &ReconcilerContext<C>,
) -> Result<(), ReconcilerError> {
    let name = cluster.require_name_or(ReconcilerError::MissingObjectMetadata)?;

    apply_resource_status(
        &context.client.global_api::<ExistingCluster>(),
        name,
        status,
        &PatchParams::apply(MANAGED_FIELD_MANAGER).force(),
    )
    .await
    .map_err(ReconcilerError::KubeApiError)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use existing_cluster_core::{
        kubeconfig::KubeconfigError,
        resources::{
            common::{
                condition::{Condition, ConditionReason, ConditionStatus, ConditionType},
                BindingPhase,
            },
            crd::v1beta1::existing_cluster::{ExistingCluster, ExistingClusterStatus},
        },
    };

    use crate::managed::external::{ConnectError, ExternalError};

    use super::{error_status, ReconcilerError};

    fn available_cluster() -> ExistingCluster {
        let mut cluster = ExistingCluster::new("target", Default::default());
        let mut status = ExistingClusterStatus::default();
        status
            .resource_status
            .set_conditions([Condition::available(), Condition::reconcile_success()]);
        status.resource_status.binding_phase = Some(BindingPhase::Bound);
        cluster.status = Some(status);
        cluster
    }

    #[test]
    fn external_errors_mark_the_cluster_unavailable() {
        let error = ReconcilerError::External(ExternalError::Kubeconfig(
            KubeconfigError::MissingCurrentContext,
        ));

        let status = error_status(&available_cluster(), &error);
        let synced = status.resource_status.condition(ConditionType::Synced).unwrap();
        let ready = status.resource_status.condition(ConditionType::Ready).unwrap();

        assert_eq!(synced.status, ConditionStatus::False);
        assert_eq!(synced.reason, ConditionReason::ReconcileError);
        assert_eq!(synced.message.as_deref(), Some(error.to_string().as_str()));
        assert_eq!(ready.status, ConditionStatus::False);
        assert_eq!(ready.reason, ConditionReason::Unavailable);
        assert_eq!(status.resource_status.binding_phase, Some(BindingPhase::Bound));
    }

    #[test]
    fn connect_errors_only_touch_the_synced_condition() {
        let error = ReconcilerError::Connect(ConnectError::ProviderNotFound("example".to_owned()));

        let status = error_status(&available_cluster(), &error);
        let synced = status.resource_status.condition(ConditionType::Synced).unwrap();
        let ready = status.resource_status.condition(ConditionType::Ready).unwrap();

        assert_eq!(synced.reason, ConditionReason::ReconcileError);
        assert_eq!(ready.reason, ConditionReason::Available);
    }
}
