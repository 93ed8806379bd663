use std::sync::Arc;

use existing_cluster_core::{
    kubernetes::GetApi,
    resources::crd::{
        v1alpha1::kubernetes_cluster::KubernetesCluster,
        v1beta1::existing_cluster_class::ExistingClusterClass,
    },
};
use kube::{api::ListParams, runtime::controller::Action, ResourceExt};
use log::{debug, info};

use crate::claim::{selection::choose_default_class, selection::needs_defaulting, DEFAULTER_NAME};

use super::{context::ReconcilerContext, error::ReconcilerError, set_class_ref};

/// Assigns a random default ExistingClusterClass to claims that didn't ask
/// for any class in particular.
pub async fn reconcile_claim_defaulting(
    object: Arc<KubernetesCluster>,
    context: Arc<ReconcilerContext>,
) -> Result<Action, ReconcilerError> {
    if !needs_defaulting(&object) {
        return Ok(Action::await_change());
    }

    let classes = context
        .client
        .global_api::<ExistingClusterClass>()
        .list(&ListParams::default())
        .await
        .map_err(ReconcilerError::KubeApiError)?;

    let class = choose_default_class(&classes.items, &mut rand::thread_rng()).cloned();

    match class {
        Some(class) => {
            set_class_ref(&object, &class, DEFAULTER_NAME, &context).await?;
            info!(
                "Defaulted '{}' claim in '{}' namespace to '{}' class!",
                object.name_any(),
                object.namespace().unwrap_or_default(),
                class.name_any()
            );

            Ok(Action::await_change())
        }
        None => {
            debug!(
                "No default ExistingClusterClass for '{}' claim, checking again later...",
                object.name_any()
            );

            Ok(Action::requeue(context.timings.sync_period))
        }
    }
}

pub fn reconcile_claim_defaulting_error(
    _object: Arc<KubernetesCluster>,
    _error: &ReconcilerError,
    context: Arc<ReconcilerContext>,
) -> Action {
    Action::requeue(context.timings.error_requeue)
}
