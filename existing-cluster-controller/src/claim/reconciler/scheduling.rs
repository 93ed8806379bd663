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

use crate::claim::{selection::choose_matching_class, selection::needs_scheduling, SCHEDULER_NAME};

use super::{context::ReconcilerContext, error::ReconcilerError, set_class_ref};

/// Schedules claims with a class selector to a random matching
/// ExistingClusterClass. Claims nothing matches are checked again later, a
/// class may show up in the meantime.
pub async fn reconcile_claim_scheduling(
    object: Arc<KubernetesCluster>,
    context: Arc<ReconcilerContext>,
) -> Result<Action, ReconcilerError> {
    let Some(selector) = object
        .spec
        .claim_spec
        .class_selector
        .as_ref()
        .filter(|_| needs_scheduling(&object))
    else {
        return Ok(Action::await_change());
    };

    let classes = context
        .client
        .global_api::<ExistingClusterClass>()
        .list(&ListParams::default())
        .await
        .map_err(ReconcilerError::KubeApiError)?;

    let class = choose_matching_class(&classes.items, selector, &mut rand::thread_rng()).cloned();

    match class {
        Some(class) => {
            set_class_ref(&object, &class, SCHEDULER_NAME, &context).await?;
            info!(
                "Scheduled '{}' claim in '{}' namespace to '{}' class!",
                object.name_any(),
                object.namespace().unwrap_or_default(),
                class.name_any()
            );

            Ok(Action::await_change())
        }
        None => {
            debug!(
                "No ExistingClusterClass matches '{}' claim, checking again later...",
                object.name_any()
            );

            Ok(Action::requeue(context.timings.sync_period))
        }
    }
}

pub fn reconcile_claim_scheduling_error(
    _object: Arc<KubernetesCluster>,
    _error: &ReconcilerError,
    context: Arc<ReconcilerContext>,
) -> Action {
    Action::requeue(context.timings.error_requeue)
}
