use std::sync::Arc;

use existing_cluster_core::{
    kubernetes::GetApi,
    resources::crd::{
        v1alpha1::kubernetes_cluster::KubernetesCluster,
        v1beta1::existing_cluster::ExistingCluster,
    },
};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    runtime::{watcher::Config, Controller},
    Client,
};
use log::info;
use tokio::join;

use crate::{helpers::handle_reconciliation_result, settings::ReconcileTimings};

use self::{
    reconciler::{
        binding::{reconcile_claim_binding, reconcile_claim_binding_error},
        context::ReconcilerContext,
        defaulting::{reconcile_claim_defaulting, reconcile_claim_defaulting_error},
        scheduling::{reconcile_claim_scheduling, reconcile_claim_scheduling_error},
    },
    selection::bound_claim,
};

pub mod configure;
pub mod reconciler;
pub mod selection;

pub const SCHEDULER_NAME: &str =
    "scheduler.kubernetescluster.existingclusterclass.container.dev.crossplane.io";
pub const DEFAULTER_NAME: &str =
    "defaulter.kubernetescluster.existingclusterclass.container.dev.crossplane.io";
pub const BINDER_NAME: &str =
    "binder.kubernetescluster.existingcluster.container.dev.crossplane.io";
pub const CLAIM_FINALIZER: &str = "finalizer.resourceclaim.crossplane.io";

pub async fn start_claim_controllers(client: Client, timings: ReconcileTimings) {
    let context = Arc::new(ReconcilerContext { client, timings });

    join!(
        start_scheduling_controller(&context),
        start_defaulting_controller(&context),
        start_binding_controller(&context)
    );
}

async fn start_scheduling_controller(context: &Arc<ReconcilerContext>) {
    info!("Creating KubernetesCluster scheduling controller...");

    let controller = Controller::new(
        context.client.global_api::<KubernetesCluster>(),
        Config::default(),
    )
    .shutdown_on_signal()
    .run(
        reconcile_claim_scheduling,
        reconcile_claim_scheduling_error,
        context.clone(),
    )
    .for_each(handle_reconciliation_result);

    info!("KubernetesCluster scheduling controller created!");

    controller.await
}

async fn start_defaulting_controller(context: &Arc<ReconcilerContext>) {
    info!("Creating KubernetesCluster defaulting controller...");

    let controller = Controller::new(
        context.client.global_api::<KubernetesCluster>(),
        Config::default(),
    )
    .shutdown_on_signal()
    .run(
        reconcile_claim_defaulting,
        reconcile_claim_defaulting_error,
        context.clone(),
    )
    .for_each(handle_reconciliation_result);

    info!("KubernetesCluster defaulting controller created!");

    controller.await
}

async fn start_binding_controller(context: &Arc<ReconcilerContext>) {
    info!("Creating KubernetesCluster binding controller...");

    let watcher_config = Config::default();
    let controller = Controller::new(
        context.client.global_api::<KubernetesCluster>(),
        watcher_config.clone(),
    )
    .owns(context.client.global_api::<Secret>(), watcher_config.clone())
    .watches(
        context.client.global_api::<ExistingCluster>(),
        watcher_config,
        bound_claim,
    )
    .shutdown_on_signal()
    .run(
        reconcile_claim_binding,
        reconcile_claim_binding_error,
        context.clone(),
    )
    .for_each(handle_reconciliation_result);

    info!("KubernetesCluster binding controller created!");

    controller.await
}
