use std::sync::Arc;

use existing_cluster_core::{
    kubernetes::GetApi,
    resources::crd::{kind_api_version, v1beta1::existing_cluster::ExistingCluster},
};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    runtime::{watcher::Config, Controller},
    Client,
};
use log::info;

use crate::{helpers::handle_reconciliation_result, settings::ReconcileTimings};

use self::{
    external::ClusterConnector,
    reconciler::{
        context::ReconcilerContext, reconcile_existing_cluster, reconcile_existing_cluster_error,
    },
};

pub mod external;
pub mod reconciler;

pub const MANAGED_FIELD_MANAGER: &str = "existingcluster.container.dev.crossplane.io";
pub const MANAGED_FINALIZER: &str = "finalizer.managedresource.crossplane.io";

pub async fn start_existing_cluster_controller(client: Client, timings: ReconcileTimings) {
    info!(
        "Creating {} controller...",
        kind_api_version::<ExistingCluster>()
    );

    let context = Arc::new(ReconcilerContext {
        connector: ClusterConnector::new(client.clone()),
        client,
        timings,
    });

    let watcher_config = Config::default();
    let controller = Controller::new(
        context.client.global_api::<ExistingCluster>(),
        watcher_config.clone(),
    )
    .owns(context.client.global_api::<Secret>(), watcher_config)
    .shutdown_on_signal()
    .run(
        reconcile_existing_cluster,
        reconcile_existing_cluster_error,
        context,
    )
    .for_each(handle_reconciliation_result);

    info!("ExistingCluster controller created!");

    controller.await
}
