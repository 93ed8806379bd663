use std::fmt::Debug;

use existing_cluster_core::helpers::pretty_type_name;
use kube::{
    runtime::{
        controller::{Action, Error as ControllerError},
        reflector::ObjectRef,
        watcher::Error as WatcherError,
    },
    Resource,
};
use log::{error, info, warn};

pub fn handle_reconciliation_result<T, E>(
    result: Result<(ObjectRef<T>, Action), ControllerError<E, WatcherError>>,
) -> impl std::future::Future<Output = ()>
where
    T: Resource,
    E: Debug,
{
    let resource_name = pretty_type_name::<T>();

    match result {
        Ok((object, action)) => info!(
            "Reconciled {} '{}' in '{}' namespace. Next action: {:?}",
            resource_name.to_lowercase(),
            object.name,
            object.namespace.as_deref().unwrap_or("---"),
            action
        ),
        Err(ControllerError::ObjectNotFound(_)) => (), // deleted in the meantime, nothing to do
        Err(ControllerError::ReconcilerFailed(reconciler_error, with_obj)) => warn!(
            "{} reconciliation failed for '{}' (namespace {}): {:#?}",
            resource_name,
            with_obj.name,
            with_obj.namespace.as_deref().unwrap_or("---"),
            reconciler_error
        ),
        Err(ControllerError::QueueError(watcher_err)) => {
            error!("{resource_name} watcher has failed! {watcher_err:#?}")
        }
        #[allow(unreachable_patterns)]
        Err(other) => error!("{resource_name} controller has failed! {other:#?}"),
    }

    std::future::ready(())
}
