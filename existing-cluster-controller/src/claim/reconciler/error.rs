use std::borrow::Cow;

use thiserror::Error;

use crate::claim::configure::ConfigureError;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("Object is missing metadata!")]
    MissingObjectMetadata,
    #[error("'{}' resource is missing required data!", .0)]
    MissingObjectData(Cow<'static, str>),
    #[error("Couldn't patch the resource! Reason: {}", .0)]
    KubeApiError(kube::Error),
    #[error("ExistingClusterClass '{}' doesn't exist!", .0)]
    ClassNotFound(String),
    #[error("ExistingCluster '{}' doesn't exist!", .0)]
    ManagedNotFound(String),
    #[error("ExistingCluster '{}' is already bound to another claim!", .0)]
    ManagedBoundElsewhere(String),
    #[error("Connection secret '{}' doesn't exist yet!", .0)]
    ConnectionSecretNotFound(String),
    #[error("Couldn't configure the ExistingCluster! Reason: {}", .0)]
    Configure(ConfigureError),
}
