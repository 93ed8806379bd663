use thiserror::Error;

use crate::managed::external::{ConnectError, ExternalError};

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("Object is missing metadata!")]
    MissingObjectMetadata,
    #[error("Couldn't connect to the external cluster! Reason: {}", .0)]
    Connect(ConnectError),
    #[error("Couldn't reconcile the external cluster! Reason: {}", .0)]
    External(ExternalError),
    #[error("Couldn't patch the resource! Reason: {}", .0)]
    KubeApiError(kube::Error),
}
