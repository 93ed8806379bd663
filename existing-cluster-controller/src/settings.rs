use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct ReconcileTimings {
    /// requeue delay after a successful reconciliation
    pub sync_period: Duration,
    /// requeue delay while waiting on another resource to become ready
    pub wait: Duration,
    /// requeue delay after a failed reconciliation
    pub error_requeue: Duration,
}
