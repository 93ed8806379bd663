use kube::Client;

use crate::settings::ReconcileTimings;

pub struct ReconcilerContext {
    pub client: Client,
    pub timings: ReconcileTimings,
}
