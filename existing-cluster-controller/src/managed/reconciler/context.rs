use kube::Client;

use crate::{managed::external::ExternalConnecter, settings::ReconcileTimings};

pub struct ReconcilerContext<C: ExternalConnecter> {
    pub client: Client,
    pub connector: C,
    pub timings: ReconcileTimings,
}
