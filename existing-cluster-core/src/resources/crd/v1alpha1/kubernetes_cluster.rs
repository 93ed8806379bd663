use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::resources::common::{ResourceClaimSpec, ResourceStatus};

/// Portable claim for a Kubernetes cluster. The type is owned by Crossplane,
/// the provider only reads and binds it.
#[skip_serializing_none]
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "compute.crossplane.io",
    version = "v1alpha1",
    kind = "KubernetesCluster",
    namespaced,
    status = "ResourceStatus",
    printcolumn = r#"{"name":"STATUS","type":"string","jsonPath":".status.bindingPhase"}"#,
    printcolumn = r#"{"name":"CLUSTER-CLASS","type":"string","jsonPath":".spec.classRef.name"}"#,
    printcolumn = r#"{"name":"CLUSTER-REF","type":"string","jsonPath":".spec.resourceRef.name"}"#,
    printcolumn = r#"{"name":"AGE","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct KubernetesClusterSpec {
    #[serde(flatten)]
    pub claim_spec: ResourceClaimSpec,
    /// requested Kubernetes version, informational for existing clusters
    pub cluster_version: Option<String>,
}

impl KubernetesCluster {
    pub fn resource_status(&self) -> ResourceStatus {
        self.status.clone().unwrap_or_default()
    }
}
