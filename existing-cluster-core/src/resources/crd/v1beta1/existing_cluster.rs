use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::resources::common::{ReclaimPolicy, ResourceSpec, ResourceStatus};

/// State reported for every existing cluster, they are never provisioned.
pub const CLUSTER_STATE_RUNNING: &str = "RUNNING";

pub const DEFAULT_RECLAIM_POLICY: ReclaimPolicy = ReclaimPolicy::Retain;

/// Desired state of an existing cluster. There is nothing to configure,
/// the cluster is taken as it is.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct ExistingClusterParameters {}

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "container.dev.crossplane.io",
    version = "v1beta1",
    kind = "ExistingCluster",
    status = "ExistingClusterStatus",
    printcolumn = r#"{"name":"STATUS","type":"string","jsonPath":".status.bindingPhase"}"#,
    printcolumn = r#"{"name":"STATE","type":"string","jsonPath":".status.atProvider.status"}"#,
    printcolumn = r#"{"name":"ENDPOINT","type":"string","jsonPath":".status.atProvider.endpoint"}"#,
    printcolumn = r#"{"name":"CLUSTER-CLASS","type":"string","jsonPath":".spec.classRef.name"}"#,
    printcolumn = r#"{"name":"RECLAIM-POLICY","type":"string","jsonPath":".spec.reclaimPolicy"}"#,
    printcolumn = r#"{"name":"AGE","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct ExistingClusterSpec {
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,
    #[serde(default)]
    pub for_provider: ExistingClusterParameters,
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExistingClusterObservation {
    pub status: Option<String>,
    pub status_message: Option<String>,
    /// API server URL of the cluster
    pub endpoint: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExistingClusterStatus {
    #[serde(flatten)]
    pub resource_status: ResourceStatus,
    #[serde(default)]
    pub at_provider: ExistingClusterObservation,
}

impl ExistingCluster {
    pub fn reclaim_policy(&self) -> ReclaimPolicy {
        self.spec
            .resource_spec
            .reclaim_policy
            .unwrap_or(DEFAULT_RECLAIM_POLICY)
    }

    pub fn resource_status(&self) -> ResourceStatus {
        self.status
            .as_ref()
            .map(|status| status.resource_status.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use kube::CustomResourceExt;

    use crate::resources::common::{BindingPhase, ReclaimPolicy};

    use super::ExistingCluster;

    const MANAGED: &str = r#"
apiVersion: container.dev.crossplane.io/v1beta1
kind: ExistingCluster
metadata:
  name: default-app-cluster-x7kq2
spec:
  providerRef:
    name: example-provider
  reclaimPolicy: Delete
  writeConnectionSecretToRef:
    name: 8d3c4fd0-4f4c-4b84-9b8b-7c1c3a4fd2a1
    namespace: crossplane-system
  forProvider: {}
status:
  bindingPhase: Bound
  atProvider:
    status: RUNNING
    endpoint: https://10.0.0.1:6443
"#;

    #[test]
    fn existing_cluster_deserializes_inlined_resource_fields() {
        let cluster: ExistingCluster = serde_yaml::from_str(MANAGED).unwrap();

        assert_eq!(cluster.spec.resource_spec.provider_ref.name, "example-provider");
        assert_eq!(cluster.reclaim_policy(), ReclaimPolicy::Delete);
        assert_eq!(
            cluster.resource_status().binding_phase,
            Some(BindingPhase::Bound)
        );
        assert_eq!(
            cluster.status.unwrap().at_provider.endpoint.as_deref(),
            Some("https://10.0.0.1:6443")
        );
    }

    #[test]
    fn existing_cluster_crd_is_cluster_scoped() {
        let crd = ExistingCluster::crd();

        assert_eq!(
            crd.metadata.name.as_deref(),
            Some("existingclusters.container.dev.crossplane.io")
        );
        assert_eq!(crd.spec.scope, "Cluster");
    }
}
