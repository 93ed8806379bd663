use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::resources::common::SecretKeySelector;

/// Secret key holding the kubeconfig when the provider doesn't name one.
pub const DEFAULT_CREDENTIALS_KEY: &str = "kubeconfig";

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
#[kube(
    group = "dev.crossplane.io",
    version = "v1beta1",
    kind = "Provider",
    printcolumn = r#"{"name":"SECRET-NAME","type":"string","jsonPath":".spec.credentialsSecretRef.name","priority":1}"#,
    printcolumn = r#"{"name":"AGE","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
pub struct ProviderSpec {
    /// secret holding the kubeconfig of the existing cluster
    pub credentials_secret_ref: SecretKeySelector,
}

impl Provider {
    pub fn credentials_key(&self) -> &str {
        self.spec
            .credentials_secret_ref
            .key
            .as_deref()
            .unwrap_or(DEFAULT_CREDENTIALS_KEY)
    }
}
