use std::collections::BTreeMap;

use k8s_openapi::{
    api::core::v1::Secret, apimachinery::pkg::apis::meta::v1::OwnerReference, ByteString,
};
use kube::core::ObjectMeta;

use super::common::SecretReference;

pub const KUBECONFIG_KEY: &str = "kubeconfig";
pub const ENDPOINT_KEY: &str = "endpoint";
pub const CLUSTER_CA_KEY: &str = "clusterCA";
pub const CLIENT_CERT_KEY: &str = "clientCert";
pub const CLIENT_KEY_KEY: &str = "clientKey";
pub const TOKEN_KEY: &str = "token";
pub const USERNAME_KEY: &str = "username";
pub const PASSWORD_KEY: &str = "password";

/// Connection secret data of a managed resource, keyed by the well known
/// connection keys above.
pub type ConnectionDetails = BTreeMap<String, Vec<u8>>;

pub fn generate_connection_secret(
    reference: &SecretReference,
    details: &ConnectionDetails,
    owner: OwnerReference,
) -> Secret {
    generate_secret(
        &reference.name,
        &reference.namespace,
        details
            .iter()
            .map(|(key, value)| (key.to_owned(), ByteString(value.to_owned())))
            .collect(),
        owner,
    )
}

/// Copies the data of `source` into a new secret, used to propagate
/// connection details from a managed resource into a claim's namespace.
pub fn generate_propagated_secret(
    source: &Secret,
    name: &str,
    namespace: &str,
    owner: OwnerReference,
) -> Secret {
    generate_secret(name, namespace, source.data.clone().unwrap_or_default(), owner)
}

fn generate_secret(
    name: &str,
    namespace: &str,
    data: BTreeMap<String, ByteString>,
    owner: OwnerReference,
) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some(namespace.to_owned()),
            owner_references: Some(vec![owner]),
            ..Default::default()
        },
        data: Some(data),
        type_: Some("connection.crossplane.io/v1alpha1".to_owned()),
        ..Default::default()
    }
}
