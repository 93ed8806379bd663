use async_trait::async_trait;
use existing_cluster_core::{
    kubeconfig::{self, KubeconfigError},
    kubernetes::operations::{try_get_cluster_resource, try_get_resource},
    resources::{
        common::condition::Condition,
        connection::ConnectionDetails,
        crd::v1beta1::{
            existing_cluster::{ExistingCluster, CLUSTER_STATE_RUNNING},
            provider::Provider,
        },
    },
};
use k8s_openapi::api::core::v1::Secret;
use kube::Client;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("Couldn't get the '{}' Provider! Reason: {}", .0, .1)]
    GetProvider(String, kube::Error),
    #[error("Provider '{}' doesn't exist!", .0)]
    ProviderNotFound(String),
    #[error("Couldn't get the '{}' Provider Secret! Reason: {}", .0, .1)]
    GetProviderSecret(String, kube::Error),
    #[error("Provider Secret '{}' doesn't exist!", .0)]
    ProviderSecretNotFound(String),
    #[error("Provider Secret '{}' has no '{}' key!", .0, .1)]
    MissingCredentials(String, String),
}

#[derive(Debug, Error)]
pub enum ExternalError {
    #[error("Couldn't read the cluster's kubeconfig! Reason: {}", .0)]
    Kubeconfig(KubeconfigError),
}

#[derive(Debug, Default)]
pub struct ExternalObservation {
    pub resource_exists: bool,
    pub resource_up_to_date: bool,
    pub connection_details: ConnectionDetails,
}

#[derive(Debug, Default)]
pub struct ExternalCreation {
    pub connection_details: ConnectionDetails,
}

#[derive(Debug, Default)]
pub struct ExternalUpdate {
    pub connection_details: ConnectionDetails,
}

/// Produces an [`ExternalClient`] for a managed resource, usually by reading
/// the credentials of the provider it references.
#[async_trait]
pub trait ExternalConnecter: Send + Sync + 'static {
    type External: ExternalClient;

    async fn connect(&self, cluster: &ExistingCluster) -> Result<Self::External, ConnectError>;
}

/// Operations on the external resource behind a managed resource. Each call
/// may update the managed resource's status in place.
#[async_trait]
pub trait ExternalClient: Send + Sync {
    async fn observe(
        &self,
        cluster: &mut ExistingCluster,
    ) -> Result<ExternalObservation, ExternalError>;

    async fn create(&self, cluster: &mut ExistingCluster) -> Result<ExternalCreation, ExternalError>;

    async fn update(&self, cluster: &mut ExistingCluster) -> Result<ExternalUpdate, ExternalError>;

    async fn delete(&self, cluster: &mut ExistingCluster) -> Result<(), ExternalError>;
}

pub struct ClusterConnector {
    client: Client,
}

impl ClusterConnector {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExternalConnecter for ClusterConnector {
    type External = ClusterExternal;

    async fn connect(&self, cluster: &ExistingCluster) -> Result<ClusterExternal, ConnectError> {
        let provider_name = &cluster.spec.resource_spec.provider_ref.name;
        let provider = try_get_cluster_resource::<Provider>(&self.client, provider_name)
            .await
            .map_err(|err| ConnectError::GetProvider(provider_name.to_owned(), err))?
            .ok_or_else(|| ConnectError::ProviderNotFound(provider_name.to_owned()))?;

        let secret_ref = &provider.spec.credentials_secret_ref;
        let secret_name = format!("{}/{}", secret_ref.namespace, secret_ref.name);
        let secret =
            try_get_resource::<Secret>(&self.client, &secret_ref.name, &secret_ref.namespace)
                .await
                .map_err(|err| ConnectError::GetProviderSecret(secret_name.clone(), err))?
                .ok_or_else(|| ConnectError::ProviderSecretNotFound(secret_name.clone()))?;

        let kubeconfig = read_credentials(&secret, &secret_name, provider.credentials_key())?;

        Ok(ClusterExternal::new(kubeconfig))
    }
}

fn read_credentials(secret: &Secret, secret_name: &str, key: &str) -> Result<Vec<u8>, ConnectError> {
    secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .map(|value| value.0.clone())
        .ok_or_else(|| ConnectError::MissingCredentials(secret_name.to_owned(), key.to_owned()))
}

/// An existing cluster is never provisioned, so it always exists and is
/// always up to date. Observing it only publishes the kubeconfig it was
/// connected with.
pub struct ClusterExternal {
    kubeconfig: Vec<u8>,
}

impl ClusterExternal {
    pub fn new(kubeconfig: Vec<u8>) -> Self {
        Self { kubeconfig }
    }
}

#[async_trait]
impl ExternalClient for ClusterExternal {
    async fn observe(
        &self,
        cluster: &mut ExistingCluster,
    ) -> Result<ExternalObservation, ExternalError> {
        let (credentials, connection_details) =
            kubeconfig::connection_details(&self.kubeconfig).map_err(ExternalError::Kubeconfig)?;

        let status = cluster.status.get_or_insert_with(Default::default);
        status.at_provider.status = Some(CLUSTER_STATE_RUNNING.to_owned());
        status.at_provider.endpoint = Some(credentials.server);
        status.resource_status.set_conditions([Condition::available()]);
        status.resource_status.set_bindable();

        Ok(ExternalObservation {
            resource_exists: true,
            resource_up_to_date: true,
            connection_details,
        })
    }

    async fn create(&self, cluster: &mut ExistingCluster) -> Result<ExternalCreation, ExternalError> {
        cluster
            .status
            .get_or_insert_with(Default::default)
            .resource_status
            .set_conditions([Condition::creating()]);

        Ok(ExternalCreation::default())
    }

    async fn update(&self, _cluster: &mut ExistingCluster) -> Result<ExternalUpdate, ExternalError> {
        Ok(ExternalUpdate::default())
    }

    async fn delete(&self, cluster: &mut ExistingCluster) -> Result<(), ExternalError> {
        cluster
            .status
            .get_or_insert_with(Default::default)
            .resource_status
            .set_conditions([Condition::deleting()]);

        Ok(())
    }
}
