//! Extraction of connection details from a client-go kubeconfig document.
//!
//! Only the credentials of the current context are read. File references
//! (`certificate-authority`, `client-certificate`, ...) and exec/auth-provider
//! plugins are ignored since the referenced files and binaries don't exist
//! where the connection secret ends up being consumed.

use data_encoding::BASE64;
use kube::config::{AuthInfo, Kubeconfig};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::resources::connection::{
    ConnectionDetails, CLIENT_CERT_KEY, CLIENT_KEY_KEY, CLUSTER_CA_KEY, ENDPOINT_KEY,
    KUBECONFIG_KEY, PASSWORD_KEY, TOKEN_KEY, USERNAME_KEY,
};

#[derive(Debug, Error)]
pub enum KubeconfigError {
    #[error("Kubeconfig is not valid UTF-8!")]
    NotUtf8(#[from] std::str::Utf8Error),
    #[error("Kubeconfig couldn't be parsed! Reason: {}", .0)]
    Parse(#[from] kube::config::KubeconfigError),
    #[error("Kubeconfig has no current context set!")]
    MissingCurrentContext,
    #[error("Context '{}' is not defined in the kubeconfig!", .0)]
    UnknownContext(String),
    #[error("Cluster '{}' is not defined in the kubeconfig!", .0)]
    UnknownCluster(String),
    #[error("User '{}' is not defined in the kubeconfig!", .0)]
    UnknownUser(String),
    #[error("Cluster '{}' is missing a server address!", .0)]
    MissingServer(String),
    #[error("'{}' is not valid base64 data!", .0)]
    InvalidData(&'static str),
}

/// Credentials of a single cluster, with base64 fields already decoded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClusterCredentials {
    pub server: String,
    pub certificate_authority: Option<Vec<u8>>,
    pub client_certificate: Option<Vec<u8>>,
    pub client_key: Option<Vec<u8>>,
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

pub fn parse_kubeconfig(raw: &[u8]) -> Result<Kubeconfig, KubeconfigError> {
    let text = std::str::from_utf8(raw)?;

    Ok(Kubeconfig::from_yaml(text)?)
}

pub fn current_credentials(kubeconfig: &Kubeconfig) -> Result<ClusterCredentials, KubeconfigError> {
    let context_name = kubeconfig
        .current_context
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or(KubeconfigError::MissingCurrentContext)?;

    credentials(kubeconfig, context_name)
}

pub fn credentials(
    kubeconfig: &Kubeconfig,
    context_name: &str,
) -> Result<ClusterCredentials, KubeconfigError> {
    let context = kubeconfig
        .contexts
        .iter()
        .find(|c| c.name == context_name)
        .and_then(|c| c.context.as_ref())
        .ok_or_else(|| KubeconfigError::UnknownContext(context_name.to_owned()))?;

    let cluster = kubeconfig
        .clusters
        .iter()
        .find(|c| c.name == context.cluster)
        .ok_or_else(|| KubeconfigError::UnknownCluster(context.cluster.to_owned()))?
        .cluster
        .as_ref();

    let user = match context.user.as_str() {
        "" => AuthInfo::default(),
        user_name => kubeconfig
            .auth_infos
            .iter()
            .find(|u| u.name == user_name)
            .ok_or_else(|| KubeconfigError::UnknownUser(user_name.to_owned()))?
            .auth_info
            .clone()
            .unwrap_or_default(),
    };

    Ok(ClusterCredentials {
        server: cluster
            .and_then(|cluster| cluster.server.clone())
            .filter(|server| !server.is_empty())
            .ok_or_else(|| KubeconfigError::MissingServer(context.cluster.to_owned()))?,
        certificate_authority: decode(
            cluster.and_then(|cluster| cluster.certificate_authority_data.as_deref()),
            "certificate-authority-data",
        )?,
        client_certificate: decode(
            user.client_certificate_data.as_deref(),
            "client-certificate-data",
        )?,
        client_key: decode(
            user.client_key_data.as_ref().map(|key| key.expose_secret().as_str()),
            "client-key-data",
        )?,
        token: expose(&user.token),
        username: user.username,
        password: expose(&user.password),
    })
}

impl ClusterCredentials {
    /// Connection details of these credentials. Fields missing from the
    /// kubeconfig are left out rather than written as empty values.
    pub fn to_connection_details(&self) -> ConnectionDetails {
        let mut details = ConnectionDetails::new();
        details.insert(ENDPOINT_KEY.to_owned(), self.server.as_bytes().to_vec());

        let optional = [
            (CLUSTER_CA_KEY, self.certificate_authority.clone()),
            (CLIENT_CERT_KEY, self.client_certificate.clone()),
            (CLIENT_KEY_KEY, self.client_key.clone()),
            (TOKEN_KEY, self.token.clone().map(String::into_bytes)),
            (USERNAME_KEY, self.username.clone().map(String::into_bytes)),
            (PASSWORD_KEY, self.password.clone().map(String::into_bytes)),
        ];

        for (key, value) in optional {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                details.insert(key.to_owned(), value);
            }
        }

        details
    }
}

/// Parses a raw kubeconfig and returns the connection details of its current
/// context, together with the raw document itself under `kubeconfig`.
pub fn connection_details(raw: &[u8]) -> Result<(ClusterCredentials, ConnectionDetails), KubeconfigError> {
    let credentials = current_credentials(&parse_kubeconfig(raw)?)?;
    let mut details = credentials.to_connection_details();
    details.insert(KUBECONFIG_KEY.to_owned(), raw.to_vec());

    Ok((credentials, details))
}

fn decode(data: Option<&str>, field: &'static str) -> Result<Option<Vec<u8>>, KubeconfigError> {
    data.map(str::trim)
        .filter(|data| !data.is_empty())
        .map(|data| {
            BASE64
                .decode(data.as_bytes())
                .map_err(|_| KubeconfigError::InvalidData(field))
        })
        .transpose()
}

fn expose(secret: &Option<SecretString>) -> Option<String> {
    secret.as_ref().map(|secret| secret.expose_secret().to_owned())
}
