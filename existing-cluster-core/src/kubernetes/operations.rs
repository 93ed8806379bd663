use std::fmt::Debug;

use anyhow::{anyhow, Context};
use k8s_openapi::{
    apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition,
    serde::{de::DeserializeOwned, Serialize},
    NamespaceResourceScope,
};
use kube::{
    api::{DeleteParams, Patch, PatchParams},
    config::{KubeConfigOptions, Kubeconfig},
    Api, Client, Config, Resource,
};
use log::{debug, info};
use serde_json::json;

use crate::helpers::pretty_type_name;

pub async fn create_local_client(
    config_path: &Option<String>,
    context_name: &Option<String>,
) -> anyhow::Result<Client> {
    let config_options = KubeConfigOptions {
        context: context_name.to_owned(),
        ..Default::default()
    };

    let config = match (config_path, context_name) {
        (Some(path), _) => {
            let kubeconfig = Kubeconfig::read_from(path)?;
            Config::from_custom_kubeconfig(kubeconfig, &config_options).await?
        }
        (None, Some(_)) => Config::from_kubeconfig(&config_options).await?,
        (None, None) => Config::infer().await?,
    };

    let client = Client::try_from(config)?;

    Ok(client)
}

pub fn is_not_found(error: &kube::Error) -> bool {
    matches!(error, kube::Error::Api(response) if response.code == 404)
}

pub async fn try_get_resource<T>(
    client: &Client,
    name: &str,
    namespace: &str,
) -> Result<Option<T>, kube::Error>
where
    T: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug,
{
    let resource_api: Api<T> = Api::namespaced(client.clone(), namespace);

    resource_api.get_opt(name).await
}

pub async fn try_get_cluster_resource<T>(client: &Client, name: &str) -> Result<Option<T>, kube::Error>
where
    T: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug,
{
    let resource_api: Api<T> = Api::all(client.clone());

    resource_api.get_opt(name).await
}

pub async fn apply_resource<T>(
    client: &Client,
    resource: &T,
    patch_params: &PatchParams,
) -> Result<T, kube::Error>
where
    T: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Serialize
        + Clone
        + DeserializeOwned
        + Debug,
{
    let resource_name = resource.meta().name.as_deref().unwrap_or_default();
    let namespace = resource.meta().namespace.as_deref().unwrap_or_default();

    debug!(
        "Applying '{resource_name}' {} in '{namespace}' namespace...",
        pretty_type_name::<T>()
    );

    let resource_api: Api<T> = Api::namespaced(client.clone(), namespace);
    resource_api
        .patch(resource_name, patch_params, &Patch::Apply(resource))
        .await
}

/// Server side applies `status` as the whole status of the named object,
/// owned by the field manager in `patch_params`.
pub async fn apply_resource_status<T, S>(
    api: &Api<T>,
    name: &str,
    status: &S,
    patch_params: &PatchParams,
) -> Result<T, kube::Error>
where
    T: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug,
    S: Serialize,
{
    let patch = json!({
        "apiVersion": T::api_version(&()),
        "kind": T::kind(&()),
        "status": status,
    });

    api.patch_status(name, patch_params, &Patch::Apply(&patch))
        .await
}

/// Merge patches a subset of the named object's status, leaving fields owned
/// by other controllers alone.
pub async fn merge_resource_status<T>(
    api: &Api<T>,
    name: &str,
    status: serde_json::Value,
    patch_params: &PatchParams,
) -> Result<T, kube::Error>
where
    T: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug,
{
    api.patch_status(name, patch_params, &Patch::Merge(&json!({ "status": status })))
        .await
}

pub async fn merge_resource_spec<T>(
    api: &Api<T>,
    name: &str,
    spec: serde_json::Value,
    patch_params: &PatchParams,
) -> Result<T, kube::Error>
where
    T: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug,
{
    api.patch(name, patch_params, &Patch::Merge(&json!({ "spec": spec })))
        .await
}

/// Deletes the named object, treating an already missing object as success.
pub async fn try_delete_resource<T>(
    api: &Api<T>,
    name: &str,
    delete_params: &DeleteParams,
) -> Result<(), kube::Error>
where
    T: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug,
{
    match api.delete(name, delete_params).await {
        Ok(_) => Ok(()),
        Err(error) if is_not_found(&error) => Ok(()),
        Err(error) => Err(error),
    }
}

pub async fn try_remove_cluster_resource<T>(
    client: &Client,
    name: &str,
    delete_params: &DeleteParams,
) -> anyhow::Result<()>
where
    T: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug,
{
    info!("Removing '{name}' {}...", pretty_type_name::<T>());

    let resource_api: Api<T> = Api::all(client.clone());
    try_delete_resource(&resource_api, name, delete_params)
        .await
        .context(format!(
            "Unable to remove '{name}' {}!",
            pretty_type_name::<T>()
        ))
}

pub async fn apply_crd(
    client: &Client,
    crd: &CustomResourceDefinition,
    patch_params: &PatchParams,
) -> anyhow::Result<()> {
    let crd_name = crd
        .metadata
        .name
        .as_ref()
        .ok_or_else(|| anyhow!("CRD is missing a name!"))?;
    let crd_apiversions = crd
        .spec
        .versions
        .iter()
        .map(|version| version.name.as_str())
        .collect::<Vec<&str>>()
        .join(", ");

    info!("Applying {crd_name} ({crd_apiversions}) CRD...");

    let crd_api: Api<CustomResourceDefinition> = Api::all(client.clone());
    crd_api
        .patch(crd_name, patch_params, &Patch::Apply(crd))
        .await
        .context(format!(
            "Unable to apply {crd_name} ({crd_apiversions}) CRD!"
        ))?;

    Ok(())
}
