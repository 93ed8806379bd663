use std::fmt::Debug;

use k8s_openapi::NamespaceResourceScope;
use kube::{Api, Client, Resource};
use serde::de::DeserializeOwned;

pub mod operations;

pub trait GetApi {
    fn global_api<T>(&self) -> Api<T>
    where
        T: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug;

    fn namespaced_api<T>(&self, namespace: &str) -> Api<T>
    where
        T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
            + Clone
            + DeserializeOwned
            + Debug;
}

impl GetApi for Client {
    fn global_api<T>(&self) -> Api<T>
    where
        T: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug,
    {
        Api::all(self.clone())
    }

    fn namespaced_api<T>(&self, namespace: &str) -> Api<T>
    where
        T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
            + Clone
            + DeserializeOwned
            + Debug,
    {
        Api::namespaced(self.clone(), namespace)
    }
}
