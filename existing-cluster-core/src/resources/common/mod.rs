//! Resource model shared by managed resources, resource classes and claims.

use std::fmt::Display;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::Resource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

pub mod condition;
pub mod selector;

use self::condition::{get_condition, set_conditions, Condition, ConditionType};

/// What happens to a managed resource once its claim is deleted.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
pub enum ReclaimPolicy {
    /// the managed resource is released and kept around
    Retain,
    /// the managed resource is deleted together with the claim
    Delete,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
pub enum BindingPhase {
    Unbindable,
    Unbound,
    Bound,
    Released,
}

impl Display for BindingPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingPhase::Unbindable => f.write_str("Unbindable"),
            BindingPhase::Unbound => f.write_str("Unbound"),
            BindingPhase::Bound => f.write_str("Bound"),
            BindingPhase::Released => f.write_str("Released"),
        }
    }
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    pub api_version: Option<String>,
    pub kind: Option<String>,
    pub name: String,
    pub namespace: Option<String>,
    pub uid: Option<String>,
}

impl ObjectReference {
    pub fn to<K: Resource<DynamicType = ()>>(object: &K) -> Self {
        let meta = object.meta();

        Self {
            api_version: Some(K::api_version(&()).into_owned()),
            kind: Some(K::kind(&()).into_owned()),
            name: meta.name.clone().unwrap_or_default(),
            namespace: meta.namespace.clone(),
            uid: meta.uid.clone(),
        }
    }

    /// Whether this reference points at a `K`. A missing apiVersion only checks the kind.
    pub fn is_kind<K: Resource<DynamicType = ()>>(&self) -> bool {
        let kind_matches = self.kind.as_deref() == Some(K::kind(&()).as_ref());
        let api_version_matches = match &self.api_version {
            Some(api_version) => api_version.as_str() == K::api_version(&()).as_ref(),
            None => true,
        };

        kind_matches && api_version_matches
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct SecretReference {
    pub name: String,
    pub namespace: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct LocalSecretReference {
    pub name: String,
}

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
pub struct SecretKeySelector {
    pub name: String,
    pub namespace: String,
    /// key within the secret, defaults to the resource's natural key when unset
    pub key: Option<String>,
}

/// Spec fields carried by every managed resource.
#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    /// secret the connection details of this resource are written to
    pub write_connection_secret_to_ref: Option<SecretReference>,
    /// claim this resource is bound to
    pub claim_ref: Option<ObjectReference>,
    /// class this resource was dynamically provisioned from
    pub class_ref: Option<ObjectReference>,
    /// provider holding the credentials used to connect to the resource
    pub provider_ref: ObjectReference,
    /// what happens to this resource once its claim is deleted
    pub reclaim_policy: Option<ReclaimPolicy>,
}

/// Status fields carried by every managed resource.
#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    pub binding_phase: Option<BindingPhase>,
}

impl ResourceStatus {
    pub fn set_conditions(&mut self, conditions: impl IntoIterator<Item = Condition>) {
        set_conditions(&mut self.conditions, conditions)
    }

    pub fn condition(&self, type_: ConditionType) -> Option<&Condition> {
        get_condition(&self.conditions, type_)
    }

    pub fn is_bindable(&self) -> bool {
        matches!(self.binding_phase, Some(BindingPhase::Unbound))
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.binding_phase, Some(BindingPhase::Bound))
    }

    /// Marks the resource as available for binding unless it already is bound.
    pub fn set_bindable(&mut self) {
        if !self.is_bound() {
            self.binding_phase = Some(BindingPhase::Unbound);
        }
    }
}

/// Spec fields carried by every resource claim.
#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceClaimSpec {
    /// selects a matching class when no class is referenced directly
    pub class_selector: Option<LabelSelector>,
    pub class_ref: Option<ObjectReference>,
    /// managed resource this claim is bound to
    pub resource_ref: Option<ObjectReference>,
    /// secret in the claim's namespace the connection details are propagated to
    pub write_connection_secret_to_ref: Option<LocalSecretReference>,
}

/// Template fields carried by every resource class.
#[skip_serializing_none]
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassSpecTemplate {
    /// namespace dynamically provisioned resources write their connection secrets to
    pub write_connection_secrets_to_namespace: String,
    pub provider_ref: ObjectReference,
    pub reclaim_policy: Option<ReclaimPolicy>,
}

#[cfg(test)]
mod tests {
    use k8s_openapi::api::core::v1::Secret;

    use super::{BindingPhase, ObjectReference, ResourceStatus};

    #[test]
    fn set_bindable_keeps_bound_resources_bound() {
        let mut status = ResourceStatus {
            binding_phase: Some(BindingPhase::Bound),
            ..Default::default()
        };

        status.set_bindable();

        assert_eq!(status.binding_phase, Some(BindingPhase::Bound));
    }

    #[test]
    fn set_bindable_makes_released_resources_bindable_again() {
        let mut status = ResourceStatus {
            binding_phase: Some(BindingPhase::Released),
            ..Default::default()
        };

        status.set_bindable();

        assert!(status.is_bindable());
    }

    #[test]
    fn object_reference_kind_check_ignores_missing_api_version() {
        let reference = ObjectReference {
            kind: Some("Secret".to_owned()),
            name: "creds".to_owned(),
            ..Default::default()
        };

        assert!(reference.is_kind::<Secret>());
    }

    #[test]
    fn object_reference_kind_check_compares_api_version() {
        let reference = ObjectReference {
            api_version: Some("example.org/v1".to_owned()),
            kind: Some("Secret".to_owned()),
            name: "creds".to_owned(),
            ..Default::default()
        };

        assert!(!reference.is_kind::<Secret>());
    }
}
