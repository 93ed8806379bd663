use std::borrow::Cow;

use k8s_openapi::{
    apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition,
    ClusterResourceScope,
};
use kube::{
    core::{schema::StructuralSchemaRewriter, ObjectMeta},
    Resource,
};
use schemars::{gen::SchemaSettings, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{resources::common::ClassSpecTemplate, CONTAINER_GROUP};

use super::{existing_cluster::ExistingClusterParameters, VERSION};

const KIND: &str = "ExistingClusterClass";
const PLURAL: &str = "existingclusterclasses";
const SINGULAR: &str = "existingclusterclass";

/// Resource class for existing clusters.
///
/// Classes keep their template under a top level `specTemplate` field instead
/// of `spec`, so the type implements [`Resource`] by hand and builds its own
/// CRD in [`ExistingClusterClass::crd`].
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExistingClusterClass {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec_template: ExistingClusterClassSpecTemplate,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExistingClusterClassSpecTemplate {
    #[serde(flatten)]
    pub class_spec_template: ClassSpecTemplate,
    #[serde(default)]
    pub for_provider: ExistingClusterParameters,
}

impl ExistingClusterClass {
    pub fn new(name: &str, spec_template: ExistingClusterClassSpecTemplate) -> Self {
        Self {
            api_version: Self::api_version(&()).into_owned(),
            kind: KIND.to_owned(),
            metadata: ObjectMeta {
                name: Some(name.to_owned()),
                ..Default::default()
            },
            spec_template,
        }
    }

    pub fn crd_name() -> String {
        format!("{PLURAL}.{CONTAINER_GROUP}")
    }

    pub fn crd() -> Result<CustomResourceDefinition, serde_json::Error> {
        let template_schema = SchemaSettings::openapi3()
            .with(|s| {
                s.inline_subschemas = true;
                s.meta_schema = None;
            })
            .with_visitor(StructuralSchemaRewriter)
            .into_generator()
            .into_root_schema_for::<ExistingClusterClassSpecTemplate>();

        serde_json::from_value(json!({
            "apiVersion": "apiextensions.k8s.io/v1",
            "kind": "CustomResourceDefinition",
            "metadata": { "name": Self::crd_name() },
            "spec": {
                "group": CONTAINER_GROUP,
                "names": {
                    "kind": KIND,
                    "listKind": format!("{KIND}List"),
                    "plural": PLURAL,
                    "singular": SINGULAR,
                    "categories": ["class", "crossplane"],
                },
                "scope": "Cluster",
                "versions": [{
                    "name": VERSION,
                    "served": true,
                    "storage": true,
                    "additionalPrinterColumns": [
                        { "name": "PROVIDER-REF", "type": "string", "jsonPath": ".specTemplate.providerRef.name" },
                        { "name": "RECLAIM-POLICY", "type": "string", "jsonPath": ".specTemplate.reclaimPolicy" },
                        { "name": "AGE", "type": "date", "jsonPath": ".metadata.creationTimestamp" },
                    ],
                    "schema": {
                        "openAPIV3Schema": {
                            "type": "object",
                            "required": ["specTemplate"],
                            "properties": {
                                "specTemplate": template_schema,
                            },
                        },
                    },
                }],
            },
        }))
    }
}

impl Resource for ExistingClusterClass {
    type DynamicType = ();
    type Scope = ClusterResourceScope;

    fn kind(_: &()) -> Cow<'_, str> {
        KIND.into()
    }

    fn group(_: &()) -> Cow<'_, str> {
        CONTAINER_GROUP.into()
    }

    fn version(_: &()) -> Cow<'_, str> {
        VERSION.into()
    }

    fn plural(_: &()) -> Cow<'_, str> {
        PLURAL.into()
    }

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use kube::Resource;

    use crate::resources::common::ReclaimPolicy;

    use super::ExistingClusterClass;

    const CLASS: &str = include_str!("../../../../../demos/container/kubernetescluster/resource-class.yaml");

    #[test]
    fn demo_class_deserializes() {
        let class: ExistingClusterClass = serde_yaml::from_str(CLASS).unwrap();
        let template = &class.spec_template.class_spec_template;

        assert_eq!(class.metadata.name.as_deref(), Some("existing-cluster-class"));
        assert_eq!(template.provider_ref.name, "example-provider");
        assert_eq!(template.write_connection_secrets_to_namespace, "crossplane-system");
        assert_eq!(template.reclaim_policy, Some(ReclaimPolicy::Delete));
    }

    #[test]
    fn new_class_carries_type_information() {
        let class = ExistingClusterClass::new("default", Default::default());

        assert_eq!(class.api_version, "container.dev.crossplane.io/v1beta1");
        assert_eq!(class.kind, "ExistingClusterClass");
        assert_eq!(ExistingClusterClass::plural(&()), "existingclusterclasses");
    }

    #[test]
    fn class_crd_exposes_spec_template() {
        let crd = ExistingClusterClass::crd().unwrap();
        let version = &crd.spec.versions[0];
        let schema = version
            .schema
            .as_ref()
            .and_then(|s| s.open_api_v3_schema.as_ref())
            .unwrap();
        let template = schema.properties.as_ref().unwrap().get("specTemplate").unwrap();

        assert_eq!(crd.metadata.name.as_deref(), Some("existingclusterclasses.container.dev.crossplane.io"));
        assert_eq!(crd.spec.scope, "Cluster");
        assert!(template
            .properties
            .as_ref()
            .unwrap()
            .contains_key("writeConnectionSecretsToNamespace"));
    }
}
