//! Configurators shaping a dynamically provisioned [`ExistingCluster`] from
//! the claim requesting it and the class it was scheduled to.

use existing_cluster_core::{
    helpers::RequireMetadata,
    resources::{
        annotations::{get_external_name, set_external_name},
        common::{ReclaimPolicy, ResourceSpec, SecretReference},
        crd::{
            v1alpha1::kubernetes_cluster::KubernetesCluster,
            v1beta1::{
                existing_cluster::{ExistingCluster, ExistingClusterSpec, DEFAULT_RECLAIM_POLICY},
                existing_cluster_class::ExistingClusterClass,
            },
        },
    },
};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigureError {
    #[error("Claim references a class of kind '{}', expected an ExistingClusterClass!", .0)]
    UnexpectedClassKind(String),
    #[error("Claim is missing its '{}' metadata!", .0)]
    MissingClaimMetadata(&'static str),
}

pub type ManagedConfigurator =
    fn(&KubernetesCluster, &ExistingClusterClass, &mut ExistingCluster) -> Result<(), ConfigureError>;

/// Configurators applied, in order, to every dynamically provisioned cluster.
pub const DEFAULT_CONFIGURATORS: [ManagedConfigurator; 3] = [
    configure_existing_cluster,
    configure_reclaim_policy,
    configure_names,
];

pub fn configure_managed(
    claim: &KubernetesCluster,
    class: &ExistingClusterClass,
    managed: &mut ExistingCluster,
    configurators: &[ManagedConfigurator],
) -> Result<(), ConfigureError> {
    configurators
        .iter()
        .try_for_each(|configure| configure(claim, class, managed))
}

/// Replaces the managed spec with the one templated by the class. The
/// connection secret lands in the class' namespace, named after the claim's
/// UID so claims with the same name in different namespaces don't collide.
pub fn configure_existing_cluster(
    claim: &KubernetesCluster,
    class: &ExistingClusterClass,
    managed: &mut ExistingCluster,
) -> Result<(), ConfigureError> {
    if let Some(class_ref) = &claim.spec.claim_spec.class_ref {
        if !class_ref.is_kind::<ExistingClusterClass>() {
            return Err(ConfigureError::UnexpectedClassKind(
                class_ref.kind.clone().unwrap_or_default(),
            ));
        }
    }

    let claim_uid = claim.require_uid_or(ConfigureError::MissingClaimMetadata("uid"))?;
    let template = &class.spec_template.class_spec_template;

    managed.spec = ExistingClusterSpec {
        resource_spec: ResourceSpec {
            write_connection_secret_to_ref: Some(SecretReference {
                name: claim_uid.to_owned(),
                namespace: template.write_connection_secrets_to_namespace.to_owned(),
            }),
            provider_ref: template.provider_ref.clone(),
            reclaim_policy: Some(template.reclaim_policy.unwrap_or(DEFAULT_RECLAIM_POLICY)),
            ..Default::default()
        },
        for_provider: class.spec_template.for_provider.clone(),
    };

    Ok(())
}

/// Fills in a reclaim policy when none was configured yet, preferring the
/// class' policy and falling back to `Delete`.
pub fn configure_reclaim_policy(
    _claim: &KubernetesCluster,
    class: &ExistingClusterClass,
    managed: &mut ExistingCluster,
) -> Result<(), ConfigureError> {
    let resource_spec = &mut managed.spec.resource_spec;

    if resource_spec.reclaim_policy.is_none() {
        resource_spec.reclaim_policy = Some(
            class
                .spec_template
                .class_spec_template
                .reclaim_policy
                .unwrap_or(ReclaimPolicy::Delete),
        );
    }

    Ok(())
}

pub fn configure_names(
    claim: &KubernetesCluster,
    _class: &ExistingClusterClass,
    managed: &mut ExistingCluster,
) -> Result<(), ConfigureError> {
    let name = claim.require_name_or(ConfigureError::MissingClaimMetadata("name"))?;
    let namespace =
        claim.require_namespace_or(ConfigureError::MissingClaimMetadata("namespace"))?;

    managed.metadata.generate_name = Some(format!("{namespace}-{name}-"));

    if let Some(external_name) = get_external_name(claim) {
        set_external_name(managed, external_name);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use existing_cluster_core::resources::{
        annotations::{get_external_name, set_external_name},
        common::{ObjectReference, ReclaimPolicy},
        crd::{
            v1alpha1::kubernetes_cluster::KubernetesCluster,
            v1beta1::{
                existing_cluster::ExistingCluster, existing_cluster_class::ExistingClusterClass,
            },
        },
    };
    use kube::core::ObjectMeta;

    use super::{
        configure_existing_cluster, configure_managed, configure_names, configure_reclaim_policy,
        ConfigureError, DEFAULT_CONFIGURATORS,
    };

    const CLASS: &str =
        include_str!("../../../demos/container/kubernetescluster/resource-class.yaml");
    const CLAIM: &str =
        include_str!("../../../demos/container/kubernetescluster/resource-claim.yaml");

    fn class() -> ExistingClusterClass {
        serde_yaml::from_str(CLASS).unwrap()
    }

    fn claim() -> KubernetesCluster {
        let mut claim: KubernetesCluster = serde_yaml::from_str(CLAIM).unwrap();
        claim.metadata.uid = Some("6a5b1f3e-claim-uid".to_owned());
        claim.spec.claim_spec.class_ref = Some(ObjectReference::to(&class()));
        claim
    }

    fn managed() -> ExistingCluster {
        ExistingCluster {
            metadata: ObjectMeta::default(),
            spec: Default::default(),
            status: None,
        }
    }

    #[test]
    fn existing_cluster_is_templated_from_class() {
        let mut managed = managed();

        configure_existing_cluster(&claim(), &class(), &mut managed).unwrap();
        let spec = &managed.spec.resource_spec;
        let secret_ref = spec.write_connection_secret_to_ref.as_ref().unwrap();

        assert_eq!(secret_ref.name, "6a5b1f3e-claim-uid");
        assert_eq!(secret_ref.namespace, "crossplane-system");
        assert_eq!(spec.provider_ref.name, "example-provider");
        assert_eq!(spec.reclaim_policy, Some(ReclaimPolicy::Delete));
    }

    #[test]
    fn existing_cluster_defaults_to_retain_without_class_policy() {
        let mut class = class();
        class.spec_template.class_spec_template.reclaim_policy = None;
        let mut managed = managed();

        configure_existing_cluster(&claim(), &class, &mut managed).unwrap();

        assert_eq!(
            managed.spec.resource_spec.reclaim_policy,
            Some(ReclaimPolicy::Retain)
        );
    }

    #[test]
    fn existing_cluster_rejects_foreign_class_kinds() {
        let mut claim = claim();
        claim.spec.claim_spec.class_ref = Some(ObjectReference {
            api_version: Some("container.gcp.crossplane.io/v1beta1".to_owned()),
            kind: Some("GKEClusterClass".to_owned()),
            name: "gke".to_owned(),
            ..Default::default()
        });

        let result = configure_existing_cluster(&claim, &class(), &mut managed());

        assert_eq!(
            result,
            Err(ConfigureError::UnexpectedClassKind("GKEClusterClass".to_owned()))
        );
    }

    #[test]
    fn existing_cluster_requires_claim_uid() {
        let mut claim = claim();
        claim.metadata.uid = None;

        let result = configure_existing_cluster(&claim, &class(), &mut managed());

        assert_eq!(result, Err(ConfigureError::MissingClaimMetadata("uid")));
    }

    #[test]
    fn reclaim_policy_keeps_configured_policy() {
        let mut managed = managed();
        managed.spec.resource_spec.reclaim_policy = Some(ReclaimPolicy::Retain);

        configure_reclaim_policy(&claim(), &class(), &mut managed).unwrap();

        assert_eq!(
            managed.spec.resource_spec.reclaim_policy,
            Some(ReclaimPolicy::Retain)
        );
    }

    #[test]
    fn reclaim_policy_falls_back_to_class_then_delete() {
        let mut managed = managed();
        configure_reclaim_policy(&claim(), &class(), &mut managed).unwrap();
        assert_eq!(
            managed.spec.resource_spec.reclaim_policy,
            Some(ReclaimPolicy::Delete)
        );

        let mut class = class();
        class.spec_template.class_spec_template.reclaim_policy = None;
        let mut managed = self::managed();
        configure_reclaim_policy(&claim(), &class, &mut managed).unwrap();
        assert_eq!(
            managed.spec.resource_spec.reclaim_policy,
            Some(ReclaimPolicy::Delete)
        );
    }

    #[test]
    fn names_are_generated_from_claim_and_external_name_is_kept() {
        let mut claim = claim();
        set_external_name(&mut claim, "prod-eu");
        let mut managed = managed();

        configure_names(&claim, &class(), &mut managed).unwrap();

        assert_eq!(
            managed.metadata.generate_name.as_deref(),
            Some("default-app-cluster-")
        );
        assert_eq!(get_external_name(&managed), Some("prod-eu"));
    }

    #[test]
    fn default_configurators_run_in_order() {
        let mut managed = managed();

        configure_managed(&claim(), &class(), &mut managed, &DEFAULT_CONFIGURATORS).unwrap();

        assert!(managed.metadata.name.is_none());
        assert_eq!(
            managed.metadata.generate_name.as_deref(),
            Some("default-app-cluster-")
        );
        assert_eq!(
            managed.spec.resource_spec.reclaim_policy,
            Some(ReclaimPolicy::Delete)
        );
        assert!(managed.spec.resource_spec.claim_ref.is_none());
    }
}
