use std::collections::BTreeMap;

use existing_cluster_core::resources::{
    annotations::is_default_class,
    common::{selector::selector_matches, ObjectReference},
    crd::{
        v1alpha1::kubernetes_cluster::KubernetesCluster,
        v1beta1::{existing_cluster::ExistingCluster, existing_cluster_class::ExistingClusterClass},
    },
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::{runtime::reflector::ObjectRef, ResourceExt};
use rand::{seq::IteratorRandom, Rng};

/// Claims with a class selector that haven't been scheduled to a class yet.
pub fn needs_scheduling(claim: &KubernetesCluster) -> bool {
    let spec = &claim.spec.claim_spec;

    claim.metadata.deletion_timestamp.is_none()
        && spec.class_selector.is_some()
        && spec.class_ref.is_none()
        && spec.resource_ref.is_none()
}

/// Claims that name neither a class selector, a class nor a resource.
pub fn needs_defaulting(claim: &KubernetesCluster) -> bool {
    let spec = &claim.spec.claim_spec;

    claim.metadata.deletion_timestamp.is_none()
        && spec.class_selector.is_none()
        && spec.class_ref.is_none()
        && spec.resource_ref.is_none()
}

/// Claims scheduled to an existing cluster class or bound to an existing cluster.
pub fn is_existing_cluster_claim(claim: &KubernetesCluster) -> bool {
    let spec = &claim.spec.claim_spec;

    spec.class_ref
        .as_ref()
        .is_some_and(|reference| reference.is_kind::<ExistingClusterClass>())
        || spec
            .resource_ref
            .as_ref()
            .is_some_and(|reference| reference.is_kind::<ExistingCluster>())
}

pub fn choose_matching_class<'a, R: Rng + ?Sized>(
    classes: &'a [ExistingClusterClass],
    selector: &LabelSelector,
    rng: &mut R,
) -> Option<&'a ExistingClusterClass> {
    let no_labels = BTreeMap::new();

    classes
        .iter()
        .filter(|class| selector_matches(selector, class.metadata.labels.as_ref().unwrap_or(&no_labels)))
        .choose(rng)
}

pub fn choose_default_class<'a, R: Rng + ?Sized>(
    classes: &'a [ExistingClusterClass],
    rng: &mut R,
) -> Option<&'a ExistingClusterClass> {
    classes.iter().filter(|class| is_default_class(*class)).choose(rng)
}

/// Whether `reference` points at `claim`. The UID is only compared when both
/// sides carry one.
pub fn references_claim(reference: &ObjectReference, claim: &KubernetesCluster) -> bool {
    let uid_matches = match (&reference.uid, &claim.metadata.uid) {
        (Some(reference_uid), Some(claim_uid)) => reference_uid == claim_uid,
        _ => true,
    };

    reference.is_kind::<KubernetesCluster>()
        && Some(reference.name.as_str()) == claim.metadata.name.as_deref()
        && reference.namespace == claim.namespace()
        && uid_matches
}

/// Claim an existing cluster is bound to, used to requeue the claim whenever
/// the cluster changes.
pub fn bound_claim(cluster: ExistingCluster) -> Option<ObjectRef<KubernetesCluster>> {
    let reference = cluster.spec.resource_spec.claim_ref?;

    if !reference.is_kind::<KubernetesCluster>() {
        return None;
    }

    Some(ObjectRef::new(&reference.name).within(&reference.namespace?))
}
