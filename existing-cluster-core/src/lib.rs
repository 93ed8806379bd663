pub mod helpers;
pub mod kubeconfig;
pub mod kubernetes;
pub mod resources;

/// API group of the managed resources and classes served by this provider.
pub const CONTAINER_GROUP: &str = "container.dev.crossplane.io";
