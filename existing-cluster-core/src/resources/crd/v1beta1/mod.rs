pub mod existing_cluster;
pub mod existing_cluster_class;
pub mod provider;

pub const VERSION: &str = "v1beta1";
