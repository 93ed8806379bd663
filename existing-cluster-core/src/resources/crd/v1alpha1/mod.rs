pub mod kubernetes_cluster;
