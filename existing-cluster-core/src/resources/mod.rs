pub mod annotations;
pub mod common;
pub mod connection;
pub mod crd;
