pub mod crds;
pub mod install;
pub mod run;
pub mod uninstall;
