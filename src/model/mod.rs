pub mod crd;
pub mod proxy;
pub mod workload;
