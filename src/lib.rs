//! Reconciliation of proxy fleet workloads.
//!
//! Every logical proxy owns exactly one workload in the cluster, either a `Deployment` or a
//! `DaemonSet`, named after the proxy's identity. [`WorkloadReconciler`] converges that workload
//! towards the state rendered from a [`ProxyDesiredState`] and tears it down on deletion.

pub mod cluster;
pub mod core;
pub mod model;
pub mod policy;
pub mod service;

pub use crate::cluster::WorkloadClient;
pub use crate::core::error::{ClusterError, Error};
pub use crate::model::proxy::{ProxyDesiredState, ProxyIdentity, WorkloadProvider};
pub use crate::model::workload::{Workload, WorkloadKind};
pub use crate::service::reconciler_svc::WorkloadReconciler;
