use async_trait::async_trait;

use crate::core::error::ClusterError;
use crate::model::workload::{Workload, WorkloadKind};

pub mod kube_client;
pub mod memory;

/// Single-object access to the proxy workloads stored in the cluster.
///
/// Implementations must report a missing object as [`ClusterError::NotFound`] from `update` and
/// `delete`, and as `Ok(None)` from `get`.
#[async_trait]
pub trait WorkloadClient: Send + Sync {
    async fn get(&self, namespace: &str, name: &str, kind: WorkloadKind) -> Result<Option<Workload>, ClusterError>;

    async fn create(&self, workload: &Workload) -> Result<(), ClusterError>;

    /// Replaces the whole stored object; a set `resourceVersion` must match the stored one.
    async fn update(&self, workload: &Workload) -> Result<(), ClusterError>;

    async fn delete(&self, namespace: &str, name: &str, kind: WorkloadKind) -> Result<(), ClusterError>;
}
