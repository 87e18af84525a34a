use std::fmt;

use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use kube::ResourceExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WorkloadKind {
    /// Rolling set of replicas (`Deployment`)
    ReplicaManaged,
    /// One proxy per node (`DaemonSet`)
    PerNode,
}

impl WorkloadKind {
    /// The kind that must not coexist with `self` for the same proxy.
    pub fn other(self) -> WorkloadKind {
        match self {
            WorkloadKind::ReplicaManaged => WorkloadKind::PerNode,
            WorkloadKind::PerNode => WorkloadKind::ReplicaManaged,
        }
    }

    pub fn resource_kind(self) -> &'static str {
        match self {
            WorkloadKind::ReplicaManaged => "Deployment",
            WorkloadKind::PerNode => "DaemonSet",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_kind())
    }
}

/// A proxy workload object, either freshly rendered or as stored in the cluster.
#[derive(Debug, Clone, PartialEq)]
pub enum Workload {
    ReplicaManaged(Deployment),
    PerNode(DaemonSet),
}

impl Workload {
    pub fn kind(&self) -> WorkloadKind {
        match self {
            Workload::ReplicaManaged(_) => WorkloadKind::ReplicaManaged,
            Workload::PerNode(_) => WorkloadKind::PerNode,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Workload::ReplicaManaged(deployment) => deployment.name_any(),
            Workload::PerNode(daemon_set) => daemon_set.name_any(),
        }
    }

    pub fn namespace(&self) -> Option<String> {
        match self {
            Workload::ReplicaManaged(deployment) => deployment.namespace(),
            Workload::PerNode(daemon_set) => daemon_set.namespace(),
        }
    }

    pub fn resource_version(&self) -> Option<String> {
        match self {
            Workload::ReplicaManaged(deployment) => deployment.resource_version(),
            Workload::PerNode(daemon_set) => daemon_set.resource_version(),
        }
    }

    pub fn set_resource_version(&mut self, resource_version: Option<String>) {
        match self {
            Workload::ReplicaManaged(deployment) => deployment.metadata.resource_version = resource_version,
            Workload::PerNode(daemon_set) => daemon_set.metadata.resource_version = resource_version,
        }
    }

    /// True when both objects are of the same kind and carry deep-equal specs.
    pub fn same_spec(&self, other: &Workload) -> bool {
        match (self, other) {
            (Workload::ReplicaManaged(a), Workload::ReplicaManaged(b)) => a.spec == b.spec,
            (Workload::PerNode(a), Workload::PerNode(b)) => a.spec == b.spec,
            _ => false,
        }
    }
}
