use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use kube::api::{DeleteParams, PostParams};
use kube::{Api, Client};

use crate::cluster::WorkloadClient;
use crate::core::error::ClusterError;
use crate::model::workload::{Workload, WorkloadKind};

/// [`WorkloadClient`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeWorkloadClient {
    client: Client,
}

impl KubeWorkloadClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn deployments(&self, namespace: &str) -> Api<Deployment> { Api::namespaced(self.client.clone(), namespace) }
    fn daemon_sets(&self, namespace: &str) -> Api<DaemonSet> { Api::namespaced(self.client.clone(), namespace) }
}

fn namespace_of(workload: &Workload) -> Result<String, ClusterError> {
    workload.namespace()
        .ok_or_else(|| ClusterError::Invalid(format!("{} {} has no namespace", workload.kind(), workload.name())))
}

#[async_trait]
impl WorkloadClient for KubeWorkloadClient {
    async fn get(&self, namespace: &str, name: &str, kind: WorkloadKind) -> Result<Option<Workload>, ClusterError> {
        let found = match kind {
            WorkloadKind::ReplicaManaged => self.deployments(namespace).get_opt(name).await?
                .map(Workload::ReplicaManaged),
            WorkloadKind::PerNode => self.daemon_sets(namespace).get_opt(name).await?
                .map(Workload::PerNode),
        };
        Ok(found)
    }

    async fn create(&self, workload: &Workload) -> Result<(), ClusterError> {
        let namespace = namespace_of(workload)?;
        match workload {
            Workload::ReplicaManaged(deployment) => {
                self.deployments(&namespace).create(&PostParams::default(), deployment).await?;
            }
            Workload::PerNode(daemon_set) => {
                self.daemon_sets(&namespace).create(&PostParams::default(), daemon_set).await?;
            }
        }
        Ok(())
    }

    async fn update(&self, workload: &Workload) -> Result<(), ClusterError> {
        let namespace = namespace_of(workload)?;
        let name = workload.name();
        match workload {
            Workload::ReplicaManaged(deployment) => {
                self.deployments(&namespace).replace(&name, &PostParams::default(), deployment).await?;
            }
            Workload::PerNode(daemon_set) => {
                self.daemon_sets(&namespace).replace(&name, &PostParams::default(), daemon_set).await?;
            }
        }
        Ok(())
    }

    async fn delete(&self, namespace: &str, name: &str, kind: WorkloadKind) -> Result<(), ClusterError> {
        // owned replica sets and pods are garbage collected in the background
        let params = DeleteParams::background();
        match kind {
            WorkloadKind::ReplicaManaged => {
                self.deployments(namespace).delete(name, &params).await?;
            }
            WorkloadKind::PerNode => {
                self.daemon_sets(namespace).delete(name, &params).await?;
            }
        }
        Ok(())
    }
}
