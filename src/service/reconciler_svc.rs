//! Convergence of one proxy's workload towards its desired state.
//!
//! For a given proxy at most one of its `Deployment` and `DaemonSet` may remain after a successful
//! pass. Both kinds share the derived name, so switching kind is a create of the new kind followed
//! by a delete of the old one. Nothing is cached between passes: every pass renders the desired
//! object again and reads both kinds back from the cluster, which makes any pass safe to retry from
//! scratch.

use crate::cluster::WorkloadClient;
use crate::core::config::InfraConfig;
use crate::core::error::{ClusterError, Error, Operation};
use crate::model::proxy::{ProxyDesiredState, ProxyIdentity};
use crate::model::workload::{Workload, WorkloadKind};
use crate::policy::naming::derived_name;
use crate::policy::render::WorkloadRenderer;

/// What a pass did to the workload of the desired kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadChange {
    Unchanged,
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub kind: WorkloadKind,
    pub name: String,
    pub change: WorkloadChange,
    /// The workload of the other kind was found and deleted
    pub removed_stale: bool,
}

pub struct WorkloadReconciler<C> {
    client: C,
    config: InfraConfig,
}

impl<C: WorkloadClient> WorkloadReconciler<C> {
    pub fn new(client: C, config: InfraConfig) -> Self {
        Self {
            client,
            config,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &InfraConfig {
        &self.config
    }

    fn namespace(&self) -> &str {
        &self.config.namespace
    }

    /// Makes the cluster hold exactly the workload rendered from `desired`.
    ///
    /// The other kind is removed once the desired kind is known to exist. When creating an absent
    /// workload fails, the other kind is left alone so the proxy keeps serving; when updating an
    /// existing one fails, the other kind is still removed and the update error is returned.
    /// A failure while removing the other kind is returned as well, without undoing the create or
    /// update that preceded it.
    pub async fn apply_workload(&self, desired: &ProxyDesiredState) -> Result<ApplyOutcome, Error> {
        let rendered = WorkloadRenderer::new(&self.config).render(desired);
        let kind = rendered.kind();
        let name = derived_name(&desired.identity);
        log::debug!("Reconciling {kind} {}/{name} for proxy {}", self.namespace(), desired.identity.qualified_name());

        let current = self.client.get(self.namespace(), &name, kind).await
            .map_err(|err| self.error(Operation::Get, kind, &name, err))?;
        let present = current.is_some();

        let change = match self.converge(&name, current, rendered).await {
            Ok(change) => change,
            // a NotFound means the workload vanished meanwhile, it may be the last one
            Err(err) if present && !err.cluster_error().is_not_found() => {
                if let Err(cleanup_err) = self.remove_if_present(&name, kind.other()).await {
                    log::warn!("Stale workload cleanup after failed update also failed - {cleanup_err}");
                }
                return Err(err);
            }
            Err(err) => return Err(err),
        };
        let removed_stale = self.remove_if_present(&name, kind.other()).await?;

        Ok(ApplyOutcome {
            kind,
            name,
            change,
            removed_stale,
        })
    }

    /// Removes every workload of `identity`. Succeeds when nothing is left to delete.
    pub async fn delete_workload(&self, identity: &ProxyIdentity) -> Result<(), Error> {
        self.delete_workload_named(&derived_name(identity)).await
    }

    /// Removes both kinds stored under `name`, e.g. a workload left behind by a former identity.
    pub async fn delete_workload_named(&self, name: &str) -> Result<(), Error> {
        let mut first_error = None;

        for kind in [WorkloadKind::ReplicaManaged, WorkloadKind::PerNode] {
            match self.client.delete(self.namespace(), name, kind).await {
                Ok(()) => log::info!("Deleted {kind} {}/{name}", self.namespace()),
                Err(err) if err.is_not_found() => log::debug!("No {kind} {}/{name} to delete", self.namespace()),
                Err(err) => {
                    log::warn!("Failed to delete {kind} {}/{name} - {err}", self.namespace());
                    first_error.get_or_insert(Error::cluster(Operation::Delete, kind, self.namespace(), name, err));
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn converge(&self, name: &str, current: Option<Workload>, rendered: Workload) -> Result<WorkloadChange, Error> {
        let kind = rendered.kind();
        match current {
            Some(current) if current.same_spec(&rendered) => {
                log::debug!("{kind} {}/{name} is up to date", self.namespace());
                Ok(WorkloadChange::Unchanged)
            }
            Some(current) => {
                let mut desired = rendered;
                desired.set_resource_version(current.resource_version());
                self.client.update(&desired).await
                    .map_err(|err| self.error(Operation::Update, kind, name, err))?;
                log::info!("Updated {kind} {}/{name}", self.namespace());
                Ok(WorkloadChange::Updated)
            }
            None => {
                self.client.create(&rendered).await
                    .map_err(|err| self.error(Operation::Create, kind, name, err))?;
                log::info!("Created {kind} {}/{name}", self.namespace());
                Ok(WorkloadChange::Created)
            }
        }
    }

    async fn remove_if_present(&self, name: &str, kind: WorkloadKind) -> Result<bool, Error> {
        let current = self.client.get(self.namespace(), name, kind).await
            .map_err(|err| self.error(Operation::Get, kind, name, err))?;
        if current.is_none() {
            return Ok(false);
        }

        match self.client.delete(self.namespace(), name, kind).await {
            Ok(()) => {
                log::info!("Deleted stale {kind} {}/{name}", self.namespace());
                Ok(true)
            }
            // removed by someone else between the get and the delete
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => {
                log::warn!("Failed to delete stale {kind} {}/{name} - {err}", self.namespace());
                Err(self.error(Operation::Delete, kind, name, err))
            }
        }
    }

    fn error(&self, operation: Operation, kind: WorkloadKind, name: &str, err: ClusterError) -> Error {
        Error::cluster(operation, kind, self.namespace(), name, err)
    }
}
