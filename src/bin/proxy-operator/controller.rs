use std::sync::Arc;
use std::time::Duration;

use kube::api::{Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::runtime::finalizer::{finalizer, Event as Finalizer};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use thiserror::Error;

use proxy_infra::cluster::kube_client::KubeWorkloadClient;
use proxy_infra::model::crd::{ProxyInfra, ProxyInfraStatus};
use proxy_infra::WorkloadReconciler;

pub static PROXY_INFRA_FINALIZER: &str = "infra.proxyfleet.dev/workload";

pub struct ContextData {
    /// Kubernetes client, used for ProxyInfra resources themselves
    pub client: Client,
    pub reconciler: WorkloadReconciler<KubeWorkloadClient>,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("MissingObjectKey: {0}")]
    MissingObjectKey(&'static str),
    #[error("Workload reconciliation failed: {0}")]
    Workload(#[source] proxy_infra::Error),
    #[error("Finalizer Error: {0}")]
    // finalizer::Error embeds this error, boxed to break the cycle
    FinalizerError(#[source] Box<kube::runtime::finalizer::Error<Error>>),
}

impl Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::MissingObjectKey(_) => false,
            Error::Workload(err) => err.is_retryable(),
            Error::FinalizerError(err) => match err.as_ref() {
                kube::runtime::finalizer::Error::ApplyFailed(err)
                | kube::runtime::finalizer::Error::CleanupFailed(err) => err.is_retryable(),
                _ => true,
            },
        }
    }
}

pub async fn reconcile(proxy_infra: Arc<ProxyInfra>, context: Arc<ContextData>) -> Result<Action, Error> {
    let namespace = proxy_infra.namespace()
        .ok_or(Error::MissingObjectKey(".metadata.namespace"))?;
    let api: Api<ProxyInfra> = Api::namespaced(context.client.clone(), &namespace);

    finalizer(&api, PROXY_INFRA_FINALIZER, proxy_infra, |event| async {
        match event {
            Finalizer::Apply(proxy_infra) => apply(&api, &proxy_infra, &context).await,
            Finalizer::Cleanup(proxy_infra) => cleanup(&proxy_infra, &context).await,
        }
    })
        .await
        .map_err(|err| Error::FinalizerError(Box::new(err)))
}

async fn apply(api: &Api<ProxyInfra>, proxy_infra: &ProxyInfra, context: &ContextData) -> Result<Action, Error> {
    let desired = proxy_infra.desired_state()
        .ok_or(Error::MissingObjectKey(".metadata.namespace"))?;

    let outcome = context.reconciler.apply_workload(&desired).await
        .map_err(Error::Workload)?;

    if let Some(orphaned) = proxy_infra.orphaned_workload_name() {
        log::info!("Removing workload {orphaned} left by a former identity of {}", proxy_infra.name_any());
        context.reconciler.delete_workload_named(&orphaned).await
            .map_err(Error::Workload)?;
    }

    let status = ProxyInfraStatus {
        workload_kind: Some(outcome.kind.to_string()),
        workload_name: Some(outcome.name),
    };
    if proxy_infra.status.as_ref().map(|old_status| old_status.ne(&status)).unwrap_or(true) {
        let res = api
            .patch_status(&proxy_infra.name_any(), &PatchParams::default(), &Patch::Merge(&json!({ "status": status })))
            .await;
        if let Err(err) = res {
            log::warn!("Status update failed for {} - {err}", proxy_infra.name_any());
        }
    }

    // periodic resync repairs drift introduced outside of this controller
    Ok(Action::requeue(Duration::from_secs(300)))
}

async fn cleanup(proxy_infra: &ProxyInfra, context: &ContextData) -> Result<Action, Error> {
    let identity = proxy_infra.identity()
        .ok_or(Error::MissingObjectKey(".metadata.namespace"))?;
    log::info!("Removing workloads of proxy {}", identity.qualified_name());

    context.reconciler.delete_workload(&identity).await
        .map_err(Error::Workload)?;
    if let Some(orphaned) = proxy_infra.orphaned_workload_name() {
        context.reconciler.delete_workload_named(&orphaned).await
            .map_err(Error::Workload)?;
    }
    Ok(Action::await_change())
}

/// Requeues retryable failures quickly, the others once upstream had time to fix their input.
pub fn error_policy(_obj: Arc<ProxyInfra>, error: &Error, _ctx: Arc<ContextData>) -> Action {
    Action::requeue(requeue_delay(error))
}

fn requeue_delay(error: &Error) -> Duration {
    if error.is_retryable() {
        Duration::from_secs(15)
    } else {
        Duration::from_secs(300)
    }
}
