use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::proxy::{ProxyDesiredState, ProxyIdentity, WorkloadProvider};
use crate::policy::naming::derived_name;

/// Declares the proxy infrastructure of one gateway.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
#[kube(group = "infra.proxyfleet.dev", version = "v1alpha1", kind = "ProxyInfra", namespaced)]
#[kube(status = "ProxyInfraStatus")]
#[serde(rename_all = "camelCase")]
pub struct ProxyInfraSpec {
    /// Name of the owning gateway, defaults to the resource name
    pub gateway_name: Option<String>,
    pub provider: Option<WorkloadProvider>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProxyInfraStatus {
    pub workload_kind: Option<String>,
    pub workload_name: Option<String>,
}

impl ProxyInfra {
    /// Identity of the proxy declared by this resource, `None` when the resource is not namespaced.
    pub fn identity(&self) -> Option<ProxyIdentity> {
        let namespace = self.namespace()?;
        let gateway_name = self.spec.gateway_name.clone().unwrap_or_else(|| self.name_any());
        Some(ProxyIdentity::for_gateway(&namespace, &gateway_name))
    }

    pub fn desired_state(&self) -> Option<ProxyDesiredState> {
        let identity = self.identity()?;
        Some(ProxyDesiredState {
            identity,
            provider: self.spec.provider.clone(),
        })
    }

    /// Workload name recorded in the status when it no longer matches the current identity,
    /// which happens after `gatewayName` is edited.
    pub fn orphaned_workload_name(&self) -> Option<String> {
        let recorded = self.status.as_ref()?.workload_name.as_ref()?;
        let current = derived_name(&self.identity()?);
        (*recorded != current).then(|| recorded.clone())
    }
}
