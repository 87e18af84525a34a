use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ResourceRequirements;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::workload::WorkloadKind;

/// Label carrying the namespace of the gateway owning a proxy workload
pub static OWNING_GATEWAY_NAMESPACE_LABEL: &str = "gateway.envoyproxy.io/owning-gateway-namespace";
/// Label carrying the name of the gateway owning a proxy workload
pub static OWNING_GATEWAY_NAME_LABEL: &str = "gateway.envoyproxy.io/owning-gateway-name";

/// Identity of a logical proxy. The derived resource name only depends on `namespace` and `name`.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ProxyIdentity {
    pub name: String,
    pub namespace: String,
    /// Ownership labels stamped on every rendered object
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl ProxyIdentity {
    /// Builds an identity owned by the gateway `namespace/name`.
    pub fn for_gateway(namespace: &str, name: &str) -> Self {
        Self {
            name: String::from(name),
            namespace: String::from(namespace),
            labels: [
                (String::from(OWNING_GATEWAY_NAMESPACE_LABEL), String::from(namespace)),
                (String::from(OWNING_GATEWAY_NAME_LABEL), String::from(name)),
            ]
                .into_iter()
                .collect(),
        }
    }

    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// Desired state of a proxy as produced by the configuration translation layer.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ProxyDesiredState {
    pub identity: ProxyIdentity,
    /// Absent means a replica-managed workload with baseline settings
    pub provider: Option<WorkloadProvider>,
}

impl ProxyDesiredState {
    pub fn new(identity: ProxyIdentity) -> Self {
        Self {
            identity,
            provider: None,
        }
    }

    pub fn with_provider(mut self, provider: WorkloadProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn workload_kind(&self) -> WorkloadKind {
        match &self.provider {
            None | Some(WorkloadProvider::ReplicaManaged(_)) => WorkloadKind::ReplicaManaged,
            Some(WorkloadProvider::PerNode(_)) => WorkloadKind::PerNode,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum WorkloadProvider {
    ReplicaManaged(DeploymentSettings),
    PerNode(DaemonSetSettings),
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSettings {
    pub replicas: Option<i32>,
    #[serde(default)]
    pub container: ContainerSettings,
    #[serde(default)]
    pub pod: PodSettings,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DaemonSetSettings {
    #[serde(default)]
    pub container: ContainerSettings,
    #[serde(default)]
    pub pod: PodSettings,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct ContainerSettings {
    pub image: Option<String>,
    pub resources: Option<ResourcesSpec>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct PodSettings {
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct ResourcesSpec {
    pub limits: Option<ResourceConstraints>,
    pub requests: Option<ResourceConstraints>,
}

impl ResourcesSpec {
    /// Overlays `other` on top of `self`: every quantity set in `other` wins, the rest is kept.
    pub fn overlay(&self, other: &ResourcesSpec) -> ResourcesSpec {
        ResourcesSpec {
            limits: ResourceConstraints::overlay(self.limits.as_ref(), other.limits.as_ref()),
            requests: ResourceConstraints::overlay(self.requests.as_ref(), other.requests.as_ref()),
        }
    }
}

impl From<ResourcesSpec> for ResourceRequirements {
    fn from(value: ResourcesSpec) -> Self {
        Self {
            limits: value.limits.map(ResourceConstraints::into_quantities),
            requests: value.requests.map(ResourceConstraints::into_quantities),
            ..Default::default()
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
pub struct ResourceConstraints {
    pub cpu: Option<String>,
    pub memory: Option<String>,
}

impl ResourceConstraints {
    fn overlay(base: Option<&ResourceConstraints>, other: Option<&ResourceConstraints>) -> Option<ResourceConstraints> {
        match (base, other) {
            (None, None) => None,
            (Some(base), None) => Some(base.clone()),
            (None, Some(other)) => Some(other.clone()),
            (Some(base), Some(other)) => Some(ResourceConstraints {
                cpu: other.cpu.clone().or_else(|| base.cpu.clone()),
                memory: other.memory.clone().or_else(|| base.memory.clone()),
            }),
        }
    }

    fn into_quantities(self) -> BTreeMap<String, Quantity> {
        [
            (String::from("cpu"), self.cpu.map(Quantity)),
            (String::from("memory"), self.memory.map(Quantity)),
        ]
            .into_iter()
            .flat_map(|(k, maybe_v)| maybe_v.map(|v| (k, v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_keeps_unset_quantities() {
        let base = ResourcesSpec {
            limits: None,
            requests: Some(ResourceConstraints { cpu: Some(String::from("100m")), memory: Some(String::from("512Mi")) }),
        };
        let over = ResourcesSpec {
            limits: Some(ResourceConstraints { cpu: None, memory: Some(String::from("1Gi")) }),
            requests: Some(ResourceConstraints { cpu: Some(String::from("250m")), memory: None }),
        };

        let merged = base.overlay(&over);

        assert_eq!(merged.limits, Some(ResourceConstraints { cpu: None, memory: Some(String::from("1Gi")) }));
        assert_eq!(merged.requests, Some(ResourceConstraints { cpu: Some(String::from("250m")), memory: Some(String::from("512Mi")) }));
    }

    #[test]
    fn requirements_skip_missing_quantities() {
        let requirements = ResourceRequirements::from(ResourcesSpec {
            limits: Some(ResourceConstraints { cpu: Some(String::from("1")), memory: None }),
            requests: None,
        });

        let limits = requirements.limits.expect("Missing limits");
        assert_eq!(limits.len(), 1);
        assert_eq!(limits.get("cpu"), Some(&Quantity(String::from("1"))));
        assert!(requirements.requests.is_none());
    }

    #[test]
    fn kind_follows_provider() {
        let desired = ProxyDesiredState::new(ProxyIdentity::for_gateway("default", "eg"));
        assert_eq!(desired.workload_kind(), WorkloadKind::ReplicaManaged);

        let desired = desired.with_provider(WorkloadProvider::PerNode(DaemonSetSettings::default()));
        assert_eq!(desired.workload_kind(), WorkloadKind::PerNode);
    }
}
