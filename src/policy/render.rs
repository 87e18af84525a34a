//! Rendering of proxy workloads.
//!
//! A baseline pod template is built from [`InfraConfig`], then the overrides of the proxy's
//! provider settings are laid on top of it. Anything an override leaves unset keeps its baseline
//! value. Rendering is pure: the same desired state and config always yield the same object.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{DaemonSet, DaemonSetSpec, Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{Container, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};

use crate::core::config::InfraConfig;
use crate::model::proxy::{ContainerSettings, PodSettings, ProxyDesiredState, WorkloadProvider};
use crate::model::workload::Workload;
use crate::policy::naming::derived_name;

pub static PROXY_CONTAINER_NAME: &str = "envoy";

pub static LABEL_APP_NAME: &str = "app.kubernetes.io/name";
pub static LABEL_APP_COMPONENT: &str = "app.kubernetes.io/component";
pub static LABEL_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

static APP_NAME: &str = "envoy";
static APP_COMPONENT: &str = "proxy";
static MANAGER_NAME: &str = "proxy-infra";

pub struct WorkloadRenderer<'a> {
    config: &'a InfraConfig,
}

impl<'a> WorkloadRenderer<'a> {
    pub fn new(config: &'a InfraConfig) -> Self {
        Self { config }
    }

    pub fn render(&self, desired: &ProxyDesiredState) -> Workload {
        match &desired.provider {
            None => Workload::ReplicaManaged(self.deployment(desired, None, &ContainerSettings::default(), &PodSettings::default())),
            Some(WorkloadProvider::ReplicaManaged(settings)) => Workload::ReplicaManaged(
                self.deployment(desired, settings.replicas, &settings.container, &settings.pod),
            ),
            Some(WorkloadProvider::PerNode(settings)) => Workload::PerNode(
                self.daemon_set(desired, &settings.container, &settings.pod),
            ),
        }
    }

    /// Labels identifying the pods of a proxy: fixed app labels plus the ownership labels.
    pub fn selector_labels(&self, desired: &ProxyDesiredState) -> BTreeMap<String, String> {
        [
            (String::from(LABEL_APP_NAME), String::from(APP_NAME)),
            (String::from(LABEL_APP_COMPONENT), String::from(APP_COMPONENT)),
            (String::from(LABEL_MANAGED_BY), String::from(MANAGER_NAME)),
        ]
            .into_iter()
            .chain(desired.identity.labels.clone())
            .collect()
    }

    fn object_meta(&self, desired: &ProxyDesiredState) -> ObjectMeta {
        ObjectMeta {
            name: Some(derived_name(&desired.identity)),
            namespace: Some(self.config.namespace.clone()),
            labels: Some(self.selector_labels(desired)),
            ..Default::default()
        }
    }

    fn selector(&self, desired: &ProxyDesiredState) -> LabelSelector {
        LabelSelector {
            match_expressions: None,
            match_labels: Some(self.selector_labels(desired)),
        }
    }

    fn pod_template(&self, desired: &ProxyDesiredState, container: &ContainerSettings, pod: &PodSettings) -> PodTemplateSpec {
        // user labels never shadow selector labels, otherwise pods would stop matching
        let labels = pod.labels.clone()
            .into_iter()
            .chain(self.selector_labels(desired))
            .collect::<BTreeMap<_, _>>();

        let resources = match &container.resources {
            Some(overrides) => self.config.resources.overlay(overrides),
            None => self.config.resources.clone(),
        };

        PodTemplateSpec {
            metadata: Some(ObjectMeta {
                labels: Some(labels),
                annotations: if pod.annotations.is_empty() { None } else { Some(pod.annotations.clone()) },
                ..Default::default()
            }),
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: String::from(PROXY_CONTAINER_NAME),
                    image: Some(container.image.clone().unwrap_or_else(|| self.config.image.clone())),
                    image_pull_policy: Some(String::from("IfNotPresent")),
                    resources: Some(resources.into()),
                    ..Default::default()
                }],
                ..Default::default()
            }),
        }
    }

    fn deployment(&self, desired: &ProxyDesiredState, replicas: Option<i32>, container: &ContainerSettings, pod: &PodSettings) -> Deployment {
        Deployment {
            metadata: self.object_meta(desired),
            spec: Some(DeploymentSpec {
                replicas: Some(replicas.unwrap_or(self.config.replicas)),
                selector: self.selector(desired),
                template: self.pod_template(desired, container, pod),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn daemon_set(&self, desired: &ProxyDesiredState, container: &ContainerSettings, pod: &PodSettings) -> DaemonSet {
        DaemonSet {
            metadata: self.object_meta(desired),
            spec: Some(DaemonSetSpec {
                selector: self.selector(desired),
                template: self.pod_template(desired, container, pod),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}
