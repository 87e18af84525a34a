use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::model::proxy::{ResourceConstraints, ResourcesSpec};

pub fn compose_config<'de, CFG: Deserialize<'de>>(external_path: &str, env_prefix: &str) -> Result<CFG, ConfigError> {
    Config::builder()

        // Optional local configuration file
        .add_source(File::with_name(external_path).required(false))

        // Environment overrides, e.g. PROXY_INFRA_NAMESPACE
        .add_source(Environment::with_prefix(env_prefix))

        .build()?
        .try_deserialize()
}

/// Baseline settings shared by every rendered proxy workload.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct InfraConfig {
    /// Namespace hosting every proxy workload, whatever the owning gateway's namespace.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_image")]
    pub image: String,
    #[serde(default = "default_replicas")]
    pub replicas: i32,
    #[serde(default = "default_resources")]
    pub resources: ResourcesSpec,
}

impl Default for InfraConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            image: default_image(),
            replicas: default_replicas(),
            resources: default_resources(),
        }
    }
}

fn default_namespace() -> String {
    String::from("envoy-gateway-system")
}

fn default_image() -> String {
    String::from("envoyproxy/envoy:distroless-dev")
}

fn default_replicas() -> i32 {
    1
}

fn default_resources() -> ResourcesSpec {
    ResourcesSpec {
        limits: None,
        requests: Some(ResourceConstraints {
            cpu: Some(String::from("100m")),
            memory: Some(String::from("512Mi")),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg: InfraConfig = compose_config("/nonexistent/proxy-infra", "PROXY_INFRA_TEST_UNSET")
            .expect("Cannot compose config");
        assert_eq!(cfg, InfraConfig::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("Cannot create config file");
        writeln!(file, "namespace = \"edge\"\nimage = \"proxy:v2\"\nreplicas = 3").expect("Cannot write config file");

        let path = file.path().to_str().expect("Non utf-8 temp path");
        let cfg: InfraConfig = compose_config(path, "PROXY_INFRA_TEST_UNSET")
            .expect("Cannot compose config");

        assert_eq!(cfg.namespace, "edge");
        assert_eq!(cfg.image, "proxy:v2");
        assert_eq!(cfg.replicas, 3);
        assert_eq!(cfg.resources, default_resources());
    }

    #[test]
    fn env_values_override_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("Cannot create config file");
        writeln!(file, "namespace = \"edge\"\nimage = \"proxy:v2\"").expect("Cannot write config file");
        std::env::set_var("PROXY_INFRA_ENV_TEST_NAMESPACE", "edge-env");
        std::env::set_var("PROXY_INFRA_ENV_TEST_REPLICAS", "4");

        let path = file.path().to_str().expect("Non utf-8 temp path");
        let cfg: InfraConfig = compose_config(path, "PROXY_INFRA_ENV_TEST")
            .expect("Cannot compose config");

        assert_eq!(cfg.namespace, "edge-env");
        assert_eq!(cfg.image, "proxy:v2");
        assert_eq!(cfg.replicas, 4);
    }
}
