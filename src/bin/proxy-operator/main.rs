use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use futures::StreamExt;
use kube::runtime::controller::Controller;
use kube::runtime::watcher::Config;
use kube::{Api, Client, CustomResourceExt};

use proxy_infra::cluster::kube_client::KubeWorkloadClient;
use proxy_infra::core::config::{compose_config, InfraConfig};
use proxy_infra::model::crd::ProxyInfra;
use proxy_infra::WorkloadReconciler;

use crate::args::OperatorArgs;
use crate::controller::{error_policy, reconcile, ContextData};

mod args;
mod controller;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = OperatorArgs::parse();

    if args.print_crd {
        println!("{}", serde_json::to_string_pretty(&ProxyInfra::crd())?);
        return Ok(());
    }

    let infra_config: InfraConfig = compose_config(&args.config, &args.env_prefix)
        .context("Error loading configuration")?;
    log::info!("Proxy workloads are managed in namespace {}", infra_config.namespace);

    let kubernetes_client = Client::try_default().await
        .context("Error building kubernetes client")?;

    let context = Arc::new(ContextData {
        client: kubernetes_client.clone(),
        reconciler: WorkloadReconciler::new(KubeWorkloadClient::new(kubernetes_client.clone()), infra_config),
    });

    let crd_api = Api::<ProxyInfra>::all(kubernetes_client);

    Controller::new(crd_api, Config::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, context)
        .for_each(|reconciliation_result| async move {
            match reconciliation_result {
                Ok((proxy_infra, _)) => log::debug!("Reconciliation successful. Resource: {}", proxy_infra.name),
                Err(reconciliation_err) => log::warn!("Reconciliation error: {reconciliation_err}"),
            }
        })
        .await;

    Ok(())
}
