use clap::Parser;

/// Reconciles ProxyInfra resources into proxy Deployments or DaemonSets
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct OperatorArgs {
    /// Configuration file, read when present
    #[arg(short, long, default_value = "proxy-infra")]
    pub config: String,
    /// Prefix of the environment variables overriding the configuration file
    #[arg(short, long, default_value = "PROXY_INFRA")]
    pub env_prefix: String,
    /// Print the ProxyInfra CustomResourceDefinition as json and exit
    #[arg(long)]
    pub print_crd: bool,
}
