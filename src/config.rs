use crate::domain::models::Network;
use crate::infrastructure::price_feed::COINGECKO_SIMPLE_PRICE_URL;
use crate::service::proxy::{
    ProxyConfig, REPUTATION_API_URL, RPC_DEVNET_UPSTREAM, RPC_MAINNET_UPSTREAM,
};
use clap::Parser;
use std::time::Duration;

pub const MAINNET_RPC_ENDPOINTS: [&str; 4] = [
    "https://api.mainnet-beta.solana.com",
    "https://solana-mainnet.g.alchemy.com/v2/demo",
    "https://rpc.ankr.com/solana",
    "https://solana-api.projectserum.com",
];

pub const DEVNET_RPC_ENDPOINTS: [&str; 3] = [
    "https://api.devnet.solana.com",
    "https://solana-devnet.g.alchemy.com/v2/demo",
    "https://api.testnet.solana.com",
];

#[derive(Parser, Debug, Clone)]
#[command(
    version,
    about,
    long_about = "Solana wallet dashboard with RPC and address reputation proxies"
)]
pub struct Config {
    /// Listen port REST API
    #[arg(short, long, env = "LISTEN_PORT", default_value_t = 3000)]
    pub listen_port: u16,

    /// Network selected at startup
    #[arg(short, long, env = "SOLANA_NETWORK", default_value = "mainnet-beta")]
    pub network: Network,

    /// Mainnet RPC endpoints, tried in order
    #[arg(long, env = "MAINNET_RPC_ENDPOINTS", value_delimiter = ',', default_values = MAINNET_RPC_ENDPOINTS)]
    pub mainnet_rpc: Vec<String>,

    /// Devnet RPC endpoints, tried in order
    #[arg(long, env = "DEVNET_RPC_ENDPOINTS", value_delimiter = ',', default_values = DEVNET_RPC_ENDPOINTS)]
    pub devnet_rpc: Vec<String>,

    /// Seconds between refresh passes
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value_t = 30)]
    pub poll_interval_secs: u64,

    /// Seconds before any outbound HTTP or RPC request is abandoned
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub http_timeout_secs: u64,

    /// Signed in user whose wallet document is mirrored
    #[arg(short, long, env = "DASHBOARD_USER")]
    pub user: Option<String>,

    #[arg(long, env = "CHAINABUSE_API_KEY", hide_env_values = true)]
    pub chainabuse_api_key: Option<String>,

    #[arg(long, env = "HELIUS_API_KEY", hide_env_values = true)]
    pub helius_api_key: Option<String>,

    #[arg(long, env = "REPUTATION_API_URL", default_value = REPUTATION_API_URL)]
    pub reputation_api_url: String,

    #[arg(long, env = "RPC_MAINNET_UPSTREAM", default_value = RPC_MAINNET_UPSTREAM)]
    pub rpc_mainnet_upstream: String,

    #[arg(long, env = "RPC_DEVNET_UPSTREAM", default_value = RPC_DEVNET_UPSTREAM)]
    pub rpc_devnet_upstream: String,

    #[arg(long, env = "PRICE_API_URL", default_value = COINGECKO_SIMPLE_PRICE_URL)]
    pub price_api_url: String,
}

impl Config {
    pub fn endpoints(&self, network: Network) -> &[String] {
        match network {
            Network::MainnetBeta => &self.mainnet_rpc,
            Network::Devnet => &self.devnet_rpc,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    /// Shared client for batch RPC calls, the price feed and the proxies.
    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(self.http_timeout())
            .build()
    }

    pub fn proxy_config(&self) -> ProxyConfig {
        ProxyConfig {
            reputation_api_key: self.chainabuse_api_key.clone(),
            reputation_api_url: self.reputation_api_url.clone(),
            rpc_api_key: self.helius_api_key.clone(),
            rpc_mainnet_url: self.rpc_mainnet_upstream.clone(),
            rpc_devnet_url: self.rpc_devnet_upstream.clone(),
        }
    }
}
