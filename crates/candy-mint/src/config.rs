use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use solana_sdk::pubkey::Pubkey;

use crate::chain::SubmitOptions;
use crate::constants::{DEFAULT_COMPUTE_UNIT_LIMIT, DEFAULT_GROUP_LABEL};
use crate::errors::{MintError, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cluster {
    Localnet,
    Devnet,
    Testnet,
    #[default]
    MainnetBeta,
}

impl Cluster {
    pub fn url(&self) -> &'static str {
        match self {
            Cluster::Localnet => "http://127.0.0.1:8899",
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
        }
    }
}

impl FromStr for Cluster {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "localnet" | "localhost" => Ok(Cluster::Localnet),
            "devnet" => Ok(Cluster::Devnet),
            "testnet" => Ok(Cluster::Testnet),
            "mainnet-beta" | "mainnet" => Ok(Cluster::MainnetBeta),
            other => Err(format!(
                "unknown cluster '{}' (expected localnet, devnet, testnet or mainnet-beta)",
                other
            )),
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Cluster::Localnet => "localnet",
            Cluster::Devnet => "devnet",
            Cluster::Testnet => "testnet",
            Cluster::MainnetBeta => "mainnet-beta",
        })
    }
}

/// Prefix bare hosts with `https://`.
pub fn normalize_endpoint(endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    }
}

/// Runtime settings for one mint session.
#[derive(Clone, Debug)]
pub struct MintConfig {
    pub candy_machine: Option<Pubkey>,
    pub cluster: Cluster,
    /// Explicit endpoint; overrides the cluster's default URL.
    pub rpc_url: Option<String>,
    pub group_label: String,
    pub compute_unit_limit: u32,
    pub submit: SubmitOptions,
    pub rpc_timeout: Duration,
    pub http_timeout: Duration,
}

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            candy_machine: None,
            cluster: Cluster::default(),
            rpc_url: None,
            group_label: DEFAULT_GROUP_LABEL.to_string(),
            compute_unit_limit: DEFAULT_COMPUTE_UNIT_LIMIT,
            submit: SubmitOptions::default(),
            rpc_timeout: Duration::from_secs(30),
            http_timeout: Duration::from_secs(15),
        }
    }
}

impl MintConfig {
    pub fn candy_machine(&self) -> Result<Pubkey> {
        self.candy_machine.ok_or(MintError::ConfigNotFound)
    }

    pub fn rpc_url(&self) -> String {
        match self.rpc_url.as_deref().filter(|u| !u.trim().is_empty()) {
            Some(url) => normalize_endpoint(url),
            None => self.cluster.url().to_string(),
        }
    }

    /// Parse an optional candy machine address as given on the command line.
    pub fn parse_candy_machine(raw: Option<&str>) -> Result<Option<Pubkey>> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(s) => Pubkey::from_str(s)
                .map(Some)
                .map_err(|e| MintError::Config(format!("invalid candy machine ID '{}': {}", s, e))),
        }
    }
}
