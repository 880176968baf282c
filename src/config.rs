use serde::Deserialize;

/// Smallest balance a pool-owned stake account must keep: the protocol
/// minimum delegation for the cluster plus the rent-exempt reserve of a
/// 200-byte stake account.
pub const MAINNET_MINIMUM_RESERVE_LAMPORTS: u64 = 1_002_282_880;
pub const TESTNET_MINIMUM_RESERVE_LAMPORTS: u64 = 3_282_880;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cluster {
    MainnetBeta,
    Testnet,
}

impl Cluster {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mainnet-beta" | "mainnet" => Some(Cluster::MainnetBeta),
            "testnet" => Some(Cluster::Testnet),
            _ => None,
        }
    }

    pub fn minimum_reserve_lamports(self) -> u64 {
        match self {
            Cluster::MainnetBeta => MAINNET_MINIMUM_RESERVE_LAMPORTS,
            Cluster::Testnet => TESTNET_MINIMUM_RESERVE_LAMPORTS,
        }
    }
}

/// Explicit network parameterization threaded into selection and flow calls.
/// Never stored as ambient global state; every operation receives its own
/// copy at call time.
#[derive(Clone, Debug)]
pub struct NetworkContext {
    pub cluster: Cluster,
    pub minimum_reserve_lamports: u64,
    pub rpc_url: String,
    /// Base URL of the ranked-validator endpoint. `None` means the local
    /// validator-list scan is used instead.
    pub ranked_api_base: Option<String>,
}

impl NetworkContext {
    pub fn new(cluster: Cluster, rpc_url: String, ranked_api_base: Option<String>) -> Self {
        Self {
            cluster,
            minimum_reserve_lamports: cluster.minimum_reserve_lamports(),
            rpc_url,
            ranked_api_base,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub cluster: String,
    pub solana_rpc_url: String,
    pub stake_pool_program_id: String,
    pub interceptor_program_id: String,
    pub pool_address: String,
    pub ranked_api_base: Option<String>,
    pub compute_unit_limit: u32,
    pub compute_unit_price_micro_lamports: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            cluster: std::env::var("CLUSTER").unwrap_or_else(|_| "mainnet-beta".to_string()),
            solana_rpc_url: std::env::var("SOLANA_RPC_URL")
                .unwrap_or_else(|_| "https://api.mainnet-beta.solana.com".to_string()),
            stake_pool_program_id: std::env::var("STAKE_POOL_PROGRAM_ID")
                .unwrap_or_else(|_| "SPoo1Ku8WFXoNDMHPsrGSTSG1Y47rzgn41SLUNakuHy".to_string()),
            interceptor_program_id: std::env::var("INTERCEPTOR_PROGRAM_ID").unwrap_or_default(),
            pool_address: std::env::var("POOL_ADDRESS").unwrap_or_default(),
            ranked_api_base: std::env::var("RANKED_API_BASE").ok(),
            compute_unit_limit: std::env::var("COMPUTE_UNIT_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(400_000),
            compute_unit_price_micro_lamports: std::env::var("COMPUTE_UNIT_PRICE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1_000),
        }
    }

    pub fn network(&self) -> NetworkContext {
        let cluster = Cluster::from_name(&self.cluster).unwrap_or(Cluster::MainnetBeta);
        NetworkContext::new(cluster, self.solana_rpc_url.clone(), self.ranked_api_base.clone())
    }
}
