use anyhow::{Context, Result};
use dotenvy::dotenv;
use solana_sdk::pubkey::Pubkey;
use stakeflow::{
    config::AppConfig, solana_client::SolanaClient, state::decode_pool_state, telemetry,
};
use std::str::FromStr;
use tracing::info;

/// Inspection entry point: fetch the configured pool account and print the
/// decoded state. Useful for checking connectivity and layout drift.
#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    telemetry::init_tracing();

    let cfg = AppConfig::from_env();
    let network = cfg.network();
    info!(cluster = ?network.cluster, rpc = %network.rpc_url, "starting pool inspection");

    let pool_address =
        Pubkey::from_str(&cfg.pool_address).context("POOL_ADDRESS is not a valid pubkey")?;
    let sol = SolanaClient::new(&network.rpc_url);
    let data = sol
        .get_account_data(&pool_address)
        .await?
        .with_context(|| format!("pool account {pool_address} not found"))?;
    let pool = decode_pool_state(&data)?;

    println!("{pool:#?}");
    match pool.exchange_rate() {
        Some(rate) => println!("exchange rate: {rate} lamports per pool token"),
        None => println!("exchange rate: undefined (zero pool token supply)"),
    }
    Ok(())
}
