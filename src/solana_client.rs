//! Thin wrapper over the nonblocking RPC client: account reads, blockhash
//! fetch with its expiry height, submission, and a one-shot confirmation
//! wait keyed to that expiry.

use crate::error::{AppError, AppResult};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};
use std::time::Duration;
use tracing::{debug, warn};

const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct SolanaClient {
    pub rpc: RpcClient,
}

#[derive(Clone, Copy, Debug)]
pub struct AccountSummary {
    pub lamports: u64,
    pub owner: Pubkey,
}

impl SolanaClient {
    pub fn new(rpc_url: &str) -> Self {
        Self { rpc: RpcClient::new(rpc_url.to_string()) }
    }

    /// Account data, or `None` when the account does not exist.
    pub async fn get_account_data(&self, address: &Pubkey) -> AppResult<Option<Vec<u8>>> {
        let response = self
            .rpc
            .get_account_with_commitment(address, CommitmentConfig::confirmed())
            .await
            .map_err(|e| AppError::RemoteUnavailable(format!("get_account {address}: {e}")))?;
        Ok(response.value.map(|account| account.data))
    }

    /// Lamports and owning program, or `None` when the account is absent.
    pub async fn get_account_summary(&self, address: &Pubkey) -> AppResult<Option<AccountSummary>> {
        let response = self
            .rpc
            .get_account_with_commitment(address, CommitmentConfig::confirmed())
            .await
            .map_err(|e| AppError::RemoteUnavailable(format!("get_account {address}: {e}")))?;
        Ok(response.value.map(|account| AccountSummary {
            lamports: account.lamports,
            owner: account.owner,
        }))
    }

    /// Fresh blockhash plus the block height at which it expires.
    pub async fn latest_blockhash(&self) -> AppResult<(Hash, u64)> {
        self.rpc
            .get_latest_blockhash_with_commitment(CommitmentConfig::confirmed())
            .await
            .map_err(|e| AppError::RemoteUnavailable(format!("blockhash: {e}")))
    }

    pub async fn send(&self, tx: &Transaction) -> AppResult<Signature> {
        self.rpc
            .send_transaction(tx)
            .await
            .map_err(|e| AppError::RemoteUnavailable(format!("send_transaction: {e}")))
    }

    /// Poll the signature until it lands or the blockhash expires. An expiry
    /// with no recorded status is an unknown outcome, reported distinctly
    /// from an on-chain rejection.
    pub async fn confirm(
        &self,
        signature: &Signature,
        last_valid_block_height: u64,
    ) -> AppResult<()> {
        loop {
            let status = self
                .rpc
                .get_signature_status(signature)
                .await
                .map_err(|e| AppError::RemoteUnavailable(format!("signature status: {e}")))?;
            match status {
                Some(Ok(())) => {
                    debug!(%signature, "transaction confirmed");
                    return Ok(());
                }
                Some(Err(e)) => {
                    warn!(%signature, error = %e, "transaction rejected on chain");
                    return Err(AppError::TransactionFailed(e.to_string()));
                }
                None => {
                    let height = self
                        .rpc
                        .get_block_height()
                        .await
                        .map_err(|e| AppError::RemoteUnavailable(format!("block height: {e}")))?;
                    if height > last_valid_block_height {
                        return Err(AppError::ConfirmationExpired(signature.to_string()));
                    }
                }
            }
            tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
        }
    }
}
