//! One independent, cancellable operation per user action. Every operation
//! re-fetches pool state, validator list, and blockhash fresh; nothing is
//! cached across concurrent operations, so two operations never race over a
//! shared snapshot.

use crate::assembler::{assemble, WalletSigner};
use crate::config::{AppConfig, NetworkContext};
use crate::error::{AppError, AppResult};
use crate::instructions::{
    build_compute_budget_instructions, build_create_and_delegate_stake, build_deposit_sol,
    build_deposit_stake, build_withdraw_stake, ui_amount_to_base, CreateStakeParams,
    DepositSolParams, DepositStakeParams, InstructionBundle, WithdrawStakeParams,
};
use crate::pda;
use crate::selector::{
    fetch_ranked_candidates, select_ranked, select_validator_stake, LocalScanParams,
    SelectedStake,
};
use crate::solana_client::SolanaClient;
use crate::state::{
    decode_pool_state, decode_stake_account, decode_validator_list, PoolState,
};
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::num::NonZeroU32;
use std::str::FromStr;
use tracing::info;

/// SOL and the pool token both use 9 decimal places.
const BASE_UNIT_DECIMALS: u8 = 9;

pub struct PoolManager {
    cfg: AppConfig,
    network: NetworkContext,
    sol: SolanaClient,
    http: reqwest::Client,
}

impl PoolManager {
    pub fn new(cfg: AppConfig) -> Self {
        let network = cfg.network();
        let sol = SolanaClient::new(&network.rpc_url);
        Self { cfg, network, sol, http: reqwest::Client::new() }
    }

    fn pool_address(&self) -> AppResult<Pubkey> {
        Pubkey::from_str(&self.cfg.pool_address)
            .map_err(|e| AppError::BadRequest(format!("pool address: {e}")))
    }

    fn stake_pool_program(&self) -> AppResult<Pubkey> {
        Pubkey::from_str(&self.cfg.stake_pool_program_id)
            .map_err(|e| AppError::BadRequest(format!("stake pool program id: {e}")))
    }

    fn interceptor_program(&self) -> AppResult<Pubkey> {
        Pubkey::from_str(&self.cfg.interceptor_program_id)
            .map_err(|e| AppError::BadRequest(format!("interceptor program id: {e}")))
    }

    fn compute_budget(&self) -> InstructionBundle {
        InstructionBundle::without_signers(build_compute_budget_instructions(
            self.cfg.compute_unit_limit,
            self.cfg.compute_unit_price_micro_lamports,
        ))
    }

    async fn fetch_pool_state(&self, pool_address: &Pubkey) -> AppResult<PoolState> {
        let data = self
            .sol
            .get_account_data(pool_address)
            .await?
            .ok_or_else(|| AppError::Decode(format!("pool account {pool_address} not found")))?;
        decode_pool_state(&data)
    }

    async fn sign_and_submit(
        &self,
        groups: Vec<InstructionBundle>,
        wallet: &dyn WalletSigner,
        wallet_pubkey: &Pubkey,
    ) -> AppResult<Signature> {
        let (blockhash, last_valid_block_height) = self.sol.latest_blockhash().await?;
        let pending = assemble(groups, wallet_pubkey, blockhash, last_valid_block_height)?;
        let signed = pending.sign(wallet)?;
        let signature = self.sol.send(&signed.transaction).await?;
        info!(%signature, "transaction submitted");
        self.sol.confirm(&signature, signed.last_valid_block_height).await?;
        Ok(signature)
    }

    /// Deposit SOL into the pool for pool tokens.
    pub async fn deposit_sol(
        &self,
        wallet: &dyn WalletSigner,
        wallet_pubkey: &Pubkey,
        sol_amount: f64,
    ) -> AppResult<Signature> {
        let lamports = ui_amount_to_base(sol_amount, BASE_UNIT_DECIMALS)?;
        let pool_address = self.pool_address()?;
        let stake_pool_program = self.stake_pool_program()?;
        let pool = self.fetch_pool_state(&pool_address).await?;

        let balance = self
            .sol
            .get_account_summary(wallet_pubkey)
            .await?
            .map(|s| s.lamports)
            .unwrap_or(0);
        if balance < lamports {
            return Err(AppError::InsufficientBalance {
                requested: lamports,
                available: balance,
            });
        }

        info!(%pool_address, lamports, "depositing SOL");
        let bundle = build_deposit_sol(&DepositSolParams {
            stake_pool_program,
            pool_address,
            pool: &pool,
            wallet: *wallet_pubkey,
            lamports,
        })?;
        self.sign_and_submit(vec![self.compute_budget(), bundle], wallet, wallet_pubkey)
            .await
    }

    /// Deposit an existing delegated stake account through the interceptor.
    pub async fn deposit_stake(
        &self,
        wallet: &dyn WalletSigner,
        wallet_pubkey: &Pubkey,
        stake_account: &Pubkey,
    ) -> AppResult<Signature> {
        let pool_address = self.pool_address()?;
        let stake_pool_program = self.stake_pool_program()?;
        let interceptor_program = self.interceptor_program()?;
        let pool = self.fetch_pool_state(&pool_address).await?;

        let stake_data = self
            .sol
            .get_account_data(stake_account)
            .await?
            .ok_or_else(|| AppError::Decode(format!("stake account {stake_account} not found")))?;
        let stake_record = decode_stake_account(&stake_data)?;

        let (deposit_authority, _) =
            pda::interceptor_deposit_authority(&interceptor_program, &pool_address)?;
        let deposit_authority_data = self
            .sol
            .get_account_data(&deposit_authority)
            .await?
            .ok_or_else(|| {
                AppError::Decode(format!("deposit authority {deposit_authority} not found"))
            })?;

        let validator_seed = self
            .validator_seed_for(&pool, &stake_record.delegated_vote_account)
            .await?;

        info!(%pool_address, %stake_account, vote = %stake_record.delegated_vote_account, "depositing stake account");
        let bundle = build_deposit_stake(&DepositStakeParams {
            interceptor_program,
            stake_pool_program,
            pool_address,
            pool: &pool,
            wallet: *wallet_pubkey,
            stake_account: *stake_account,
            stake_record: &stake_record,
            deposit_authority_data: &deposit_authority_data,
            validator_seed,
        })?;
        self.sign_and_submit(vec![self.compute_budget(), bundle], wallet, wallet_pubkey)
            .await
    }

    /// Withdraw pool tokens as a freshly split stake account, choosing the
    /// source validator via the ranked endpoint when configured, otherwise
    /// by scanning the validator list.
    pub async fn withdraw_stake(
        &self,
        wallet: &dyn WalletSigner,
        wallet_pubkey: &Pubkey,
        pool_token_amount: f64,
    ) -> AppResult<Signature> {
        let pool_tokens = ui_amount_to_base(pool_token_amount, BASE_UNIT_DECIMALS)?;
        let pool_address = self.pool_address()?;
        let stake_pool_program = self.stake_pool_program()?;
        let pool = self.fetch_pool_state(&pool_address).await?;

        let requested_lamports = pool.pool_tokens_to_lamports(pool_tokens).ok_or_else(|| {
            AppError::Decode("pool token supply is zero, exchange rate undefined".to_string())
        })?;

        let selected = self
            .select_withdrawal_source(&pool, &pool_address, &stake_pool_program, requested_lamports)
            .await?;
        info!(
            %pool_address,
            pool_tokens,
            requested_lamports,
            vote = %selected.vote_account,
            source = %selected.stake_address,
            "withdrawing stake"
        );

        let bundle = build_withdraw_stake(&WithdrawStakeParams {
            stake_pool_program,
            pool_address,
            pool: &pool,
            wallet: *wallet_pubkey,
            source_stake_address: selected.stake_address,
            pool_token_amount: pool_tokens,
        })?;
        self.sign_and_submit(vec![self.compute_budget(), bundle], wallet, wallet_pubkey)
            .await
    }

    /// Create a new stake account and delegate it to a validator.
    pub async fn create_and_delegate_stake(
        &self,
        wallet: &dyn WalletSigner,
        wallet_pubkey: &Pubkey,
        vote_account: &Pubkey,
        sol_amount: f64,
    ) -> AppResult<Signature> {
        let lamports = ui_amount_to_base(sol_amount, BASE_UNIT_DECIMALS)?;
        info!(%vote_account, lamports, "creating and delegating stake account");
        let bundle = build_create_and_delegate_stake(&CreateStakeParams {
            wallet: *wallet_pubkey,
            vote_account: *vote_account,
            lamports,
        })?;
        self.sign_and_submit(vec![self.compute_budget(), bundle], wallet, wallet_pubkey)
            .await
    }

    async fn select_withdrawal_source(
        &self,
        pool: &PoolState,
        pool_address: &Pubkey,
        stake_pool_program: &Pubkey,
        requested_lamports: u64,
    ) -> AppResult<SelectedStake> {
        if let Some(base_url) = &self.network.ranked_api_base {
            let candidates = fetch_ranked_candidates(&self.http, base_url, pool_address).await?;
            return select_ranked(&candidates, requested_lamports);
        }

        let list_data = self
            .sol
            .get_account_data(&pool.validator_list)
            .await?
            .ok_or_else(|| {
                AppError::Decode(format!("validator list {} not found", pool.validator_list))
            })?;
        let list = decode_validator_list(&list_data)?;

        let params = LocalScanParams {
            network: &self.network,
            stake_pool_program: *stake_pool_program,
            pool_address: *pool_address,
            requested_lamports,
        };
        select_validator_stake(&list.entries, &params, |address| async move {
            self.sol.get_account_summary(&address).await
        })
        .await
    }

    async fn validator_seed_for(
        &self,
        pool: &PoolState,
        vote_account: &Pubkey,
    ) -> AppResult<Option<NonZeroU32>> {
        let list_data = self
            .sol
            .get_account_data(&pool.validator_list)
            .await?
            .ok_or_else(|| {
                AppError::Decode(format!("validator list {} not found", pool.validator_list))
            })?;
        let list = decode_validator_list(&list_data)?;
        let entry = list
            .entries
            .iter()
            .find(|entry| entry.vote_account == *vote_account)
            .ok_or_else(|| {
                AppError::NoEligibleValidator(format!(
                    "validator {vote_account} is not part of the pool"
                ))
            })?;
        Ok(NonZeroU32::new(entry.validator_seed_suffix))
    }
}
