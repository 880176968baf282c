//! Pure instruction builders. Each builder takes already-decoded state plus
//! caller parameters and returns the wire-format instructions together with
//! any ephemeral signing keypairs created for this transaction only. No
//! builder performs network I/O.

use crate::error::{AppError, AppResult};
use crate::layout::{read_pubkey, Field, Layout, Value};
use crate::pda;
use crate::state::{PoolState, StakeAccountRecord};
use solana_sdk::{
    compute_budget::ComputeBudgetInstruction,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    rent::Rent,
    signature::{Keypair, Signer},
    stake,
    stake::state::{Authorized, Lockup, StakeAuthorize},
    system_instruction, system_program, sysvar,
};
use spl_associated_token_account as spl_ata;
use std::num::NonZeroU32;

pub const DEPOSIT_SOL_OPCODE: u8 = 14;
pub const WITHDRAW_STAKE_OPCODE: u8 = 10;
pub const INTERCEPTOR_DEPOSIT_STAKE_DISCRIMINATOR: u8 = 2;
pub const TOKEN_APPROVE_TAG: u8 = 4;

/// Serialized size of a stake account.
pub const STAKE_ACCOUNT_SPACE: u64 = 200;

/// Where the interceptor's deposit-authority account stores its vault
/// address: 8-byte discriminator, base key, stake pool address, then the
/// vault. Contract with the interceptor program's storage layout.
pub const DEPOSIT_AUTHORITY_VAULT_OFFSET: usize = 72;

/// Instructions plus the ephemeral signers they require. The wallet signer
/// is external and never part of a bundle.
#[derive(Debug)]
pub struct InstructionBundle {
    pub instructions: Vec<Instruction>,
    pub signers: Vec<Keypair>,
}

impl InstructionBundle {
    pub fn without_signers(instructions: Vec<Instruction>) -> Self {
        Self { instructions, signers: Vec::new() }
    }
}

fn opcode_amount_data(opcode: u8, amount: u64) -> AppResult<Vec<u8>> {
    Layout::new(vec![Field::U8, Field::U64])
        .encode(&[Value::U64(opcode as u64), Value::U64(amount)])
}

/// Floor a decimal UI amount into base units. Flooring (never rounding up)
/// keeps the result within what the wallet actually holds.
pub fn ui_amount_to_base(amount: f64, decimals: u8) -> AppResult<u64> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(AppError::BadRequest(format!("invalid amount {amount}")));
    }
    let scaled = amount * 10f64.powi(decimals as i32);
    if scaled >= u64::MAX as f64 {
        return Err(AppError::BadRequest(format!(
            "amount {amount} is not representable in u64 base units"
        )));
    }
    Ok(scaled.floor() as u64)
}

pub fn stake_account_rent_exempt() -> u64 {
    Rent::default().minimum_balance(STAKE_ACCOUNT_SPACE as usize)
}

pub fn build_compute_budget_instructions(units: u32, micro_lamports: u64) -> Vec<Instruction> {
    vec![
        ComputeBudgetInstruction::set_compute_unit_limit(units),
        ComputeBudgetInstruction::set_compute_unit_price(micro_lamports),
    ]
}

/// SPL-token Approve: grants `delegate` the right to move up to `amount`
/// of the owner's balance in `source`.
pub fn build_approve(
    source: &Pubkey,
    delegate: &Pubkey,
    owner: &Pubkey,
    amount: u64,
) -> AppResult<Instruction> {
    let data = opcode_amount_data(TOKEN_APPROVE_TAG, amount)?;
    Ok(Instruction {
        program_id: spl_token::id(),
        accounts: vec![
            AccountMeta::new(*source, false),
            AccountMeta::new_readonly(*delegate, false),
            AccountMeta::new_readonly(*owner, true),
        ],
        data,
    })
}

pub struct DepositSolParams<'a> {
    pub stake_pool_program: Pubkey,
    pub pool_address: Pubkey,
    pub pool: &'a PoolState,
    pub wallet: Pubkey,
    pub lamports: u64,
}

/// Deposit SOL for pool tokens. The destination token account is created
/// idempotently ahead of the deposit instruction.
pub fn build_deposit_sol(params: &DepositSolParams) -> AppResult<InstructionBundle> {
    let (withdraw_authority, _) =
        pda::pool_withdraw_authority(&params.stake_pool_program, &params.pool_address)?;
    let destination =
        spl_ata::get_associated_token_address(&params.wallet, &params.pool.pool_mint);

    let create_ata = spl_ata::instruction::create_associated_token_account_idempotent(
        &params.wallet,
        &params.wallet,
        &params.pool.pool_mint,
        &spl_token::id(),
    );

    let data = opcode_amount_data(DEPOSIT_SOL_OPCODE, params.lamports)?;
    let deposit = Instruction {
        program_id: params.stake_pool_program,
        accounts: vec![
            AccountMeta::new(params.pool_address, false),
            AccountMeta::new_readonly(withdraw_authority, false),
            AccountMeta::new(params.pool.reserve_stake, false),
            AccountMeta::new(params.wallet, true),
            AccountMeta::new(destination, false),
            AccountMeta::new(params.pool.manager_fee_account, false),
            AccountMeta::new(destination, false),
            AccountMeta::new(params.pool.pool_mint, false),
            AccountMeta::new_readonly(system_program::id(), false),
            AccountMeta::new_readonly(spl_token::id(), false),
        ],
        data,
    };

    Ok(InstructionBundle::without_signers(vec![create_ata, deposit]))
}

pub struct DepositStakeParams<'a> {
    pub interceptor_program: Pubkey,
    pub stake_pool_program: Pubkey,
    pub pool_address: Pubkey,
    pub pool: &'a PoolState,
    pub wallet: Pubkey,
    pub stake_account: Pubkey,
    pub stake_record: &'a StakeAccountRecord,
    /// Raw bytes of the interceptor's deposit-authority account; the vault
    /// address is read out of it at a fixed offset.
    pub deposit_authority_data: &'a [u8],
    pub validator_seed: Option<NonZeroU32>,
}

/// Deposit an existing, already-delegated stake account through the
/// interceptor wrapper. Both authorities are handed to the pool deposit
/// authority before the deposit instruction; the random base key that seeds
/// the receipt derivation must sign even though it funds nothing.
pub fn build_deposit_stake(params: &DepositStakeParams) -> AppResult<InstructionBundle> {
    if !params.stake_record.is_delegated() {
        return Err(AppError::BadRequest(
            "stake account is not delegated".to_string(),
        ));
    }

    let (deposit_authority, _) =
        pda::interceptor_deposit_authority(&params.interceptor_program, &params.pool_address)?;
    let (withdraw_authority, _) =
        pda::pool_withdraw_authority(&params.stake_pool_program, &params.pool_address)?;
    let vote_account = params.stake_record.delegated_vote_account;
    let (validator_stake, _) = pda::validator_stake_address(
        &params.stake_pool_program,
        &vote_account,
        &params.pool_address,
        params.validator_seed,
    )?;

    let mut cursor = DEPOSIT_AUTHORITY_VAULT_OFFSET;
    let vault = read_pubkey(params.deposit_authority_data, &mut cursor).map_err(|_| {
        AppError::Decode(format!(
            "deposit authority account holds {} bytes, vault field needs {}",
            params.deposit_authority_data.len(),
            DEPOSIT_AUTHORITY_VAULT_OFFSET + 32
        ))
    })?;

    let base = Keypair::new();
    let (deposit_receipt, _) = pda::deposit_receipt_address(
        &params.interceptor_program,
        &params.pool_address,
        &base.pubkey(),
    )?;

    let authorize_staker = stake::instruction::authorize(
        &params.stake_account,
        &params.wallet,
        &deposit_authority,
        StakeAuthorize::Staker,
        None,
    );
    let authorize_withdrawer = stake::instruction::authorize(
        &params.stake_account,
        &params.wallet,
        &deposit_authority,
        StakeAuthorize::Withdrawer,
        None,
    );

    let data = Layout::new(vec![Field::U8, Field::Address]).encode(&[
        Value::U64(INTERCEPTOR_DEPOSIT_STAKE_DISCRIMINATOR as u64),
        Value::Address(params.wallet),
    ])?;
    let deposit = Instruction {
        program_id: params.interceptor_program,
        accounts: vec![
            AccountMeta::new(params.wallet, true),
            AccountMeta::new_readonly(base.pubkey(), true),
            AccountMeta::new(deposit_receipt, false),
            AccountMeta::new(params.pool_address, false),
            AccountMeta::new(params.pool.validator_list, false),
            AccountMeta::new(deposit_authority, false),
            AccountMeta::new_readonly(withdraw_authority, false),
            AccountMeta::new(params.stake_account, false),
            AccountMeta::new(validator_stake, false),
            AccountMeta::new(params.pool.reserve_stake, false),
            AccountMeta::new(vault, false),
            AccountMeta::new(params.pool.manager_fee_account, false),
            AccountMeta::new(params.pool.pool_mint, false),
            AccountMeta::new_readonly(sysvar::clock::id(), false),
            AccountMeta::new_readonly(sysvar::stake_history::id(), false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(stake::program::id(), false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data,
    };

    Ok(InstructionBundle {
        instructions: vec![authorize_staker, authorize_withdrawer, deposit],
        signers: vec![base],
    })
}

pub struct WithdrawStakeParams<'a> {
    pub stake_pool_program: Pubkey,
    pub pool_address: Pubkey,
    pub pool: &'a PoolState,
    pub wallet: Pubkey,
    /// Pool-owned stake account chosen by the selector.
    pub source_stake_address: Pubkey,
    pub pool_token_amount: u64,
}

/// Withdraw a stake account from the pool: create the destination stake
/// account, grant a per-transaction transfer authority the right to burn
/// the pool tokens, then split out of the chosen source.
pub fn build_withdraw_stake(params: &WithdrawStakeParams) -> AppResult<InstructionBundle> {
    let (withdraw_authority, _) =
        pda::pool_withdraw_authority(&params.stake_pool_program, &params.pool_address)?;
    let user_pool_account =
        spl_ata::get_associated_token_address(&params.wallet, &params.pool.pool_mint);

    let destination_stake = Keypair::new();
    let transfer_authority = Keypair::new();

    let create_destination = system_instruction::create_account(
        &params.wallet,
        &destination_stake.pubkey(),
        stake_account_rent_exempt(),
        STAKE_ACCOUNT_SPACE,
        &stake::program::id(),
    );
    let approve = build_approve(
        &user_pool_account,
        &transfer_authority.pubkey(),
        &params.wallet,
        params.pool_token_amount,
    )?;

    let data = opcode_amount_data(WITHDRAW_STAKE_OPCODE, params.pool_token_amount)?;
    let withdraw = Instruction {
        program_id: params.stake_pool_program,
        accounts: vec![
            AccountMeta::new(params.pool_address, false),
            AccountMeta::new(params.pool.validator_list, false),
            AccountMeta::new_readonly(withdraw_authority, false),
            AccountMeta::new(params.source_stake_address, false),
            AccountMeta::new(destination_stake.pubkey(), false),
            AccountMeta::new_readonly(params.wallet, false),
            AccountMeta::new_readonly(transfer_authority.pubkey(), true),
            AccountMeta::new(user_pool_account, false),
            AccountMeta::new(params.pool.manager_fee_account, false),
            AccountMeta::new(params.pool.pool_mint, false),
            AccountMeta::new_readonly(sysvar::clock::id(), false),
            AccountMeta::new_readonly(spl_token::id(), false),
            AccountMeta::new_readonly(stake::program::id(), false),
        ],
        data,
    };

    Ok(InstructionBundle {
        instructions: vec![create_destination, approve, withdraw],
        signers: vec![destination_stake, transfer_authority],
    })
}

pub struct CreateStakeParams {
    pub wallet: Pubkey,
    pub vote_account: Pubkey,
    pub lamports: u64,
}

/// Allocate a fresh stake account funded with `lamports` plus the
/// rent-exempt minimum and delegate it to the chosen vote account in the
/// same transaction. Funding precedes delegation.
pub fn build_create_and_delegate_stake(params: &CreateStakeParams) -> AppResult<InstructionBundle> {
    let stake_account = Keypair::new();
    let total = params
        .lamports
        .checked_add(stake_account_rent_exempt())
        .ok_or_else(|| AppError::BadRequest("stake amount overflows".to_string()))?;

    let mut instructions = stake::instruction::create_account(
        &params.wallet,
        &stake_account.pubkey(),
        &Authorized::auto(&params.wallet),
        &Lockup::default(),
        total,
    );
    instructions.push(stake::instruction::delegate_stake(
        &stake_account.pubkey(),
        &params.wallet,
        &params.vote_account,
    ));

    Ok(InstructionBundle {
        instructions,
        signers: vec![stake_account],
    })
}
