//! Decoder for the stake pool account itself: authorities, mint, reserve,
//! bookkeeping totals, and the fee schedule.

use crate::error::{AppError, AppResult};
use crate::layout::{read_i64, read_pubkey, read_u64, read_u8};
use solana_sdk::pubkey::Pubkey;

pub const POOL_ACCOUNT_TYPE: u8 = 1;

/// Fee fraction as stored on chain (denominator first). A zero denominator
/// means no fee is charged; it is never treated as a division.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fee {
    pub denominator: u64,
    pub numerator: u64,
}

impl Fee {
    pub fn is_none(&self) -> bool {
        self.denominator == 0 || self.numerator == 0
    }

    /// Ratio for display purposes. `None` when no fee applies.
    pub fn ratio(&self) -> Option<f64> {
        if self.is_none() {
            None
        } else {
            Some(self.numerator as f64 / self.denominator as f64)
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PoolState {
    pub manager: Pubkey,
    pub staker: Pubkey,
    pub stake_deposit_authority: Pubkey,
    pub stake_withdraw_bump_seed: u8,
    pub validator_list: Pubkey,
    pub reserve_stake: Pubkey,
    pub pool_mint: Pubkey,
    pub manager_fee_account: Pubkey,
    pub token_program_id: Pubkey,
    pub total_lamports: u64,
    pub pool_token_supply: u64,
    pub last_update_epoch: u64,
    pub epoch_fee: Fee,
    pub preferred_deposit_validator: Option<Pubkey>,
    pub preferred_withdraw_validator: Option<Pubkey>,
    pub stake_deposit_fee: Fee,
    pub stake_withdrawal_fee: Fee,
    pub sol_deposit_authority: Option<Pubkey>,
    pub sol_deposit_fee: Fee,
    pub sol_withdraw_authority: Option<Pubkey>,
    pub sol_withdrawal_fee: Fee,
}

impl PoolState {
    /// Lamports per pool token. Undefined while the supply is zero.
    pub fn exchange_rate(&self) -> Option<f64> {
        if self.pool_token_supply == 0 {
            None
        } else {
            Some(self.total_lamports as f64 / self.pool_token_supply as f64)
        }
    }

    /// Floor conversion of a lamport figure into pool tokens. `None` while
    /// the rate is undefined.
    pub fn lamports_to_pool_tokens(&self, lamports: u64) -> Option<u64> {
        if self.pool_token_supply == 0 || self.total_lamports == 0 {
            return None;
        }
        let tokens =
            lamports as u128 * self.pool_token_supply as u128 / self.total_lamports as u128;
        u64::try_from(tokens).ok()
    }

    /// Floor conversion of pool tokens into lamports. `None` while the rate
    /// is undefined.
    pub fn pool_tokens_to_lamports(&self, pool_tokens: u64) -> Option<u64> {
        if self.pool_token_supply == 0 {
            return None;
        }
        let lamports =
            pool_tokens as u128 * self.total_lamports as u128 / self.pool_token_supply as u128;
        u64::try_from(lamports).ok()
    }
}

pub fn decode_pool_state(data: &[u8]) -> AppResult<PoolState> {
    let mut offset = 0usize;
    let account_type = read_u8(data, &mut offset).map_err(|_| {
        AppError::Decode("pool account is empty".to_string())
    })?;
    if account_type != POOL_ACCOUNT_TYPE {
        return Err(AppError::Decode(format!(
            "account type {account_type} is not a stake pool"
        )));
    }

    let manager = read_pubkey(data, &mut offset)?;
    let staker = read_pubkey(data, &mut offset)?;
    let stake_deposit_authority = read_pubkey(data, &mut offset)?;
    let stake_withdraw_bump_seed = read_u8(data, &mut offset)?;
    let validator_list = read_pubkey(data, &mut offset)?;
    let reserve_stake = read_pubkey(data, &mut offset)?;
    let pool_mint = read_pubkey(data, &mut offset)?;
    let manager_fee_account = read_pubkey(data, &mut offset)?;
    let token_program_id = read_pubkey(data, &mut offset)?;
    let total_lamports = read_u64(data, &mut offset)?;
    let pool_token_supply = read_u64(data, &mut offset)?;
    let last_update_epoch = read_u64(data, &mut offset)?;
    // Pool lockup: timestamp, epoch, custodian. Not used by any flow.
    let _ = read_i64(data, &mut offset)?;
    let _ = read_u64(data, &mut offset)?;
    let _ = read_pubkey(data, &mut offset)?;
    let epoch_fee = read_fee(data, &mut offset)?;
    let preferred_deposit_validator = read_optional_pubkey(data, &mut offset)?;
    let preferred_withdraw_validator = read_optional_pubkey(data, &mut offset)?;
    let stake_deposit_fee = read_fee(data, &mut offset)?;
    let stake_withdrawal_fee = read_fee(data, &mut offset)?;
    let _stake_referral_fee = read_u8(data, &mut offset)?;
    let sol_deposit_authority = read_optional_pubkey(data, &mut offset)?;
    let sol_deposit_fee = read_fee(data, &mut offset)?;
    let _sol_referral_fee = read_u8(data, &mut offset)?;
    let sol_withdraw_authority = read_optional_pubkey(data, &mut offset)?;
    let sol_withdrawal_fee = read_fee(data, &mut offset)?;
    // Trailing bookkeeping (last-epoch totals, token metadata) is ignored.

    Ok(PoolState {
        manager,
        staker,
        stake_deposit_authority,
        stake_withdraw_bump_seed,
        validator_list,
        reserve_stake,
        pool_mint,
        manager_fee_account,
        token_program_id,
        total_lamports,
        pool_token_supply,
        last_update_epoch,
        epoch_fee,
        preferred_deposit_validator,
        preferred_withdraw_validator,
        stake_deposit_fee,
        stake_withdrawal_fee,
        sol_deposit_authority,
        sol_deposit_fee,
        sol_withdraw_authority,
        sol_withdrawal_fee,
    })
}

fn read_fee(data: &[u8], offset: &mut usize) -> AppResult<Fee> {
    let denominator = read_u64(data, offset)?;
    let numerator = read_u64(data, offset)?;
    Ok(Fee { denominator, numerator })
}

fn read_optional_pubkey(data: &[u8], offset: &mut usize) -> AppResult<Option<Pubkey>> {
    match read_u8(data, offset)? {
        0 => Ok(None),
        1 => Ok(Some(read_pubkey(data, offset)?)),
        tag => Err(AppError::Decode(format!("invalid option tag {tag}"))),
    }
}
