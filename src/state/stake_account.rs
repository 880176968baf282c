//! Decoder for native stake program accounts.
//!
//! Layout of a delegated stake account (200 bytes on chain):
//!   0   u32  state tag (0 uninitialized, 1 initialized, 2 delegated)
//!   4   u64  rent-exempt reserve
//!   12  32   staker authority
//!   44  32   withdrawer authority
//!   76  i64  lockup unix timestamp
//!   84  u64  lockup epoch
//!   92  32   lockup custodian
//!   124 32   delegated vote account
//!   156 u64  delegated lamports
//!   164 u64  activation epoch
//!   172 u64  deactivation epoch

use crate::error::{AppError, AppResult};
use crate::layout::{read_i64, read_pubkey, read_u32, read_u64};
use solana_sdk::pubkey::Pubkey;

/// Byte position of the delegated vote account. Fixed contract with the
/// stake program's storage layout: 4 (state) + 8 (rent reserve) + 64
/// (authorities) + 48 (lockup).
pub const VOTE_ACCOUNT_OFFSET: usize = 124;

const MIN_DELEGATED_LEN: usize = 180;

const STATE_DELEGATED: u32 = 2;

#[derive(Clone, Debug, PartialEq)]
pub struct StakeAccountRecord {
    pub meta_version: u32,
    pub rent_exempt_reserve: u64,
    pub staker: Pubkey,
    pub withdrawer: Pubkey,
    pub lockup_unix_timestamp: i64,
    pub lockup_epoch: u64,
    pub lockup_custodian: Pubkey,
    pub delegated_vote_account: Pubkey,
    pub delegated_lamports: u64,
    pub activation_epoch: u64,
    pub deactivation_epoch: u64,
}

impl StakeAccountRecord {
    pub fn is_delegated(&self) -> bool {
        self.meta_version == STATE_DELEGATED
    }
}

pub fn decode_stake_account(data: &[u8]) -> AppResult<StakeAccountRecord> {
    if data.len() < MIN_DELEGATED_LEN {
        return Err(AppError::Decode(format!(
            "stake account holds {} bytes, expected at least {MIN_DELEGATED_LEN}",
            data.len()
        )));
    }

    let mut offset = 0usize;
    let meta_version = read_u32(data, &mut offset)?;
    if meta_version > STATE_DELEGATED {
        return Err(AppError::Decode(format!(
            "unknown stake state tag {meta_version}"
        )));
    }
    let rent_exempt_reserve = read_u64(data, &mut offset)?;
    let staker = read_pubkey(data, &mut offset)?;
    let withdrawer = read_pubkey(data, &mut offset)?;
    let lockup_unix_timestamp = read_i64(data, &mut offset)?;
    let lockup_epoch = read_u64(data, &mut offset)?;
    let lockup_custodian = read_pubkey(data, &mut offset)?;
    debug_assert_eq!(offset, VOTE_ACCOUNT_OFFSET);
    let delegated_vote_account = read_pubkey(data, &mut offset)?;
    let delegated_lamports = read_u64(data, &mut offset)?;
    let activation_epoch = read_u64(data, &mut offset)?;
    let deactivation_epoch = read_u64(data, &mut offset)?;

    Ok(StakeAccountRecord {
        meta_version,
        rent_exempt_reserve,
        staker,
        withdrawer,
        lockup_unix_timestamp,
        lockup_epoch,
        lockup_custodian,
        delegated_vote_account,
        delegated_lamports,
        activation_epoch,
        deactivation_epoch,
    })
}
