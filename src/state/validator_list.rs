//! Decoder for the pool's validator list account: a 3-word header followed
//! by a bounded array of per-validator delegation records. Entries beyond
//! the declared count are not meaningful even when bytes for them exist.

use crate::error::{AppError, AppResult};
use crate::layout::{read_bytes, read_pubkey, read_u32, read_u64, read_u8};
use solana_sdk::pubkey::Pubkey;

/// `account_type`, `max_validators`, `validator_count`, each u32-LE.
pub const VALIDATOR_LIST_HEADER_LEN: usize = 12;
pub const VALIDATOR_ENTRY_LEN: usize = 73;

const ACCOUNT_TYPE_VALIDATOR_LIST: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StakeStatus {
    Active,
    DeactivatingTransient,
    ReadyForRemoval,
    DeactivatingValidator,
    DeactivatingAll,
}

impl StakeStatus {
    fn from_byte(byte: u8) -> AppResult<Self> {
        match byte {
            0 => Ok(StakeStatus::Active),
            1 => Ok(StakeStatus::DeactivatingTransient),
            2 => Ok(StakeStatus::ReadyForRemoval),
            3 => Ok(StakeStatus::DeactivatingValidator),
            4 => Ok(StakeStatus::DeactivatingAll),
            other => Err(AppError::Decode(format!(
                "unknown validator stake status {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidatorListEntry {
    pub active_stake_lamports: u64,
    pub transient_stake_lamports: u64,
    pub last_update_epoch: u64,
    pub transient_seed_suffix: u64,
    pub validator_seed_suffix: u32,
    pub status: StakeStatus,
    pub vote_account: Pubkey,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValidatorList {
    pub max_validators: u32,
    pub entries: Vec<ValidatorListEntry>,
}

pub fn decode_validator_list(data: &[u8]) -> AppResult<ValidatorList> {
    if data.len() < VALIDATOR_LIST_HEADER_LEN {
        return Err(AppError::Decode(format!(
            "validator list holds {} bytes, header needs {VALIDATOR_LIST_HEADER_LEN}",
            data.len()
        )));
    }

    let mut offset = 0usize;
    let account_type = read_u32(data, &mut offset)?;
    if account_type != ACCOUNT_TYPE_VALIDATOR_LIST {
        return Err(AppError::Decode(format!(
            "account type {account_type} is not a validator list"
        )));
    }
    let max_validators = read_u32(data, &mut offset)?;
    let validator_count = read_u32(data, &mut offset)?;
    if validator_count > max_validators {
        return Err(AppError::Decode(format!(
            "validator count {validator_count} exceeds capacity {max_validators}"
        )));
    }

    let body_needed = validator_count as usize * VALIDATOR_ENTRY_LEN;
    if data.len() - offset < body_needed {
        return Err(AppError::Decode(format!(
            "validator list declares {validator_count} entries ({body_needed} bytes), {} remain",
            data.len() - offset
        )));
    }

    let mut entries = Vec::with_capacity(validator_count as usize);
    for _ in 0..validator_count {
        entries.push(decode_entry(data, &mut offset)?);
    }
    // Capacity padding past validator_count is ignored.

    Ok(ValidatorList { max_validators, entries })
}

fn decode_entry(data: &[u8], offset: &mut usize) -> AppResult<ValidatorListEntry> {
    let active_stake_lamports = read_u64(data, offset)?;
    let transient_stake_lamports = read_u64(data, offset)?;
    let last_update_epoch = read_u64(data, offset)?;
    let transient_seed_suffix = read_u64(data, offset)?;
    let _unused = read_bytes(data, offset, 4)?;
    let validator_seed_suffix = read_u32(data, offset)?;
    let status = StakeStatus::from_byte(read_u8(data, offset)?)?;
    let vote_account = read_pubkey(data, offset)?;
    Ok(ValidatorListEntry {
        active_stake_lamports,
        transient_stake_lamports,
        last_update_epoch,
        transient_seed_suffix,
        validator_seed_suffix,
        status,
        vote_account,
    })
}
