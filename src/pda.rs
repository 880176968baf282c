//! Deterministic program-derived addresses. Each derivation walks the bump
//! seed down from 255 and takes the first off-curve result; the seed sets
//! here are a contract with the deployed programs and must not drift.

use crate::error::{AppError, AppResult};
use solana_sdk::pubkey::Pubkey;
use std::num::NonZeroU32;

pub const WITHDRAW_AUTHORITY_SEED: &[u8] = b"withdraw";
pub const TRANSIENT_STAKE_SEED_PREFIX: &[u8] = b"transient";
pub const DEPOSIT_RECEIPT_SEED: &[u8] = b"deposit_receipt";
pub const DEPOSIT_AUTHORITY_SEED: &[u8] = b"deposit_authority";

/// The checked form of the canonical bump search. Exhausting all 256 bumps
/// is practically impossible but is still a handled condition.
pub fn derive_program_address(program_id: &Pubkey, seeds: &[&[u8]]) -> AppResult<(Pubkey, u8)> {
    Pubkey::try_find_program_address(seeds, program_id).ok_or(AppError::NoValidAddress)
}

/// Pool withdraw authority: `[pool, "withdraw"]`.
pub fn pool_withdraw_authority(
    stake_pool_program: &Pubkey,
    pool: &Pubkey,
) -> AppResult<(Pubkey, u8)> {
    derive_program_address(stake_pool_program, &[pool.as_ref(), WITHDRAW_AUTHORITY_SEED])
}

/// Pool-owned stake account for a validator: `[vote, pool]`, with an
/// optional non-zero u32 suffix for pools that reseeded the account.
pub fn validator_stake_address(
    stake_pool_program: &Pubkey,
    vote_account: &Pubkey,
    pool: &Pubkey,
    seed: Option<NonZeroU32>,
) -> AppResult<(Pubkey, u8)> {
    match seed {
        Some(seed) => derive_program_address(
            stake_pool_program,
            &[vote_account.as_ref(), pool.as_ref(), &seed.get().to_le_bytes()],
        ),
        None => derive_program_address(stake_pool_program, &[vote_account.as_ref(), pool.as_ref()]),
    }
}

/// Transient stake account: `["transient", vote, pool, u64-LE seed]`.
pub fn transient_stake_address(
    stake_pool_program: &Pubkey,
    vote_account: &Pubkey,
    pool: &Pubkey,
    seed: u64,
) -> AppResult<(Pubkey, u8)> {
    derive_program_address(
        stake_pool_program,
        &[
            TRANSIENT_STAKE_SEED_PREFIX,
            vote_account.as_ref(),
            pool.as_ref(),
            &seed.to_le_bytes(),
        ],
    )
}

/// Per-deposit receipt tracked by the interceptor wrapper program:
/// `["deposit_receipt", pool, base]`, where `base` is a random
/// per-transaction key that must also sign.
pub fn deposit_receipt_address(
    interceptor_program: &Pubkey,
    pool: &Pubkey,
    base: &Pubkey,
) -> AppResult<(Pubkey, u8)> {
    derive_program_address(
        interceptor_program,
        &[DEPOSIT_RECEIPT_SEED, pool.as_ref(), base.as_ref()],
    )
}

/// The interceptor's pool-scoped deposit authority:
/// `["deposit_authority", pool]`.
pub fn interceptor_deposit_authority(
    interceptor_program: &Pubkey,
    pool: &Pubkey,
) -> AppResult<(Pubkey, u8)> {
    derive_program_address(interceptor_program, &[DEPOSIT_AUTHORITY_SEED, pool.as_ref()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let program = Pubkey::new_unique();
        let pool = Pubkey::new_unique();
        let a = pool_withdraw_authority(&program, &pool).unwrap();
        let b = pool_withdraw_authority(&program, &pool).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn seed_suffix_changes_stake_address() {
        let program = Pubkey::new_unique();
        let pool = Pubkey::new_unique();
        let vote = Pubkey::new_unique();
        let base = validator_stake_address(&program, &vote, &pool, None).unwrap();
        let suffixed =
            validator_stake_address(&program, &vote, &pool, NonZeroU32::new(1)).unwrap();
        assert_ne!(base.0, suffixed.0);
    }
}
