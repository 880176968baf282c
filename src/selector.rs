//! Chooses the single pool-owned stake account to withdraw from. First-fit
//! over mutable remote state: the scan accepts the first candidate whose
//! available balance covers twice the request, a probabilistic buffer
//! against concurrent withdrawals draining the same account between
//! selection and execution.

use crate::config::NetworkContext;
use crate::error::{AppError, AppResult};
use crate::pda;
use crate::solana_client::AccountSummary;
use crate::state::{StakeStatus, ValidatorListEntry};
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::future::Future;
use std::num::NonZeroU32;
use std::str::FromStr;
use tracing::debug;

#[derive(Clone, Debug, PartialEq)]
pub struct SelectedStake {
    pub vote_account: Pubkey,
    pub stake_address: Pubkey,
    pub available_lamports: u64,
}

pub struct LocalScanParams<'a> {
    pub network: &'a NetworkContext,
    pub stake_pool_program: Pubkey,
    pub pool_address: Pubkey,
    pub requested_lamports: u64,
}

/// Scan the validator list in order and pick the first entry that can cover
/// the request with a 100% buffer. `fetch` looks up the candidate's stake
/// account; candidates that are absent or not owned by the stake program
/// are skipped.
pub async fn select_validator_stake<F, Fut>(
    entries: &[ValidatorListEntry],
    params: &LocalScanParams<'_>,
    mut fetch: F,
) -> AppResult<SelectedStake>
where
    F: FnMut(Pubkey) -> Fut,
    Fut: Future<Output = AppResult<Option<AccountSummary>>>,
{
    let required = params.requested_lamports.checked_mul(2).ok_or_else(|| {
        AppError::BadRequest(format!(
            "requested amount {} overflows the safety buffer",
            params.requested_lamports
        ))
    })?;

    let mut scanned = 0usize;
    for entry in entries {
        if entry.status != StakeStatus::Active {
            debug!(vote = %entry.vote_account, status = ?entry.status, "skipping non-active validator");
            continue;
        }
        scanned += 1;

        let seed = NonZeroU32::new(entry.validator_seed_suffix);
        let (stake_address, _) = pda::validator_stake_address(
            &params.stake_pool_program,
            &entry.vote_account,
            &params.pool_address,
            seed,
        )?;

        let summary = match fetch(stake_address).await? {
            Some(summary) => summary,
            None => {
                debug!(%stake_address, "stake account absent, skipping");
                continue;
            }
        };
        if summary.owner != solana_sdk::stake::program::id() {
            debug!(%stake_address, owner = %summary.owner, "unexpected owner, skipping");
            continue;
        }

        let available = summary
            .lamports
            .saturating_sub(params.network.minimum_reserve_lamports);
        if available > required {
            return Ok(SelectedStake {
                vote_account: entry.vote_account,
                stake_address,
                available_lamports: available,
            });
        }
        debug!(
            vote = %entry.vote_account,
            available,
            required,
            "insufficient headroom, skipping"
        );
    }

    Err(AppError::NoEligibleValidator(format!(
        "no validator among {scanned} active entries can cover {} lamports with a 2x buffer",
        params.requested_lamports
    )))
}

/// Externally ranked withdrawal candidate. Availability figures are trusted
/// as of their snapshot time.
#[derive(Clone, Debug, Deserialize)]
pub struct RankedCandidate {
    pub rank: u32,
    pub vote_account: String,
    pub withdrawable_lamports: u64,
    pub stake_account: String,
}

/// Pick the best-ranked candidate whose precomputed availability covers the
/// request.
pub fn select_ranked(
    candidates: &[RankedCandidate],
    requested_lamports: u64,
) -> AppResult<SelectedStake> {
    let mut ordered: Vec<&RankedCandidate> = candidates.iter().collect();
    ordered.sort_by_key(|c| c.rank);

    for candidate in &ordered {
        if candidate.withdrawable_lamports >= requested_lamports {
            let vote_account = Pubkey::from_str(&candidate.vote_account).map_err(|e| {
                AppError::Decode(format!("bad vote account {}: {e}", candidate.vote_account))
            })?;
            let stake_address = Pubkey::from_str(&candidate.stake_account).map_err(|e| {
                AppError::Decode(format!("bad stake account {}: {e}", candidate.stake_account))
            })?;
            return Ok(SelectedStake {
                vote_account,
                stake_address,
                available_lamports: candidate.withdrawable_lamports,
            });
        }
    }

    let max_available = ordered
        .iter()
        .map(|c| c.withdrawable_lamports)
        .max()
        .unwrap_or(0);
    Err(AppError::NoEligibleValidator(format!(
        "requested {requested_lamports} lamports, best candidate offers {max_available}"
    )))
}

/// Fetch the ranked candidate list for a pool from the configured endpoint.
pub async fn fetch_ranked_candidates(
    http: &reqwest::Client,
    base_url: &str,
    pool_address: &Pubkey,
) -> AppResult<Vec<RankedCandidate>> {
    let url = format!("{}/pools/{}/withdrawal-candidates", base_url.trim_end_matches('/'), pool_address);
    let response = http
        .get(&url)
        .send()
        .await
        .map_err(|e| AppError::RemoteUnavailable(format!("ranked candidates: {e}")))?;
    if !response.status().is_success() {
        return Err(AppError::RemoteUnavailable(format!(
            "ranked candidates: HTTP {}",
            response.status()
        )));
    }
    response
        .json::<Vec<RankedCandidate>>()
        .await
        .map_err(|e| AppError::Decode(format!("ranked candidates body: {e}")))
}
