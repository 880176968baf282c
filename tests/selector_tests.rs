// Selection policy tests: first-fit over the validator list and rank-order
// selection over externally computed candidates.

use solana_sdk::pubkey::Pubkey;
use stakeflow::config::{Cluster, NetworkContext};
use stakeflow::error::AppError;
use stakeflow::pda;
use stakeflow::selector::{
    select_ranked, select_validator_stake, LocalScanParams, RankedCandidate,
};
use stakeflow::solana_client::AccountSummary;
use stakeflow::state::{StakeStatus, ValidatorListEntry};
use std::collections::HashMap;

fn entry(vote: Pubkey, status: StakeStatus) -> ValidatorListEntry {
    ValidatorListEntry {
        active_stake_lamports: 0,
        transient_stake_lamports: 0,
        last_update_epoch: 700,
        transient_seed_suffix: 0,
        validator_seed_suffix: 0,
        status,
        vote_account: vote,
    }
}

fn network() -> NetworkContext {
    NetworkContext::new(Cluster::Testnet, "http://localhost:8899".to_string(), None)
}

struct Scan {
    network: NetworkContext,
    stake_pool_program: Pubkey,
    pool_address: Pubkey,
    accounts: HashMap<Pubkey, AccountSummary>,
}

impl Scan {
    fn new() -> Self {
        Self {
            network: network(),
            stake_pool_program: Pubkey::new_unique(),
            pool_address: Pubkey::new_unique(),
            accounts: HashMap::new(),
        }
    }

    /// Registers the pool-owned stake account for `vote` with the given
    /// available balance on top of the network minimum reserve.
    fn fund(&mut self, vote: &Pubkey, available: u64, owner: Pubkey) {
        let (stake_address, _) =
            pda::validator_stake_address(&self.stake_pool_program, vote, &self.pool_address, None)
                .unwrap();
        self.accounts.insert(
            stake_address,
            AccountSummary {
                lamports: available + self.network.minimum_reserve_lamports,
                owner,
            },
        );
    }

    async fn select(
        &self,
        entries: &[ValidatorListEntry],
        requested: u64,
    ) -> Result<stakeflow::selector::SelectedStake, AppError> {
        let params = LocalScanParams {
            network: &self.network,
            stake_pool_program: self.stake_pool_program,
            pool_address: self.pool_address,
            requested_lamports: requested,
        };
        select_validator_stake(entries, &params, |address| {
            let found = self.accounts.get(&address).copied();
            async move { Ok(found) }
        })
        .await
    }
}

#[tokio::test]
async fn first_fit_skips_inactive_and_insufficient_entries() {
    let a = Pubkey::new_unique();
    let b = Pubkey::new_unique();
    let c = Pubkey::new_unique();
    let mut scan = Scan::new();
    scan.fund(&b, 1_000_000, solana_sdk::stake::program::id());
    scan.fund(&c, 10_000_000, solana_sdk::stake::program::id());

    let entries = vec![
        entry(a, StakeStatus::ReadyForRemoval),
        entry(b, StakeStatus::Active),
        entry(c, StakeStatus::Active),
    ];

    // 4_000_000 requested needs more than 8_000_000 available: A is not
    // active, B has too little headroom, C is the first fit.
    let selected = scan.select(&entries, 4_000_000).await.expect("selection");
    assert_eq!(selected.vote_account, c);
    assert_eq!(selected.available_lamports, 10_000_000);
}

#[tokio::test]
async fn first_fit_takes_list_order_not_best_available() {
    let b = Pubkey::new_unique();
    let c = Pubkey::new_unique();
    let mut scan = Scan::new();
    scan.fund(&b, 3_000_000, solana_sdk::stake::program::id());
    scan.fund(&c, 50_000_000, solana_sdk::stake::program::id());

    let entries = vec![entry(b, StakeStatus::Active), entry(c, StakeStatus::Active)];

    // B satisfies the buffer, so the larger C is never considered.
    let selected = scan.select(&entries, 1_000_000).await.expect("selection");
    assert_eq!(selected.vote_account, b);
}

#[tokio::test]
async fn scan_skips_absent_and_foreign_owned_accounts() {
    let a = Pubkey::new_unique();
    let b = Pubkey::new_unique();
    let c = Pubkey::new_unique();
    let mut scan = Scan::new();
    // A has no stake account at all, B's is owned by the wrong program.
    scan.fund(&b, 50_000_000, Pubkey::new_unique());
    scan.fund(&c, 50_000_000, solana_sdk::stake::program::id());

    let entries = vec![
        entry(a, StakeStatus::Active),
        entry(b, StakeStatus::Active),
        entry(c, StakeStatus::Active),
    ];

    let selected = scan.select(&entries, 1_000_000).await.expect("selection");
    assert_eq!(selected.vote_account, c);
}

#[tokio::test]
async fn exhausted_scan_reports_no_eligible_validator() {
    let a = Pubkey::new_unique();
    let mut scan = Scan::new();
    scan.fund(&a, 1_000, solana_sdk::stake::program::id());

    let entries = vec![entry(a, StakeStatus::Active)];
    let err = scan.select(&entries, 1_000_000).await.unwrap_err();
    assert!(matches!(err, AppError::NoEligibleValidator(_)));
}

fn ranked(rank: u32, withdrawable: u64) -> RankedCandidate {
    RankedCandidate {
        rank,
        vote_account: Pubkey::new_unique().to_string(),
        withdrawable_lamports: withdrawable,
        stake_account: Pubkey::new_unique().to_string(),
    }
}

#[test]
fn ranked_selection_takes_first_rank_that_covers() {
    let candidates = vec![ranked(1, 500), ranked(2, 5_000)];
    let selected = select_ranked(&candidates, 1_000).expect("ranked selection");
    assert_eq!(selected.available_lamports, 5_000);
}

#[test]
fn ranked_selection_orders_by_rank_not_position() {
    let big = ranked(2, 50_000);
    let small = ranked(1, 10_000);
    let candidates = vec![big, small];
    let selected = select_ranked(&candidates, 1_000).expect("ranked selection");
    assert_eq!(selected.available_lamports, 10_000);
}

#[test]
fn ranked_selection_error_names_best_available() {
    let candidates = vec![ranked(1, 500), ranked(2, 5_000)];
    let err = select_ranked(&candidates, 6_000).unwrap_err();
    match err {
        AppError::NoEligibleValidator(detail) => assert!(detail.contains("5000")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn ranked_selection_with_no_candidates() {
    let err = select_ranked(&[], 1).unwrap_err();
    assert!(matches!(err, AppError::NoEligibleValidator(_)));
}
