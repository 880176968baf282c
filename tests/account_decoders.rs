// Decoder tests against literal byte fixtures. The stake-account fixture
// pins the vote-account offset, which is a hard contract with the on-chain
// layout.

use solana_sdk::pubkey::Pubkey;
use stakeflow::error::AppError;
use stakeflow::state::{
    decode_pool_state, decode_stake_account, decode_validator_list, StakeStatus,
    VALIDATOR_ENTRY_LEN, VALIDATOR_LIST_HEADER_LEN, VOTE_ACCOUNT_OFFSET,
};

fn stake_account_fixture(vote: &Pubkey) -> Vec<u8> {
    let mut data = Vec::with_capacity(200);
    data.extend_from_slice(&2u32.to_le_bytes()); // delegated
    data.extend_from_slice(&2_282_880u64.to_le_bytes()); // rent reserve
    data.extend_from_slice(Pubkey::new_unique().as_ref()); // staker
    data.extend_from_slice(Pubkey::new_unique().as_ref()); // withdrawer
    data.extend_from_slice(&0i64.to_le_bytes()); // lockup timestamp
    data.extend_from_slice(&0u64.to_le_bytes()); // lockup epoch
    data.extend_from_slice(&[0u8; 32]); // custodian
    assert_eq!(data.len(), VOTE_ACCOUNT_OFFSET);
    data.extend_from_slice(vote.as_ref());
    data.extend_from_slice(&5_000_000_000u64.to_le_bytes()); // delegated lamports
    data.extend_from_slice(&600u64.to_le_bytes()); // activation epoch
    data.extend_from_slice(&u64::MAX.to_le_bytes()); // deactivation epoch
    data.resize(200, 0);
    data
}

#[test]
fn stake_account_vote_address_sits_at_fixed_offset() {
    let vote = Pubkey::new_unique();
    let data = stake_account_fixture(&vote);
    assert_eq!(data.len(), 200);
    assert_eq!(&data[VOTE_ACCOUNT_OFFSET..VOTE_ACCOUNT_OFFSET + 32], vote.as_ref());

    let record = decode_stake_account(&data).expect("decode stake account");
    assert_eq!(record.delegated_vote_account, vote);
    assert_eq!(record.delegated_lamports, 5_000_000_000);
    assert_eq!(record.activation_epoch, 600);
    assert_eq!(record.deactivation_epoch, u64::MAX);
    assert!(record.is_delegated());
}

#[test]
fn stake_account_rejects_short_buffer() {
    let err = decode_stake_account(&[0u8; 100]).unwrap_err();
    assert!(matches!(err, AppError::Decode(_)));
}

#[test]
fn stake_account_rejects_unknown_state_tag() {
    let vote = Pubkey::new_unique();
    let mut data = stake_account_fixture(&vote);
    data[0..4].copy_from_slice(&9u32.to_le_bytes());
    let err = decode_stake_account(&data).unwrap_err();
    assert!(matches!(err, AppError::Decode(_)));
}

fn validator_entry(status: u8, vote: &Pubkey, active: u64) -> Vec<u8> {
    let mut entry = Vec::with_capacity(VALIDATOR_ENTRY_LEN);
    entry.extend_from_slice(&active.to_le_bytes());
    entry.extend_from_slice(&0u64.to_le_bytes()); // transient
    entry.extend_from_slice(&700u64.to_le_bytes()); // last update epoch
    entry.extend_from_slice(&0u64.to_le_bytes()); // transient seed suffix
    entry.extend_from_slice(&0u32.to_le_bytes()); // unused
    entry.extend_from_slice(&0u32.to_le_bytes()); // validator seed suffix
    entry.push(status);
    entry.extend_from_slice(vote.as_ref());
    assert_eq!(entry.len(), VALIDATOR_ENTRY_LEN);
    entry
}

fn validator_list_fixture(max: u32, count: u32, present: usize) -> (Vec<u8>, Vec<Pubkey>) {
    let mut data = Vec::new();
    data.extend_from_slice(&2u32.to_le_bytes()); // validator list account type
    data.extend_from_slice(&max.to_le_bytes());
    data.extend_from_slice(&count.to_le_bytes());
    let mut votes = Vec::new();
    for _ in 0..present {
        let vote = Pubkey::new_unique();
        data.extend_from_slice(&validator_entry(0, &vote, 1_000_000));
        votes.push(vote);
    }
    (data, votes)
}

#[test]
fn validator_list_decodes_exactly_the_declared_count() {
    let (data, votes) = validator_list_fixture(10, 3, 10);
    assert_eq!(data.len(), VALIDATOR_LIST_HEADER_LEN + 10 * VALIDATOR_ENTRY_LEN);

    let list = decode_validator_list(&data).expect("decode validator list");
    assert_eq!(list.max_validators, 10);
    assert_eq!(list.entries.len(), 3);
    for (entry, vote) in list.entries.iter().zip(&votes) {
        assert_eq!(entry.vote_account, *vote);
        assert_eq!(entry.status, StakeStatus::Active);
        assert_eq!(entry.active_stake_lamports, 1_000_000);
    }
}

#[test]
fn validator_list_rejects_count_past_capacity() {
    let (data, _) = validator_list_fixture(3, 5, 5);
    let err = decode_validator_list(&data).unwrap_err();
    assert!(matches!(err, AppError::Decode(_)));
}

#[test]
fn validator_list_rejects_unknown_status_byte() {
    let (mut data, _) = validator_list_fixture(2, 1, 1);
    data[VALIDATOR_LIST_HEADER_LEN + 40] = 9; // status byte of the first entry
    let err = decode_validator_list(&data).unwrap_err();
    assert!(matches!(err, AppError::Decode(_)));
}

#[test]
fn validator_list_rejects_truncated_body() {
    let (mut data, _) = validator_list_fixture(4, 2, 2);
    data.truncate(VALIDATOR_LIST_HEADER_LEN + VALIDATOR_ENTRY_LEN);
    let err = decode_validator_list(&data).unwrap_err();
    assert!(matches!(err, AppError::Decode(_)));
}

struct PoolFixture {
    data: Vec<u8>,
}

impl PoolFixture {
    fn new(total_lamports: u64, pool_token_supply: u64, sol_deposit_fee: (u64, u64)) -> Self {
        let mut data = Vec::new();
        data.push(1u8); // stake pool account type
        data.extend_from_slice(Pubkey::new_unique().as_ref()); // manager
        data.extend_from_slice(Pubkey::new_unique().as_ref()); // staker
        data.extend_from_slice(Pubkey::new_unique().as_ref()); // stake deposit authority
        data.push(255u8); // withdraw bump
        data.extend_from_slice(Pubkey::new_unique().as_ref()); // validator list
        data.extend_from_slice(Pubkey::new_unique().as_ref()); // reserve
        data.extend_from_slice(Pubkey::new_unique().as_ref()); // mint
        data.extend_from_slice(Pubkey::new_unique().as_ref()); // manager fee account
        data.extend_from_slice(spl_token::id().as_ref()); // token program
        data.extend_from_slice(&total_lamports.to_le_bytes());
        data.extend_from_slice(&pool_token_supply.to_le_bytes());
        data.extend_from_slice(&701u64.to_le_bytes()); // last update epoch
        data.extend_from_slice(&0i64.to_le_bytes()); // lockup timestamp
        data.extend_from_slice(&0u64.to_le_bytes()); // lockup epoch
        data.extend_from_slice(&[0u8; 32]); // lockup custodian
        Self::push_fee(&mut data, 100, 2); // epoch fee
        data.push(0u8); // preferred deposit validator: none
        data.push(0u8); // preferred withdraw validator: none
        Self::push_fee(&mut data, 1000, 1); // stake deposit fee
        Self::push_fee(&mut data, 1000, 3); // stake withdrawal fee
        data.push(0u8); // stake referral fee
        data.push(0u8); // sol deposit authority: none
        Self::push_fee(&mut data, sol_deposit_fee.0, sol_deposit_fee.1);
        data.push(0u8); // sol referral fee
        data.push(0u8); // sol withdraw authority: none
        Self::push_fee(&mut data, 1000, 2); // sol withdrawal fee
        Self { data }
    }

    fn push_fee(data: &mut Vec<u8>, denominator: u64, numerator: u64) {
        data.extend_from_slice(&denominator.to_le_bytes());
        data.extend_from_slice(&numerator.to_le_bytes());
    }
}

#[test]
fn pool_state_decodes_fee_schedule() {
    let fixture = PoolFixture::new(2_000_000_000, 1_000_000_000, (1000, 5));
    let pool = decode_pool_state(&fixture.data).expect("decode pool state");
    assert_eq!(pool.total_lamports, 2_000_000_000);
    assert_eq!(pool.pool_token_supply, 1_000_000_000);
    assert_eq!(pool.sol_deposit_fee.numerator, 5);
    assert_eq!(pool.sol_deposit_fee.denominator, 1000);
    assert_eq!(pool.sol_deposit_fee.ratio(), Some(0.005));
    assert_eq!(pool.exchange_rate(), Some(2.0));
    assert_eq!(pool.pool_tokens_to_lamports(500), Some(1000));
    assert_eq!(pool.lamports_to_pool_tokens(1000), Some(500));
    assert!(pool.preferred_deposit_validator.is_none());
    assert!(pool.sol_deposit_authority.is_none());
}

#[test]
fn zero_denominator_fee_means_no_fee() {
    let fixture = PoolFixture::new(1_000, 1_000, (0, 0));
    let pool = decode_pool_state(&fixture.data).expect("decode pool state");
    assert!(pool.sol_deposit_fee.is_none());
    assert_eq!(pool.sol_deposit_fee.ratio(), None);
}

#[test]
fn zero_supply_exchange_rate_is_undefined() {
    let fixture = PoolFixture::new(5_000_000, 0, (1000, 1));
    let pool = decode_pool_state(&fixture.data).expect("decode pool state");
    assert_eq!(pool.exchange_rate(), None);
    assert_eq!(pool.pool_tokens_to_lamports(100), None);
    assert_eq!(pool.lamports_to_pool_tokens(100), None);
}

#[test]
fn pool_state_rejects_wrong_account_type() {
    let mut fixture = PoolFixture::new(1, 1, (1, 1));
    fixture.data[0] = 2;
    let err = decode_pool_state(&fixture.data).unwrap_err();
    assert!(matches!(err, AppError::Decode(_)));
}
