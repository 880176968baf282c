//! Typed decoders for the remote account structures this crate reads. All
//! decoded records are value snapshots owned by the calling flow; nothing is
//! cached or shared across operations.

mod pool;
mod stake_account;
mod validator_list;

pub use pool::{decode_pool_state, Fee, PoolState, POOL_ACCOUNT_TYPE};
pub use stake_account::{decode_stake_account, StakeAccountRecord, VOTE_ACCOUNT_OFFSET};
pub use validator_list::{
    decode_validator_list, StakeStatus, ValidatorList, ValidatorListEntry, VALIDATOR_ENTRY_LEN,
    VALIDATOR_LIST_HEADER_LEN,
};
