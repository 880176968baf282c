//! Orders instruction bundles into a single atomic transaction, binds it to
//! a blockhash, and tracks the signers it still needs. A pending
//! transaction is single-use: it is signed once per required signer,
//! submitted once, and discarded; retries rebuild from a fresh blockhash.

use crate::error::{AppError, AppResult};
use crate::instructions::InstructionBundle;
use solana_sdk::{
    hash::Hash,
    instruction::Instruction,
    message::Message,
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};

/// External signing capability (a connected wallet). Implementations may
/// fail with [`AppError::UserRejected`] when the user declines the prompt.
pub trait WalletSigner {
    fn sign_transaction(&self, tx: &mut Transaction) -> AppResult<()>;
}

impl WalletSigner for Keypair {
    fn sign_transaction(&self, tx: &mut Transaction) -> AppResult<()> {
        let blockhash = tx.message.recent_blockhash;
        tx.partial_sign(&[self], blockhash);
        Ok(())
    }
}

#[derive(Debug)]
pub struct PendingTransaction {
    pub transaction: Transaction,
    pub ephemeral_signers: Vec<Keypair>,
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

/// Concatenate bundles preserving relative order (callers put the
/// compute-budget group first) and union their signer sets. Nothing is
/// deduplicated; callers are responsible for not emitting conflicting
/// instructions.
pub fn assemble(
    groups: Vec<InstructionBundle>,
    fee_payer: &Pubkey,
    blockhash: Hash,
    last_valid_block_height: u64,
) -> AppResult<PendingTransaction> {
    let mut instructions: Vec<Instruction> = Vec::new();
    let mut ephemeral_signers: Vec<Keypair> = Vec::new();
    for group in groups {
        instructions.extend(group.instructions);
        ephemeral_signers.extend(group.signers);
    }
    if instructions.is_empty() {
        return Err(AppError::BadRequest("no instructions to assemble".to_string()));
    }

    let mut transaction = Transaction::new_unsigned(Message::new(&instructions, Some(fee_payer)));
    transaction.message.recent_blockhash = blockhash;

    Ok(PendingTransaction {
        transaction,
        ephemeral_signers,
        blockhash,
        last_valid_block_height,
    })
}

impl PendingTransaction {
    /// Sign with every ephemeral program-scoped keypair, then hand the
    /// transaction to the external wallet signer. Consumes the pending
    /// transaction; the result is ready for submission.
    pub fn sign(mut self, wallet: &dyn WalletSigner) -> AppResult<SignedTransaction> {
        if !self.ephemeral_signers.is_empty() {
            let signers: Vec<&dyn Signer> = self
                .ephemeral_signers
                .iter()
                .map(|kp| kp as &dyn Signer)
                .collect();
            self.transaction.partial_sign(&signers, self.blockhash);
        }
        wallet.sign_transaction(&mut self.transaction)?;
        Ok(SignedTransaction {
            transaction: self.transaction,
            last_valid_block_height: self.last_valid_block_height,
        })
    }
}

#[derive(Debug)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub last_valid_block_height: u64,
}

impl SignedTransaction {
    /// Wire bytes for submission.
    pub fn serialize(&self) -> AppResult<Vec<u8>> {
        bincode::serialize(&self.transaction)
            .map_err(|e| AppError::Internal(format!("serialize tx: {e}")))
    }
}
