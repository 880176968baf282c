use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Layout mismatch: {0}")]
    LayoutMismatch(String),
    #[error("Truncated buffer: {0}")]
    TruncatedBuffer(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("No program address found for the given seeds")]
    NoValidAddress,
    #[error("No eligible validator: {0}")]
    NoEligibleValidator(String),
    #[error("Insufficient balance: requested {requested} lamports, available {available}")]
    InsufficientBalance { requested: u64, available: u64 },
    #[error("RPC unavailable: {0}")]
    RemoteUnavailable(String),
    #[error("Signing rejected by user")]
    UserRejected,
    #[error("Transaction rejected on chain: {0}")]
    TransactionFailed(String),
    #[error("Confirmation window expired with no outcome; check the signature out of band ({0})")]
    ConfirmationExpired(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;
