use crate::core::{Account, Amount};
use crate::asset::TransferError;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Occurs when a deposit or withdrawal is attempted with a zero amount.
    #[error("amount must be strictly positive")]
    InvalidAmount,
    /// Occurs when an account that never deposited tries to withdraw.
    #[error("user doesn't exist: {0}")]
    UnknownAccount(Account),
    /// Occurs when a withdrawal exceeds the tracked balance of the account.
    #[error("can't withdraw that much: {account} requested {requested} out of {available}")]
    InsufficientBalance {
        account: Account,
        requested: Amount,
        available: Amount
    },
    /// Occurs when ranking is requested before two accounts have deposited.
    #[error("less than two users: {count} participant(s)")]
    InsufficientParticipants {
        count: usize
    },
    /// Occurs when a deposit would push the ledger total past `Amount::MAX`.
    #[error("deposit of {requested} would overflow the ledger total of {total}")]
    BalanceOverflow {
        requested: Amount,
        total: Amount
    },
    /// The asset movement backing an operation did not happen.
    #[error("asset transfer failed")]
    TransferFailed(#[source] TransferError)
}

pub type LedgerResult<T> = Result<T, LedgerError>;
