use crate::core::{Account, Amount};

/// Movement of the tracked asset between depositors and the ledger's custody.
///
/// Both calls must be all-or-nothing: an `Err` means no value moved.
pub trait AssetTransfer {
    /// Move `amount` from `account` into custody.
    fn pull_from(&mut self, account: &Account, amount: Amount) -> Result<(), TransferError>;
    /// Move `amount` out of custody to `account`.
    fn push_to(&mut self, account: &Account, amount: Amount) -> Result<(), TransferError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("{account} holds {available}, cannot send {requested}")]
    InsufficientFunds {
        account: Account,
        requested: Amount,
        available: Amount
    },
    #[error("{account} approved {approved}, cannot send {requested}")]
    InsufficientAllowance {
        account: Account,
        requested: Amount,
        approved: Amount
    },
    #[error("custody holds {held}, cannot release {requested}")]
    InsufficientCustody {
        requested: Amount,
        held: Amount
    },
    #[error("{0} is frozen")]
    Frozen(Account),
    #[error("balance of {0} would overflow")]
    Overflow(Account)
}
