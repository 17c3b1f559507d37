pub mod core;
pub mod asset;
pub mod service;

pub use crate::core::{Account, Amount, Ledger, LedgerError, LedgerEvent, LedgerResult, EventRecord};
pub use crate::core::{account, event, ledger, ranking};
pub use crate::asset::{AssetTransfer, InMemoryToken, TransferError};
pub use crate::service::VaultService;
