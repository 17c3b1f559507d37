pub mod account;
pub mod event;
pub mod error;
pub mod ranking;
pub mod ledger;

pub type Amount = u64;

pub use account::Account;
pub use event::{EventRecord, LedgerEvent};
pub use error::{LedgerError, LedgerResult};
pub use ledger::Ledger;
