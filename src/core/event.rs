use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::core::{Account, Amount};

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    Deposited { account: Account, amount: Amount },
    Withdrawn { account: Account, amount: Amount }
}

impl LedgerEvent {
    pub fn account(&self) -> &Account {
        match self {
            Self::Deposited { account, .. } | Self::Withdrawn { account, .. } => account
        }
    }

    pub fn amount(&self) -> Amount {
        match self {
            Self::Deposited { amount, .. } | Self::Withdrawn { amount, .. } => *amount
        }
    }
}

impl std::fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deposited { account, amount } => write!(f, "Deposited {} from {}", amount, account),
            Self::Withdrawn { account, amount } => write!(f, "Withdrawn {} to {}", amount, account)
        }
    }
}

/// Journal entry. `seq` is the position in the journal, starting at 0.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EventRecord {
    pub seq: u64,
    pub at: DateTime<Utc>,
    pub event: LedgerEvent
}
