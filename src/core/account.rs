use std::fmt;

use serde::{Serialize, Deserialize};

/// Identifier of a depositor. Accounts carry no state of their own,
/// a ledger learns about one the first time it deposits.
#[derive(Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Account {
    id: String,
}

impl Account {
    pub fn new(id: &str) -> Account {
        Account { id: id.to_owned() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl From<&str> for Account {
    fn from(id: &str) -> Self {
        Account::new(id)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Account {}", self.id)
    }
}
