use std::collections::{HashMap, HashSet};

use crate::asset::{AssetTransfer, TransferError};
use crate::core::{Account, Amount};

type AmountPerAccount = HashMap<Account, Amount>;

/// A fungible token kept entirely in memory. Depositors hold wallet
/// balances and must `approve` the ledger before it can pull from them,
/// value pulled in sits in `custody` until it is pushed back out.
#[derive(Debug, Default)]
pub struct InMemoryToken {
    wallets: AmountPerAccount,
    allowances: AmountPerAccount,
    frozen: HashSet<Account>,
    custody: Amount
}

impl InMemoryToken {
    pub fn new() -> InMemoryToken {
        InMemoryToken::default()
    }

    pub fn mint(&mut self, account: &Account, amount: Amount) -> Result<(), TransferError> {
        let wallet = self.wallets.entry(account.clone()).or_insert(0);
        *wallet = wallet.checked_add(amount)
            .ok_or_else(|| TransferError::Overflow(account.clone()))?;
        return Ok(());
    }

    /// Set how much the ledger may pull from `account`, replacing any previous allowance.
    pub fn approve(&mut self, account: &Account, amount: Amount) {
        self.allowances.insert(account.clone(), amount);
    }

    pub fn freeze(&mut self, account: &Account) {
        self.frozen.insert(account.clone());
    }

    pub fn unfreeze(&mut self, account: &Account) {
        self.frozen.remove(account);
    }

    pub fn balance_of(&self, account: &Account) -> Amount {
        self.wallets.get(account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, account: &Account) -> Amount {
        self.allowances.get(account).copied().unwrap_or(0)
    }

    /// Value currently held on behalf of the ledger.
    pub fn custody(&self) -> Amount {
        self.custody
    }
}

impl AssetTransfer for InMemoryToken {
    fn pull_from(&mut self, account: &Account, amount: Amount) -> Result<(), TransferError> {
        let approved = self.allowance(account);
        if approved < amount {
            return Err(TransferError::InsufficientAllowance { account: account.clone(), requested: amount, approved });
        }
        let available = self.balance_of(account);
        if available < amount {
            return Err(TransferError::InsufficientFunds { account: account.clone(), requested: amount, available });
        }
        let custody = self.custody.checked_add(amount)
            .ok_or_else(|| TransferError::Overflow(account.clone()))?;

        self.custody = custody;
        self.wallets.insert(account.clone(), available - amount);
        self.allowances.insert(account.clone(), approved - amount);
        return Ok(());
    }

    fn push_to(&mut self, account: &Account, amount: Amount) -> Result<(), TransferError> {
        if self.frozen.contains(account) {
            return Err(TransferError::Frozen(account.clone()));
        }
        if self.custody < amount {
            return Err(TransferError::InsufficientCustody { requested: amount, held: self.custody });
        }
        let wallet = self.balance_of(account).checked_add(amount)
            .ok_or_else(|| TransferError::Overflow(account.clone()))?;

        self.custody -= amount;
        self.wallets.insert(account.clone(), wallet);
        return Ok(());
    }
}
