use std::sync::Arc;

use log::trace;
use tokio::sync::{broadcast, Mutex};

use crate::asset::AssetTransfer;
use crate::core::{Account, Amount, EventRecord, Ledger, LedgerResult};

/// Shared handle to a ledger. Every operation holds the single ledger lock
/// from its first check until the asset transfer has settled, so callers on
/// different tasks are fully serialized.
pub struct VaultService<T: AssetTransfer> {
    ledger: Arc<Mutex<Ledger<T>>>,
    events: broadcast::Sender<EventRecord>
}

impl<T: AssetTransfer> Clone for VaultService<T> {
    fn clone(&self) -> Self {
        VaultService { ledger: Arc::clone(&self.ledger), events: self.events.clone() }
    }
}

impl<T: AssetTransfer> VaultService<T> {
    pub const DEFAULT_EVENT_BUFFER: usize = 64;
    pub const MAX_EVENT_BUFFER: usize = 1 << 16;

    /// `event_buffer` is how many records a slow subscriber may lag behind,
    /// clamped to `1..=MAX_EVENT_BUFFER`.
    pub fn new(ledger: Ledger<T>, event_buffer: usize) -> VaultService<T> {
        let (events, _) = broadcast::channel(event_buffer.clamp(1, Self::MAX_EVENT_BUFFER));
        return VaultService { ledger: Arc::new(Mutex::new(ledger)), events };
    }

    /// Receives every journal record written after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.events.subscribe()
    }

    pub async fn deposit(&self, account: &Account, amount: Amount) -> LedgerResult<()> {
        let mut ledger = self.ledger.lock().await;
        let seen = ledger.events().len();
        ledger.deposit(account, amount)?;
        self.publish(&ledger, seen);
        return Ok(());
    }

    pub async fn withdraw(&self, account: &Account, amount: Amount) -> LedgerResult<()> {
        let mut ledger = self.ledger.lock().await;
        let seen = ledger.events().len();
        ledger.withdraw(account, amount)?;
        self.publish(&ledger, seen);
        return Ok(());
    }

    pub async fn balance_of(&self, account: &Account) -> Amount {
        self.ledger.lock().await.balance_of(account)
    }

    pub async fn total_balance(&self) -> Amount {
        self.ledger.lock().await.total_balance()
    }

    pub async fn top_two(&self) -> LedgerResult<(Account, Account)> {
        let ledger = self.ledger.lock().await;
        let (first, second) = ledger.top_two()?;
        return Ok((first.clone(), second.clone()));
    }

    pub async fn leaderboard(&self) -> Vec<(Account, Amount)> {
        self.ledger.lock().await.leaderboard()
            .into_iter()
            .map(|(account, balance)| (account.clone(), balance))
            .collect()
    }

    /// Run `f` against the ledger while holding the lock.
    pub async fn inspect<R>(&self, f: impl FnOnce(&Ledger<T>) -> R) -> R {
        let ledger = self.ledger.lock().await;
        f(&ledger)
    }

    fn publish(&self, ledger: &Ledger<T>, seen: usize) {
        for record in &ledger.events()[seen..] {
            if self.events.send(record.clone()).is_err() {
                trace!("no subscribers for event {}", record.seq);
            }
        }
    }
}
