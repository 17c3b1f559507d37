use std::collections::HashMap;

use chrono::Utc;
use log::{debug, error, warn};

use crate::asset::{AssetTransfer, InMemoryToken};
use crate::core::{Account, Amount, EventRecord, LedgerEvent, LedgerError, LedgerResult};
use crate::core::ranking;

type AccountAmountMap = HashMap<Account, Amount>;

/// Balances as of the last journal replay that matched, and how many
/// journal entries they account for.
#[derive(Default)]
struct Checkpoint {
    balances: AccountAmountMap,
    total: Amount,
    applied: usize
}

/// Custodial balances for a single asset.
///
/// Every account that ever deposited stays in `participants`, in the order
/// of its first deposit, and has an entry in `balances`.
///
/// The journal keeps every successful operation for the lifetime of the
/// ledger, so its memory grows with the number of operations. Replays only
/// walk the entries written since the last checkpoint.
pub struct Ledger<T: AssetTransfer> {
    asset: T,
    balances: AccountAmountMap,
    participants: Vec<Account>,
    total: Amount,
    journal: Vec<EventRecord>,
    checkpoint: Checkpoint,
    consistency_check_interval: usize
}

impl<T: AssetTransfer> Ledger<T> {
    pub const DEFAULT_CONSISTENCY_CHECK_INTERVAL: usize = 100;

    pub fn new(asset: T) -> Ledger<T> {
        Ledger::with_consistency_check_interval(asset, Self::DEFAULT_CONSISTENCY_CHECK_INTERVAL)
    }

    /// An `interval` of 0 turns the periodic journal replay off.
    pub fn with_consistency_check_interval(asset: T, interval: usize) -> Ledger<T> {
        return Ledger {
            asset,
            balances: HashMap::new(),
            participants: Vec::new(),
            total: 0,
            journal: Vec::new(),
            checkpoint: Checkpoint::default(),
            consistency_check_interval: interval
        };
    }

    pub fn deposit(&mut self, account: &Account, amount: Amount) -> LedgerResult<()> {
        if amount == 0 {
            warn!("rejected empty deposit from {}", account);
            return Err(LedgerError::InvalidAmount);
        }
        let total = self.total.checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow { requested: amount, total: self.total })?;

        if let Err(err) = self.asset.pull_from(account, amount) {
            warn!("deposit of {} from {} failed: {}", amount, account, err);
            return Err(LedgerError::TransferFailed(err));
        }

        // the ledger total bounds every balance, so this cannot overflow
        match self.balances.get_mut(account) {
            Some(balance) => *balance += amount,
            None => {
                self.balances.insert(account.clone(), amount);
                self.participants.push(account.clone());
            }
        }
        self.total = total;

        debug!("{} deposited {}, balance {}", account, amount, self.balance_of(account));
        self.record(LedgerEvent::Deposited { account: account.clone(), amount });
        return Ok(());
    }

    pub fn withdraw(&mut self, account: &Account, amount: Amount) -> LedgerResult<()> {
        let available = match self.balances.get(account) {
            Some(balance) => *balance,
            None => {
                warn!("withdrawal by unknown account {}", account);
                return Err(LedgerError::UnknownAccount(account.clone()));
            }
        };
        if amount == 0 {
            warn!("rejected empty withdrawal by {}", account);
            return Err(LedgerError::InvalidAmount);
        }
        if amount > available {
            warn!("{} tried to withdraw {} out of {}", account, amount, available);
            return Err(LedgerError::InsufficientBalance { account: account.clone(), requested: amount, available });
        }

        // effects before the outbound transfer
        Ledger::<T>::set_balance(&mut self.balances, account, available - amount);
        self.total -= amount;

        if let Err(err) = self.asset.push_to(account, amount) {
            warn!("withdrawal of {} to {} failed, restoring balance: {}", amount, account, err);
            Ledger::<T>::set_balance(&mut self.balances, account, available);
            self.total += amount;
            return Err(LedgerError::TransferFailed(err));
        }

        debug!("{} withdrew {}, balance {}", account, amount, available - amount);
        self.record(LedgerEvent::Withdrawn { account: account.clone(), amount });
        return Ok(());
    }

    /// Zero for accounts that never deposited.
    pub fn balance_of(&self, account: &Account) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn is_participant(&self, account: &Account) -> bool {
        self.balances.contains_key(account)
    }

    /// Participants in the order of their first deposit.
    pub fn participants(&self) -> &[Account] {
        &self.participants
    }

    pub fn total_balance(&self) -> Amount {
        self.total
    }

    /// The two largest balances, largest first. Equal balances rank by
    /// first deposit, earlier depositors ahead.
    pub fn top_two(&self) -> LedgerResult<(&Account, &Account)> {
        ranking::top_two(self.entries())
            .ok_or(LedgerError::InsufficientParticipants { count: self.participants.len() })
    }

    /// All participants ranked with the same ordering as `top_two`.
    pub fn leaderboard(&self) -> Vec<(&Account, Amount)> {
        ranking::leaderboard(self.entries())
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.journal
    }

    /// Journal entries with `seq >= seq`.
    pub fn events_since(&self, seq: u64) -> &[EventRecord] {
        let start = usize::try_from(seq).unwrap_or(usize::MAX).min(self.journal.len());
        &self.journal[start..]
    }

    pub fn asset(&self) -> &T {
        &self.asset
    }

    fn entries(&self) -> impl Iterator<Item = (&Account, Amount)> {
        self.participants.iter()
            .map(|account| (account, self.balance_of(account)))
    }

    fn set_balance(balances: &mut AccountAmountMap, account: &Account, amount: Amount) {
        if let Some(balance) = balances.get_mut(account) {
            *balance = amount;
        }
    }

    fn record(&mut self, event: LedgerEvent) {
        let seq = self.journal.len() as u64;
        self.journal.push(EventRecord { seq, at: Utc::now(), event });

        if self.needs_consistency_check() {
            self.consistency_check();
        }
    }

    fn replay(checkpoint: &Checkpoint, journal: &[EventRecord]) -> (AccountAmountMap, Amount) {
        let mut balances = checkpoint.balances.clone();
        let mut total = checkpoint.total;

        // journal entries were all applied once, so none of this can wrap
        for record in journal {
            let balance = balances.entry(record.event.account().clone()).or_insert(0);
            match &record.event {
                LedgerEvent::Deposited { amount, .. } => {
                    *balance = balance.saturating_add(*amount);
                    total = total.saturating_add(*amount);
                },
                LedgerEvent::Withdrawn { amount, .. } => {
                    *balance = balance.saturating_sub(*amount);
                    total = total.saturating_sub(*amount);
                }
            }
        }
        return (balances, total);
    }

    fn consistency_check(&mut self) {
        let since = &self.journal[self.checkpoint.applied..];
        let (balances, total) = Ledger::<T>::replay(&self.checkpoint, since);

        if balances != self.balances || total != self.total {
            error!("ledger drifted from its journal after {} events, restoring replayed balances", self.journal.len());
            self.balances = balances.clone();
            self.total = total;
        }
        self.checkpoint = Checkpoint { balances, total, applied: self.journal.len() };
    }

    fn needs_consistency_check(&self) -> bool {
        return self.consistency_check_interval > 0
            && self.journal.len() % self.consistency_check_interval == 0;
    }
}

/// Administrative controls of the in-memory token. Value only moves
/// through `deposit` and `withdraw`.
impl Ledger<InMemoryToken> {
    pub fn freeze(&mut self, account: &Account) {
        self.asset.freeze(account);
    }

    pub fn unfreeze(&mut self, account: &Account) {
        self.asset.unfreeze(account);
    }
}


#[cfg(test)]
mod tests {
    use crate::asset::{InMemoryToken, TransferError};
    use crate::core::{Account, Amount, Ledger, LedgerError, LedgerEvent};

    use rstest::{fixture, rstest};

    type TokenLedger = Ledger<InMemoryToken>;

    fn funded_token(wallets: &[(&str, Amount)]) -> InMemoryToken {
        let mut token = InMemoryToken::new();
        for (id, amount) in wallets {
            let account = Account::new(id);
            token.mint(&account, *amount).unwrap();
            token.approve(&account, *amount);
        }
        return token;
    }

    #[fixture]
    fn users() -> (Account, Account, Account, Account, Account) {
        (Account::new("bilbo"), Account::new("frodo"), Account::new("legolas"),
         Account::new("gimli"), Account::new("aragorn"))
    }

    #[fixture]
    fn ledger() -> TokenLedger {
        Ledger::new(funded_token(&[
            ("bilbo", 3000), ("frodo", 5000), ("legolas", 8000), ("gimli", 13000), ("aragorn", 21000)
        ]))
    }

    fn assert_conserved(ledger: &TokenLedger) {
        let sum: Amount = ledger.participants().iter().map(|acc| ledger.balance_of(acc)).sum();
        assert_eq!(sum, ledger.total_balance());
        assert_eq!(ledger.total_balance(), ledger.asset().custody());
    }

    #[rstest]
    fn deposit_registers_participant(mut ledger: TokenLedger, users: (Account, Account, Account, Account, Account)) {
        let (bilbo, frodo, ..) = users;

        ledger.deposit(&bilbo, 1000).unwrap();
        ledger.deposit(&frodo, 3000).unwrap();
        ledger.deposit(&bilbo, 500).unwrap();

        assert_eq!(ledger.balance_of(&bilbo), 1500);
        assert_eq!(ledger.balance_of(&frodo), 3000);
        assert_eq!(ledger.participants(), &[bilbo.clone(), frodo.clone()]);
        assert_eq!(ledger.asset().balance_of(&bilbo), 1500);
        assert_conserved(&ledger);
    }

    #[rstest]
    fn zero_deposit_rejected(mut ledger: TokenLedger, users: (Account, Account, Account, Account, Account)) {
        let (bilbo, ..) = users;

        let res = ledger.deposit(&bilbo, 0);

        assert!(matches!(res, Err(LedgerError::InvalidAmount)));
        assert!(!ledger.is_participant(&bilbo));
        assert_eq!(ledger.asset().allowance(&bilbo), 3000);
        assert!(ledger.events().is_empty());
    }

    #[rstest]
    fn failed_pull_changes_nothing(mut ledger: TokenLedger, users: (Account, Account, Account, Account, Account)) {
        let (bilbo, ..) = users;

        let res = ledger.deposit(&bilbo, 3001);

        assert!(matches!(res, Err(LedgerError::TransferFailed(TransferError::InsufficientAllowance { .. }))));
        assert!(!ledger.is_participant(&bilbo));
        assert_eq!(ledger.balance_of(&bilbo), 0);
        assert_eq!(ledger.total_balance(), 0);
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn deposit_overflow_rejected_before_transfer() {
        let whale = Account::new("whale");
        let minnow = Account::new("minnow");
        let mut token = funded_token(&[("whale", Amount::MAX)]);
        token.mint(&minnow, 1).unwrap();
        token.approve(&minnow, 1);
        let mut ledger = Ledger::new(token);

        ledger.deposit(&whale, Amount::MAX).unwrap();
        let res = ledger.deposit(&minnow, 1);

        assert!(matches!(res, Err(LedgerError::BalanceOverflow { requested: 1, total: Amount::MAX })));
        assert_eq!(ledger.asset().balance_of(&minnow), 1);
        assert!(!ledger.is_participant(&minnow));
    }

    #[rstest]
    fn withdraw_pays_out(mut ledger: TokenLedger, users: (Account, Account, Account, Account, Account)) {
        let (bilbo, frodo, ..) = users;
        ledger.deposit(&bilbo, 1000).unwrap();
        ledger.deposit(&frodo, 2000).unwrap();

        ledger.withdraw(&bilbo, 300).unwrap();
        ledger.withdraw(&frodo, 500).unwrap();

        assert_eq!(ledger.balance_of(&bilbo), 700);
        assert_eq!(ledger.balance_of(&frodo), 1500);
        assert_eq!(ledger.asset().balance_of(&bilbo), 2300);
        assert_eq!(ledger.asset().balance_of(&frodo), 3500);
        assert_eq!(ledger.asset().custody(), 2200);
        assert_conserved(&ledger);
    }

    #[rstest]
    #[case(0)]
    #[case(1000)]
    #[case(Amount::MAX)]
    fn unknown_account_any_amount(mut ledger: TokenLedger, users: (Account, Account, Account, Account, Account), #[case] amount: Amount) {
        let (bilbo, frodo, legolas, ..) = users;
        ledger.deposit(&bilbo, 1000).unwrap();
        ledger.deposit(&frodo, 1000).unwrap();

        let res = ledger.withdraw(&legolas, amount);

        assert!(matches!(res, Err(LedgerError::UnknownAccount(acc)) if acc == legolas));
        assert_conserved(&ledger);
    }

    #[rstest]
    fn withdraw_more_than_balance(mut ledger: TokenLedger, users: (Account, Account, Account, Account, Account)) {
        let (bilbo, ..) = users;
        ledger.deposit(&bilbo, 1000).unwrap();

        let res = ledger.withdraw(&bilbo, 2000);

        assert!(matches!(res, Err(LedgerError::InsufficientBalance { requested: 2000, available: 1000, .. })));
        assert_eq!(ledger.balance_of(&bilbo), 1000);
        assert_eq!(ledger.events().len(), 1);
    }

    #[rstest]
    fn zero_withdrawal_rejected(mut ledger: TokenLedger, users: (Account, Account, Account, Account, Account)) {
        let (bilbo, ..) = users;
        ledger.deposit(&bilbo, 1000).unwrap();

        let res = ledger.withdraw(&bilbo, 0);

        assert!(matches!(res, Err(LedgerError::InvalidAmount)));
        assert_eq!(ledger.events().len(), 1);
    }

    #[rstest]
    fn withdraw_to_zero_keeps_participant(mut ledger: TokenLedger, users: (Account, Account, Account, Account, Account)) {
        let (bilbo, frodo, ..) = users;
        ledger.deposit(&bilbo, 1000).unwrap();
        ledger.deposit(&frodo, 10).unwrap();

        ledger.withdraw(&bilbo, 1000).unwrap();

        assert!(ledger.is_participant(&bilbo));
        assert_eq!(ledger.balance_of(&bilbo), 0);
        assert_eq!(ledger.top_two().unwrap(), (&frodo, &bilbo));
        assert!(matches!(ledger.withdraw(&bilbo, 1), Err(LedgerError::InsufficientBalance { .. })));
    }

    #[rstest]
    fn failed_push_rolls_back(mut ledger: TokenLedger, users: (Account, Account, Account, Account, Account)) {
        let (bilbo, frodo, ..) = users;
        ledger.deposit(&bilbo, 1000).unwrap();
        ledger.deposit(&frodo, 2000).unwrap();
        ledger.freeze(&bilbo);

        let res = ledger.withdraw(&bilbo, 400);

        assert!(matches!(res, Err(LedgerError::TransferFailed(TransferError::Frozen(_)))));
        assert_eq!(ledger.balance_of(&bilbo), 1000);
        assert_eq!(ledger.total_balance(), 3000);
        assert_eq!(ledger.events().len(), 2);
        assert_conserved(&ledger);

        ledger.unfreeze(&bilbo);
        ledger.withdraw(&bilbo, 400).unwrap();
        assert_eq!(ledger.balance_of(&bilbo), 600);
    }

    #[rstest]
    fn top_two_needs_two_participants(mut ledger: TokenLedger, users: (Account, Account, Account, Account, Account)) {
        let (bilbo, ..) = users;
        assert!(matches!(ledger.top_two(), Err(LedgerError::InsufficientParticipants { count: 0 })));

        ledger.deposit(&bilbo, 3000).unwrap();
        assert!(matches!(ledger.top_two(), Err(LedgerError::InsufficientParticipants { count: 1 })));

        ledger.deposit(&bilbo, 0).unwrap_err();
        ledger.withdraw(&bilbo, 1000).unwrap();
        assert!(matches!(ledger.top_two(), Err(LedgerError::InsufficientParticipants { count: 1 })));
    }

    #[rstest]
    fn two_whales(mut ledger: TokenLedger, users: (Account, Account, Account, Account, Account)) {
        let (bilbo, frodo, legolas, gimli, aragorn) = users;
        ledger.deposit(&bilbo, 2000).unwrap();
        ledger.deposit(&frodo, 1000).unwrap();
        ledger.deposit(&legolas, 3000).unwrap();
        ledger.deposit(&gimli, 5000).unwrap();
        ledger.deposit(&aragorn, 8000).unwrap();

        assert_eq!(ledger.top_two().unwrap(), (&aragorn, &gimli));

        ledger.withdraw(&gimli, 3001).unwrap();
        ledger.withdraw(&aragorn, 6001).unwrap();
        assert_eq!(ledger.top_two().unwrap(), (&legolas, &bilbo));

        ledger.withdraw(&legolas, 1001).unwrap();
        assert_eq!(ledger.top_two().unwrap(), (&bilbo, &legolas));

        let board: Vec<_> = ledger.leaderboard().into_iter().map(|(acc, bal)| (acc.id(), bal)).collect();
        assert_eq!(board, vec![
            ("bilbo", 2000), ("legolas", 1999), ("gimli", 1999), ("aragorn", 1999), ("frodo", 1000)
        ]);
    }

    #[rstest]
    fn journal_records_successes_only(mut ledger: TokenLedger, users: (Account, Account, Account, Account, Account)) {
        let (bilbo, frodo, ..) = users;
        ledger.deposit(&bilbo, 1000).unwrap();
        ledger.withdraw(&bilbo, 5000).unwrap_err();
        ledger.withdraw(&frodo, 1).unwrap_err();
        ledger.withdraw(&bilbo, 250).unwrap();

        let events: Vec<_> = ledger.events().iter().map(|rec| (rec.seq, rec.event.clone())).collect();
        assert_eq!(events, vec![
            (0, LedgerEvent::Deposited { account: bilbo.clone(), amount: 1000 }),
            (1, LedgerEvent::Withdrawn { account: bilbo.clone(), amount: 250 }),
        ]);
        assert_eq!(ledger.events_since(1).len(), 1);
        assert!(ledger.events_since(2).is_empty());
        assert!(ledger.events_since(u64::MAX).is_empty());
    }

    #[rstest]
    fn consistency_check(users: (Account, Account, Account, Account, Account)) {
        const INTERVAL: usize = 10;
        let (bilbo, frodo, ..) = users;
        let mut ledger = Ledger::with_consistency_check_interval(
            funded_token(&[("bilbo", 100_000), ("frodo", 100_000)]), INTERVAL);

        let repeated = (INTERVAL - 1) / 2;
        for _ in 0..repeated {
            ledger.deposit(&bilbo, 60).unwrap();
            ledger.deposit(&frodo, 30).unwrap();
        }

        // before replaying the journal
        assert_eq!(ledger.balance_of(&bilbo), (repeated as Amount) * 60);
        assert_eq!(ledger.balance_of(&frodo), (repeated as Amount) * 30);

        // mess with one of the values
        *ledger.balances.get_mut(&bilbo).unwrap() += 100;
        ledger.total += 100;

        // one of these reaches the interval
        ledger.deposit(&bilbo, 60).unwrap();
        ledger.deposit(&frodo, 30).unwrap();

        // after replaying the journal
        assert_eq!(ledger.balance_of(&bilbo), ((repeated + 1) as Amount) * 60);
        assert_eq!(ledger.balance_of(&frodo), ((repeated + 1) as Amount) * 30);
        assert_conserved(&ledger);
    }

    #[rstest]
    fn replay_resumes_from_checkpoint(users: (Account, Account, Account, Account, Account)) {
        const INTERVAL: usize = 4;
        let (bilbo, frodo, ..) = users;
        let mut ledger = Ledger::with_consistency_check_interval(
            funded_token(&[("bilbo", 100_000), ("frodo", 100_000)]), INTERVAL);

        for _ in 0..INTERVAL / 2 {
            ledger.deposit(&bilbo, 60).unwrap();
            ledger.deposit(&frodo, 30).unwrap();
        }
        assert_eq!(ledger.checkpoint.applied, INTERVAL);
        assert_eq!(ledger.checkpoint.total, 180);

        // entries behind the checkpoint are not read again
        ledger.journal[0].event = LedgerEvent::Deposited { account: bilbo.clone(), amount: 1 };

        // drift after the checkpoint is still caught
        *ledger.balances.get_mut(&frodo).unwrap() += 7;
        ledger.total += 7;

        ledger.deposit(&bilbo, 60).unwrap();
        ledger.withdraw(&frodo, 10).unwrap();
        ledger.deposit(&bilbo, 60).unwrap();
        ledger.withdraw(&bilbo, 20).unwrap();

        assert_eq!(ledger.checkpoint.applied, 2 * INTERVAL);
        assert_eq!(ledger.balance_of(&bilbo), 220);
        assert_eq!(ledger.balance_of(&frodo), 50);
        assert_eq!(ledger.checkpoint.total, 270);
        assert_conserved(&ledger);
    }
}
