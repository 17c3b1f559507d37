use std::{fs, path::Path};

use anyhow::{self, Context};
use colored::Colorize;
use serde::{Serialize, Deserialize};

use crate::asset::AssetTransfer;
use crate::core::{Account, Amount, LedgerError};
use crate::service::VaultService;

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Deposit { account: Account, amount: Amount },
    Withdraw { account: Account, amount: Amount },
    BalanceOf { account: Account },
    TopTwo
}

impl Operation {
    pub async fn apply<T: AssetTransfer>(&self, service: &VaultService<T>) -> Outcome {
        let result = match self {
            Self::Deposit { account, amount } =>
                service.deposit(account, *amount).await.map(|_| Outcome::Applied),
            Self::Withdraw { account, amount } =>
                service.withdraw(account, *amount).await.map(|_| Outcome::Applied),
            Self::BalanceOf { account } =>
                Ok(Outcome::Balance(service.balance_of(account).await)),
            Self::TopTwo =>
                service.top_two().await.map(|(first, second)| Outcome::TopTwo(first, second))
        };
        return result.unwrap_or_else(Outcome::Failed);
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deposit { account, amount } => write!(f, "deposit {} from {}", amount, account),
            Self::Withdraw { account, amount } => write!(f, "withdraw {} to {}", amount, account),
            Self::BalanceOf { account } => write!(f, "balance of {}", account),
            Self::TopTwo => write!(f, "top two")
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Applied,
    Balance(Amount),
    TopTwo(Account, Account),
    Failed(LedgerError)
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Applied => write!(f, "{}", "ok".green()),
            Self::Balance(amount) => write!(f, "{}", amount),
            Self::TopTwo(first, second) => write!(f, "{}, {}", first.to_string().bold(), second),
            Self::Failed(err) => write!(f, "{}", err.to_string().bright_red())
        }
    }
}

/// Operations replayed in order against a vault. A failing step is
/// reported and the run carries on.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Script {
    pub operations: Vec<Operation>
}

impl Script {
    pub fn read(filepath: impl AsRef<Path>) -> anyhow::Result<Self> {
        let filepath = filepath.as_ref();
        let file = fs::File::open(filepath)
            .with_context(|| format!("failed to open script {}", filepath.display()))?;
        let script = serde_json::from_reader(file)
            .with_context(|| "failed to parse script")?;
        return Ok(script);
    }

    pub async fn run<T: AssetTransfer>(&self, service: &VaultService<T>) -> Vec<Outcome> {
        let mut outcomes = Vec::with_capacity(self.operations.len());
        for operation in &self.operations {
            outcomes.push(operation.apply(service).await);
        }
        return outcomes;
    }
}
