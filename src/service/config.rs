use std::{fs, path::Path, collections::BTreeMap};
use serde::{Serialize, Deserialize};
use anyhow::{self, Context};

use crate::asset::InMemoryToken;
use crate::core::{Account, Amount, Ledger};
use crate::service::VaultService;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub symbol: String
}

impl Default for AssetConfig {
    fn default() -> Self {
        AssetConfig { symbol: String::from("ANY") }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub consistency_check_interval: usize
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig { consistency_check_interval: Ledger::<InMemoryToken>::DEFAULT_CONSISTENCY_CHECK_INTERVAL }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub event_buffer: usize
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig { event_buffer: VaultService::<InMemoryToken>::DEFAULT_EVENT_BUFFER }
    }
}

/// Starting wallet balances, each fully approved for the vault.
type WalletsById = BTreeMap<String, Amount>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub asset: AssetConfig,
    pub ledger: LedgerConfig,
    pub service: ServiceConfig,
    pub wallets: WalletsById
}

impl VaultConfig {
    pub fn read(filepath: impl AsRef<Path>) -> anyhow::Result<Self> {
        let filepath = filepath.as_ref();
        let file_content = fs::read_to_string(filepath)
            .with_context(|| format!("failed to read config file {}", filepath.display()))?;
        return VaultConfig::parse(&file_content);
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: VaultConfig = toml::from_str(content)
            .with_context(|| "failed to parse config file")?;
        config.validate()
            .with_context(|| "invalid config file")?;
        return Ok(config);
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let max_buffer = VaultService::<InMemoryToken>::MAX_EVENT_BUFFER;
        anyhow::ensure!(
            (1..=max_buffer).contains(&self.service.event_buffer),
            "service.event_buffer must be between 1 and {}, got {}", max_buffer, self.service.event_buffer
        );
        return Ok(());
    }

    pub fn build_token(&self) -> anyhow::Result<InMemoryToken> {
        let mut token = InMemoryToken::new();
        for (id, amount) in &self.wallets {
            let account = Account::new(id);
            token.mint(&account, *amount)
                .with_context(|| format!("failed to mint wallet {}", id))?;
            token.approve(&account, *amount);
        }
        return Ok(token);
    }

    pub fn build_service(&self) -> anyhow::Result<VaultService<InMemoryToken>> {
        self.validate()?;
        let ledger = Ledger::with_consistency_check_interval(
            self.build_token()?, self.ledger.consistency_check_interval);
        return Ok(VaultService::new(ledger, self.service.event_buffer));
    }
}
