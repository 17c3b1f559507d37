mod vault_service;
pub mod config;
pub mod script;

pub use vault_service::VaultService;
pub use config::VaultConfig;
pub use script::{Operation, Outcome, Script};
