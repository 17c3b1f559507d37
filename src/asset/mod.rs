mod interface;
mod memory_token;

pub use interface::{AssetTransfer, TransferError};
pub use memory_token::InMemoryToken;
