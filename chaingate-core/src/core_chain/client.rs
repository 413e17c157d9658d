//! Read-only chain client trait and transport errors

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use thiserror::Error;

/// Errors from talking to a blockchain
#[derive(Debug, Error, Clone)]
pub enum ChainError {
    /// The chain id has no configured client
    #[error("Chain {0} is not configured")]
    UnknownChain(u64),

    /// RPC transport failure (connection, timeout, node error)
    #[error("RPC call failed: {0}")]
    Rpc(String),

    /// The contract call itself failed (revert, bad address)
    #[error("Contract call failed: {0}")]
    Contract(String),
}

/// Read-capable client for a single chain.
///
/// One implementation per transport; the pool hands out `Arc<dyn ChainClient>`
/// per chain id. All calls are plain request/response queries against the
/// chain's current state.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// ERC-20 `balanceOf(wallet)` on the given token contract.
    ///
    /// The balance is returned in the token's base units (scaled by the
    /// token's decimals), matching what thresholds are expressed in.
    async fn erc20_balance_of(&self, contract: Address, wallet: Address)
        -> Result<U256, ChainError>;

    /// ERC-721 `balanceOf(wallet)` on the given NFT contract.
    async fn erc721_balance_of(&self, contract: Address, wallet: Address)
        -> Result<U256, ChainError>;

    /// Custom entitlement contract `isEntitled(wallets)` query.
    async fn is_entitled(&self, contract: Address, wallets: &[Address])
        -> Result<bool, ChainError>;
}
