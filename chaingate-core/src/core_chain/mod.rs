//! Per-chain blockchain client access
//!
//! The entitlement engine only ever *reads* chain state: token balances and
//! custom entitlement contract queries. This module defines the read-client
//! trait and the pool that maps a chain id to a configured client. Concrete
//! RPC transports (ABI encoding, HTTP/WS providers) live outside this crate
//! and are plugged in through [`ChainClient`].

mod client;
mod pool;

pub use client::{ChainClient, ChainError};
pub use pool::BlockchainClientPool;
