//! chaingate-core — on-chain entitlement evaluation engine
//!
//! Decides whether a principal (a wallet, possibly one of several linked to a
//! root identity) holds a requested permission on a space or channel, by
//! consulting smart-contract state across one or more chains. Decisions are
//! cached with asymmetric positive/negative lifetimes, and compound
//! entitlement rules (boolean trees of token-balance and custom checks) are
//! evaluated concurrently with aggressive short-circuiting and cancellation.

pub mod config;
pub mod core_auth;
pub mod core_cache;
pub mod core_chain;
pub mod core_entitlement;
pub mod logging;
pub mod metrics;

pub use config::{AuthConfig, CacheConfig, ChainsConfig, Config, ConfigError};
pub use core_auth::{
    AuthError, AuthResult, ChainAuth, ChainAuthArgs, ChainAuthKind, ChannelId, Entitlement,
    EntitlementSnapshot, Permission, SpaceContract, SpaceId, WalletLinkContract, EVERYONE,
};
pub use core_cache::{CacheResult, EntitlementCache};
pub use core_chain::{BlockchainClientPool, ChainClient, ChainError};
pub use core_entitlement::{
    CheckOperation, CheckType, EntitlementError, Operation, RuleData, RuleEvaluator,
};
pub use logging::{init_logging, init_logging_with_config, LogLevel};
