//! Configuration management for chaingate
//!
//! Explicit configuration structs threaded into constructors — no mutable
//! globals — so independently tuned instances (the two entitlement caches in
//! particular) can coexist and be tested in isolation. Supports defaults,
//! environment overrides, TOML files, and validation.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

mod error;

pub use error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Authorization engine configuration
    pub auth: AuthConfig,

    /// Configured chains
    pub chains: ChainsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Tuning for one dual-partition entitlement cache instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum entries in the positive partition
    pub positive_size: usize,

    /// Maximum entries in the negative partition
    pub negative_size: usize,

    /// How long a positive (allowed) result stays valid
    #[serde(with = "humantime_serde")]
    pub positive_ttl: Duration,

    /// How long a negative (denied) result stays valid; kept near one block
    /// interval because denials flip as soon as chain state changes
    #[serde(with = "humantime_serde")]
    pub negative_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            positive_size: 10_000,
            negative_size: 10_000,
            positive_ttl: Duration::from_secs(15 * 60),
            negative_ttl: Duration::from_secs(2),
        }
    }
}

impl CacheConfig {
    /// Defaults for the entitlement-manager cache, which stores the expensive
    /// space-entitlement snapshots: same sizes, much shorter positive TTL so
    /// entitlement edits show up quickly.
    pub fn manager_default() -> Self {
        Self {
            positive_ttl: Duration::from_secs(15),
            ..Self::default()
        }
    }
}

/// Authorization engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Maximum linked wallets evaluated per request; exceeding it fails the
    /// check rather than truncating
    pub linked_wallets_limit: usize,

    /// Overall deadline for one entitlement evaluation, covering every
    /// contract call it fans out
    #[serde(with = "humantime_serde")]
    pub contract_calls_timeout: Duration,

    /// Primary decision cache
    pub entitlement_cache: CacheConfig,

    /// Space-entitlement snapshot cache
    pub entitlement_manager_cache: CacheConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            linked_wallets_limit: 10,
            contract_calls_timeout: Duration::from_millis(5000),
            entitlement_cache: CacheConfig::default(),
            entitlement_manager_cache: CacheConfig::manager_default(),
        }
    }
}

/// One configured chain endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainEndpoint {
    /// EVM chain id
    pub chain_id: u64,

    /// RPC URL for a read-capable node
    pub rpc_url: String,
}

/// The set of chains rule-tree checks may reference
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainsConfig {
    pub chains: Vec<ChainEndpoint>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include timestamps
    pub with_timestamp: bool,

    /// Include target module
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamp: true,
            with_target: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables follow the pattern: CHAINGATE_<SECTION>_<KEY>
    /// Example: CHAINGATE_AUTH_LINKED_WALLETS_LIMIT=16
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(limit) = env::var("CHAINGATE_AUTH_LINKED_WALLETS_LIMIT") {
            config.auth.linked_wallets_limit = limit.parse().map_err(|e| {
                ConfigError::InvalidValue(format!("Invalid linked wallets limit: {}", e))
            })?;
        }
        if let Ok(timeout_ms) = env::var("CHAINGATE_AUTH_CONTRACT_CALLS_TIMEOUT_MS") {
            let ms: u64 = timeout_ms.parse().map_err(|e| {
                ConfigError::InvalidValue(format!("Invalid contract calls timeout: {}", e))
            })?;
            config.auth.contract_calls_timeout = Duration::from_millis(ms);
        }
        if let Ok(ttl_secs) = env::var("CHAINGATE_CACHE_POSITIVE_TTL_SECS") {
            let secs: u64 = ttl_secs.parse().map_err(|e| {
                ConfigError::InvalidValue(format!("Invalid positive cache TTL: {}", e))
            })?;
            config.auth.entitlement_cache.positive_ttl = Duration::from_secs(secs);
        }
        if let Ok(ttl_secs) = env::var("CHAINGATE_CACHE_NEGATIVE_TTL_SECS") {
            let secs: u64 = ttl_secs.parse().map_err(|e| {
                ConfigError::InvalidValue(format!("Invalid negative cache TTL: {}", e))
            })?;
            config.auth.entitlement_cache.negative_ttl = Duration::from_secs(secs);
        }

        if let Ok(level) = env::var("CHAINGATE_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(json) = env::var("CHAINGATE_LOG_JSON") {
            config.logging.json_format = json
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid JSON flag: {}", e)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError(e.to_string()))?;

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.linked_wallets_limit == 0 {
            return Err(ConfigError::ValidationFailed(
                "linked_wallets_limit must be positive".to_string(),
            ));
        }
        if self.auth.contract_calls_timeout.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "contract_calls_timeout must be positive".to_string(),
            ));
        }
        for cache in [
            &self.auth.entitlement_cache,
            &self.auth.entitlement_manager_cache,
        ] {
            if cache.positive_size == 0 || cache.negative_size == 0 {
                return Err(ConfigError::ValidationFailed(
                    "cache partition sizes must be positive".to_string(),
                ));
            }
            if cache.positive_ttl.is_zero() || cache.negative_ttl.is_zero() {
                return Err(ConfigError::ValidationFailed(
                    "cache TTLs must be positive".to_string(),
                ));
            }
        }

        let mut seen = std::collections::HashSet::new();
        for chain in &self.chains.chains {
            if chain.rpc_url.is_empty() {
                return Err(ConfigError::ValidationFailed(format!(
                    "chain {} has an empty RPC URL",
                    chain.chain_id
                )));
            }
            if !seen.insert(chain.chain_id) {
                return Err(ConfigError::ValidationFailed(format!(
                    "chain {} is configured twice",
                    chain.chain_id
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_constants() {
        let auth = AuthConfig::default();
        assert_eq!(auth.linked_wallets_limit, 10);
        assert_eq!(auth.contract_calls_timeout, Duration::from_millis(5000));
        assert_eq!(auth.entitlement_cache.positive_ttl, Duration::from_secs(900));
        assert_eq!(auth.entitlement_cache.negative_ttl, Duration::from_secs(2));
        assert_eq!(
            auth.entitlement_manager_cache.positive_ttl,
            Duration::from_secs(15)
        );
        assert_eq!(
            auth.entitlement_manager_cache.negative_ttl,
            Duration::from_secs(2)
        );
        assert_eq!(auth.entitlement_cache.positive_size, 10_000);
    }

    #[test]
    fn test_zero_wallet_limit_rejected() {
        let mut config = Config::default();
        config.auth.linked_wallets_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_chain_rejected() {
        let mut config = Config::default();
        config.chains.chains = vec![
            ChainEndpoint { chain_id: 1, rpc_url: "http://localhost:8545".to_string() },
            ChainEndpoint { chain_id: 1, rpc_url: "http://localhost:8546".to_string() },
        ];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let encoded = toml::to_string(&config).unwrap();
        let decoded: Config = toml::from_str(&encoded).unwrap();
        assert_eq!(
            decoded.auth.contract_calls_timeout,
            config.auth.contract_calls_timeout
        );
        assert_eq!(decoded.logging.level, config.logging.level);
    }
}
