//! Space contract query surface
//!
//! The orchestrator consumes the space's on-chain state through this trait;
//! the concrete diamond/facet bindings live outside the crate.

use alloy_primitives::Address;
use async_trait::async_trait;

use super::types::{ChannelId, Permission, SpaceId};
use crate::core_cache::CacheResult;
use crate::core_chain::ChainError;
use crate::core_entitlement::RuleData;

/// Sentinel address granting a user entitlement to everyone
pub const EVERYONE: Address = Address::with_last_byte(1);

/// One entitlement attached to a space permission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entitlement {
    /// Allow-list of wallet addresses; [`EVERYONE`] opens it to all
    User { users: Vec<Address> },
    /// Boolean rule tree over on-chain checks
    Rule { rule_data: RuleData },
}

/// A space's entitlement configuration for one permission, fetched and cached
/// as a unit because it is expensive and shared by every principal checking
/// that permission.
#[derive(Debug, Clone)]
pub struct EntitlementSnapshot {
    pub owner: Address,
    pub entitlements: Vec<Entitlement>,
}

// Snapshots only reach the cache when the fetch succeeded, so they always
// take the long-lived positive partition.
impl CacheResult for EntitlementSnapshot {
    fn is_allowed(&self) -> bool {
        true
    }
}

/// Read surface of the space management contract
#[async_trait]
pub trait SpaceContract: Send + Sync {
    /// Administrative disabled flag for the whole space
    async fn is_space_disabled(&self, space_id: SpaceId) -> Result<bool, ChainError>;

    /// Administrative disabled flag for one channel
    async fn is_channel_disabled(
        &self,
        space_id: SpaceId,
        channel_id: ChannelId,
    ) -> Result<bool, ChainError>;

    /// Space membership of a single wallet
    async fn is_member(&self, space_id: SpaceId, wallet: Address) -> Result<bool, ChainError>;

    /// Whether any of the wallets is banned from the space
    async fn is_banned(&self, space_id: SpaceId, wallets: &[Address]) -> Result<bool, ChainError>;

    /// Channel-level entitlement of a single wallet, evaluated on-chain
    async fn is_entitled_to_channel(
        &self,
        space_id: SpaceId,
        channel_id: ChannelId,
        wallet: Address,
        permission: Permission,
    ) -> Result<bool, ChainError>;

    /// The space's entitlement configuration for one permission
    async fn get_space_entitlements_for_permission(
        &self,
        space_id: SpaceId,
        permission: Permission,
    ) -> Result<EntitlementSnapshot, ChainError>;
}
