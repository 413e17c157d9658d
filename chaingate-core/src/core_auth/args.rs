//! Normalized check arguments — the cache key for entitlement decisions

use alloy_primitives::Address;
use std::fmt;

use super::types::{ChannelId, Permission, SpaceId};

/// What kind of decision is being made.
///
/// `SpaceEnabled`/`ChannelEnabled` never enter through the public surface;
/// they key the cached resource-gate lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainAuthKind {
    Space,
    Channel,
    SpaceEnabled,
    ChannelEnabled,
    IsSpaceMember,
}

/// Arguments for one entitlement check, normalized into a pure value usable
/// as a cache key. Equality is field-wise; the linked-wallet set is flattened
/// into a sorted lowercase-hex digest so that equal wallet sets always
/// produce equal keys, independent of resolver enumeration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainAuthArgs {
    pub kind: ChainAuthKind,
    pub space_id: SpaceId,
    pub channel_id: Option<ChannelId>,
    pub principal: Address,
    pub permission: Permission,
    linked_wallets: String,
}

impl ChainAuthArgs {
    pub fn for_space(space_id: SpaceId, principal: Address, permission: Permission) -> Self {
        Self {
            kind: ChainAuthKind::Space,
            space_id,
            channel_id: None,
            principal,
            permission,
            linked_wallets: String::new(),
        }
    }

    pub fn for_channel(
        space_id: SpaceId,
        channel_id: ChannelId,
        principal: Address,
        permission: Permission,
    ) -> Self {
        Self {
            kind: ChainAuthKind::Channel,
            space_id,
            channel_id: Some(channel_id),
            principal,
            permission,
            linked_wallets: String::new(),
        }
    }

    pub fn for_is_space_member(space_id: SpaceId, principal: Address) -> Self {
        Self {
            kind: ChainAuthKind::IsSpaceMember,
            space_id,
            channel_id: None,
            principal,
            permission: Permission::Undefined,
            linked_wallets: String::new(),
        }
    }

    pub(crate) fn for_enabled_space(space_id: SpaceId) -> Self {
        Self {
            kind: ChainAuthKind::SpaceEnabled,
            space_id,
            channel_id: None,
            principal: Address::ZERO,
            permission: Permission::Undefined,
            linked_wallets: String::new(),
        }
    }

    pub(crate) fn for_enabled_channel(space_id: SpaceId, channel_id: ChannelId) -> Self {
        Self {
            kind: ChainAuthKind::ChannelEnabled,
            space_id,
            channel_id: Some(channel_id),
            principal: Address::ZERO,
            permission: Permission::Undefined,
            linked_wallets: String::new(),
        }
    }

    /// Re-key the args with the resolved linked-wallet set so cache entries
    /// are never shared across different linked-wallet contexts.
    pub fn with_linked_wallets(&self, wallets: &[Address]) -> Self {
        let mut hex_wallets: Vec<String> =
            wallets.iter().map(|wallet| format!("{:#x}", wallet)).collect();
        hex_wallets.sort();

        let mut ret = self.clone();
        ret.linked_wallets = hex_wallets.join(",");
        ret
    }

    /// Parse the digest back into addresses.
    pub(crate) fn linked_wallets(&self) -> Vec<Address> {
        if self.linked_wallets.is_empty() {
            return Vec::new();
        }
        self.linked_wallets
            .split(',')
            .filter_map(|hex_wallet| hex_wallet.parse().ok())
            .collect()
    }
}

impl fmt::Display for ChainAuthArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ChainAuthArgs{{kind: {:?}, space_id: {}, channel_id: {}, principal: {:#x}, permission: {}, linked_wallets: {}}}",
            self.kind,
            self.space_id,
            self.channel_id.map(|id| id.to_string()).unwrap_or_default(),
            self.principal,
            self.permission,
            self.linked_wallets,
        )
    }
}
