//! Error types for chain authorization

use std::time::Duration;

use alloy_primitives::Address;
use thiserror::Error;

use super::types::{ChannelId, Permission, SpaceId};
use crate::core_chain::ChainError;
use crate::core_entitlement::EntitlementError;

/// Result type for chain authorization
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors from an entitlement decision.
///
/// Denials (`PermissionDenied`, `SpaceDisabled`, `ChannelDisabled`) are
/// terminal answers; everything else means the engine could not determine
/// entitlement and is a candidate for retry upstream. Use [`AuthError::is_denial`]
/// to tell them apart.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The principal is not entitled to the requested permission
    #[error("{principal:#x} is not entitled to {permission} on space {space_id}")]
    PermissionDenied {
        space_id: SpaceId,
        channel_id: Option<ChannelId>,
        principal: Address,
        permission: Permission,
    },

    /// The space is administratively disabled
    #[error("Space {space_id} is disabled")]
    SpaceDisabled { space_id: SpaceId },

    /// The channel is administratively disabled
    #[error("Channel {channel_id} in space {space_id} is disabled")]
    ChannelDisabled { space_id: SpaceId, channel_id: ChannelId },

    /// The linked-wallet union exceeds the configured evaluation cap
    #[error("Too many linked wallets: {count} exceeds the limit of {limit}")]
    TooManyLinkedWallets { count: usize, limit: usize },

    /// The overall per-evaluation deadline expired
    #[error("Entitlement check timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// The check arguments are internally inconsistent
    #[error("Invalid chain auth arguments: {0}")]
    InvalidArgs(String),

    /// A space or wallet-link contract call failed
    #[error("Contract call failed: {0}")]
    Contract(#[from] ChainError),

    /// Rule-tree evaluation failed
    #[error("Rule evaluation failed: {0}")]
    Evaluation(#[from] EntitlementError),
}

impl AuthError {
    /// `true` for final denials, `false` for could-not-determine conditions.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            AuthError::PermissionDenied { .. }
                | AuthError::SpaceDisabled { .. }
                | AuthError::ChannelDisabled { .. }
        )
    }
}
