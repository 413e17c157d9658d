//! Chain authorization
//!
//! The decision procedure for "is this principal entitled to this permission
//! on this resource": cached at the top, gated on the resource's enabled
//! flag, membership-checked across the principal's linked wallets, and
//! finally settled by user-list or rule-tree entitlement evaluation.

mod args;
mod chain_auth;
mod error;
mod space_contract;
mod types;
mod wallet_link;

#[cfg(test)]
mod tests;

pub use args::{ChainAuthArgs, ChainAuthKind};
pub use chain_auth::ChainAuth;
pub use error::{AuthError, AuthResult};
pub use space_contract::{Entitlement, EntitlementSnapshot, SpaceContract, EVERYONE};
pub use types::{ChannelId, Permission, SpaceId};
pub use wallet_link::{resolve_linked_wallets, WalletLinkContract};
