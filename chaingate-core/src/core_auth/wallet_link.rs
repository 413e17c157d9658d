//! Linked-wallet resolution
//!
//! Wallets can be cryptographically linked to a root identity wallet;
//! entitlement checks consider the whole union. The resolver never returns an
//! empty set — a wallet with no links is linked to itself — and the root key
//! is always part of a successful resolution.

use alloy_primitives::Address;
use async_trait::async_trait;
use tracing::debug;

use crate::core_chain::ChainError;

/// Read surface of the wallet-link contract
#[async_trait]
pub trait WalletLinkContract: Send + Sync {
    /// The root key a wallet is linked under; zero address when unlinked
    async fn get_root_key_for_wallet(&self, wallet: Address) -> Result<Address, ChainError>;

    /// All wallets linked under a root key
    async fn get_wallets_by_root_key(&self, root_key: Address)
        -> Result<Vec<Address>, ChainError>;
}

/// Resolve the full linked-wallet set for a wallet.
pub async fn resolve_linked_wallets(
    contract: &dyn WalletLinkContract,
    wallet: Address,
) -> Result<Vec<Address>, ChainError> {
    let root_key = contract.get_root_key_for_wallet(wallet).await?;
    let root_key = if root_key == Address::ZERO {
        // unlinked wallets are their own root
        wallet
    } else {
        root_key
    };

    let mut wallets = contract.get_wallets_by_root_key(root_key).await?;
    if wallets.is_empty() {
        debug!(wallet = %wallet, "wallet has no linked wallets, using it as a singleton set");
        return Ok(vec![wallet]);
    }

    if !wallets.contains(&root_key) {
        wallets.push(root_key);
    }
    Ok(wallets)
}
