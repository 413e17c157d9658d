//! Mock contracts and fixtures for chain authorization tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use crate::config::AuthConfig;
use crate::core_auth::{
    ChainAuth, ChannelId, Entitlement, EntitlementSnapshot, Permission, SpaceContract, SpaceId,
    WalletLinkContract,
};
use crate::core_chain::{BlockchainClientPool, ChainClient, ChainError};
use crate::core_entitlement::{
    CheckOperation, CheckType, EncodedOperation, LogicalOperation, LogicalType, OperationType,
    RuleData, RuleEvaluator,
};

pub fn wallet(byte: u8) -> Address {
    Address::with_last_byte(byte)
}

pub fn space(byte: u8) -> SpaceId {
    SpaceId::from_bytes([byte; 32])
}

pub fn channel(byte: u8) -> ChannelId {
    ChannelId::from_bytes([byte; 32])
}

/// Configurable in-memory space contract
#[derive(Default)]
pub struct MockSpaceContract {
    pub disabled_spaces: HashSet<SpaceId>,
    pub disabled_channels: HashSet<(SpaceId, ChannelId)>,
    pub members: HashSet<(SpaceId, Address)>,
    pub banned: HashSet<(SpaceId, Address)>,
    pub owners: HashMap<SpaceId, Address>,
    pub snapshots: HashMap<(SpaceId, Permission), EntitlementSnapshot>,
    pub channel_entitled: HashSet<(SpaceId, ChannelId, Address)>,

    /// Wallets whose membership lookups fail at the RPC layer
    pub membership_failures: HashSet<Address>,
    /// Wallets whose channel entitlement lookups fail at the RPC layer
    pub channel_failures: HashSet<Address>,
    /// Spaces whose disabled-flag lookups fail at the RPC layer
    pub gate_failures: HashSet<SpaceId>,
    /// Artificial latency applied to every membership lookup
    pub member_delay: Option<Duration>,

    pub membership_calls: AtomicUsize,
    pub snapshot_fetches: AtomicUsize,
}

impl MockSpaceContract {
    pub fn with_member(mut self, space_id: SpaceId, member: Address) -> Self {
        self.members.insert((space_id, member));
        self
    }

    pub fn with_owner(mut self, space_id: SpaceId, owner: Address) -> Self {
        self.owners.insert(space_id, owner);
        self
    }

    pub fn with_snapshot(
        mut self,
        space_id: SpaceId,
        permission: Permission,
        entitlements: Vec<Entitlement>,
    ) -> Self {
        let owner = self.owners.get(&space_id).copied().unwrap_or(Address::ZERO);
        self.snapshots
            .insert((space_id, permission), EntitlementSnapshot { owner, entitlements });
        self
    }
}

#[async_trait]
impl SpaceContract for MockSpaceContract {
    async fn is_space_disabled(&self, space_id: SpaceId) -> Result<bool, ChainError> {
        if self.gate_failures.contains(&space_id) {
            return Err(ChainError::Rpc("gate lookup failed".to_string()));
        }
        Ok(self.disabled_spaces.contains(&space_id))
    }

    async fn is_channel_disabled(
        &self,
        space_id: SpaceId,
        channel_id: ChannelId,
    ) -> Result<bool, ChainError> {
        Ok(self.disabled_channels.contains(&(space_id, channel_id)))
    }

    async fn is_member(&self, space_id: SpaceId, wallet: Address) -> Result<bool, ChainError> {
        if let Some(delay) = self.member_delay {
            tokio::time::sleep(delay).await;
        }
        self.membership_calls.fetch_add(1, Ordering::SeqCst);
        if self.membership_failures.contains(&wallet) {
            return Err(ChainError::Rpc("membership lookup failed".to_string()));
        }
        Ok(self.members.contains(&(space_id, wallet)))
    }

    async fn is_banned(&self, space_id: SpaceId, wallets: &[Address]) -> Result<bool, ChainError> {
        Ok(wallets
            .iter()
            .any(|wallet| self.banned.contains(&(space_id, *wallet))))
    }

    async fn is_entitled_to_channel(
        &self,
        space_id: SpaceId,
        channel_id: ChannelId,
        wallet: Address,
        _permission: Permission,
    ) -> Result<bool, ChainError> {
        if self.channel_failures.contains(&wallet) {
            return Err(ChainError::Rpc("channel entitlement lookup failed".to_string()));
        }
        Ok(self.channel_entitled.contains(&(space_id, channel_id, wallet)))
    }

    async fn get_space_entitlements_for_permission(
        &self,
        space_id: SpaceId,
        permission: Permission,
    ) -> Result<EntitlementSnapshot, ChainError> {
        self.snapshot_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .snapshots
            .get(&(space_id, permission))
            .cloned()
            .unwrap_or(EntitlementSnapshot {
                owner: self.owners.get(&space_id).copied().unwrap_or(Address::ZERO),
                entitlements: vec![],
            }))
    }
}

/// Configurable in-memory wallet-link contract
#[derive(Default)]
pub struct MockWalletLink {
    pub root_keys: HashMap<Address, Address>,
    pub linked: HashMap<Address, Vec<Address>>,
    pub fail: bool,
}

impl MockWalletLink {
    /// Link a set of wallets under a root key.
    pub fn with_link(mut self, root: Address, wallets: Vec<Address>) -> Self {
        for linked_wallet in &wallets {
            self.root_keys.insert(*linked_wallet, root);
        }
        self.linked.insert(root, wallets);
        self
    }
}

#[async_trait]
impl WalletLinkContract for MockWalletLink {
    async fn get_root_key_for_wallet(&self, wallet: Address) -> Result<Address, ChainError> {
        if self.fail {
            return Err(ChainError::Rpc("wallet link lookup failed".to_string()));
        }
        Ok(self.root_keys.get(&wallet).copied().unwrap_or(Address::ZERO))
    }

    async fn get_wallets_by_root_key(
        &self,
        root_key: Address,
    ) -> Result<Vec<Address>, ChainError> {
        if self.fail {
            return Err(ChainError::Rpc("wallet link lookup failed".to_string()));
        }
        Ok(self.linked.get(&root_key).cloned().unwrap_or_default())
    }
}

/// Chain client with a fixed balance per wallet, shared by ERC-20 and ERC-721
pub struct BalanceClient {
    pub balances: HashMap<Address, u64>,
}

impl BalanceClient {
    pub fn new(balances: &[(Address, u64)]) -> Arc<Self> {
        Arc::new(Self { balances: balances.iter().copied().collect() })
    }
}

#[async_trait]
impl ChainClient for BalanceClient {
    async fn erc20_balance_of(
        &self,
        _contract: Address,
        wallet: Address,
    ) -> Result<U256, ChainError> {
        Ok(U256::from(self.balances.get(&wallet).copied().unwrap_or(0)))
    }

    async fn erc721_balance_of(
        &self,
        contract: Address,
        wallet: Address,
    ) -> Result<U256, ChainError> {
        self.erc20_balance_of(contract, wallet).await
    }

    async fn is_entitled(
        &self,
        _contract: Address,
        _wallets: &[Address],
    ) -> Result<bool, ChainError> {
        Ok(false)
    }
}

pub fn erc721_check(chain_id: u64, threshold: u64) -> CheckOperation {
    CheckOperation {
        check_type: CheckType::Erc721,
        chain_id,
        contract_address: Address::with_last_byte(0xCC),
        threshold: U256::from(threshold),
    }
}

/// `left OR right` in the flat post-order wire encoding
pub fn or_rule(left: CheckOperation, right: CheckOperation) -> RuleData {
    RuleData {
        operations: vec![
            EncodedOperation { op_type: OperationType::Check, index: 0 },
            EncodedOperation { op_type: OperationType::Check, index: 1 },
            EncodedOperation { op_type: OperationType::Logical, index: 0 },
        ],
        check_operations: vec![left, right],
        logical_operations: vec![LogicalOperation { logical_type: LogicalType::Or }],
    }
}

/// Assemble a `ChainAuth` over mock contracts and an optional client pool.
pub fn auth(
    space_contract: Arc<MockSpaceContract>,
    wallet_link: Arc<MockWalletLink>,
    pool: BlockchainClientPool,
    config: &AuthConfig,
) -> ChainAuth {
    ChainAuth::new(
        space_contract,
        wallet_link,
        Arc::new(RuleEvaluator::new(Arc::new(pool))),
        config,
    )
}
