//! Chain authorization orchestrator
//!
//! `ChainAuth::is_entitled` algorithm
//! =================================
//! 1. If this check was performed recently, the cached decision is returned.
//! 2. The space (or channel) must not be administratively disabled; the
//!    enabled flag is itself cached. A disabled resource is a definite
//!    negative, not an error.
//! 3. All linked wallets for the principal are resolved.
//! 4. Every linked wallet is checked for space membership concurrently; one
//!    member is enough. A principal with no member wallet is denied without
//!    consulting entitlement data.
//! 5. If the linked-wallet union exceeds the configured cap, the check fails
//!    closed.
//! 6a. For spaces: the owner is entitled unconditionally; banned principals
//!     are denied; otherwise user-list entitlements are checked per wallet
//!     and rule entitlements are evaluated once per rule tree over the whole
//!     union, all concurrently, first positive result wins.
//! 6b. For channels: the space contract's channel entitlement is queried per
//!     wallet concurrently, first positive result wins.
//!
//! Every fan-out shares one cancellation token derived from the evaluation's
//! deadline; the first winning result (or first surfaced error) cancels all
//! in-flight and not-yet-started work in the group.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::args::{ChainAuthArgs, ChainAuthKind};
use super::error::{AuthError, AuthResult};
use super::space_contract::{Entitlement, EntitlementSnapshot, SpaceContract, EVERYONE};
use super::types::{ChannelId, SpaceId};
use super::wallet_link::{resolve_linked_wallets, WalletLinkContract};
use crate::config::AuthConfig;
use crate::core_cache::EntitlementCache;
use crate::core_entitlement::{RuleData, RuleEvaluator};
use crate::metrics;

/// The top-level entitlement decision procedure.
pub struct ChainAuth {
    space_contract: Arc<dyn SpaceContract>,
    wallet_link: Arc<dyn WalletLinkContract>,
    evaluator: Arc<RuleEvaluator>,
    linked_wallets_limit: usize,
    contract_calls_timeout: Duration,
    entitlement_cache: EntitlementCache<ChainAuthArgs, bool>,
    // separate cache for the entitlement manager snapshots, tuned with a much
    // shorter positive TTL
    entitlement_manager_cache: EntitlementCache<ChainAuthArgs, EntitlementSnapshot>,
}

impl ChainAuth {
    pub fn new(
        space_contract: Arc<dyn SpaceContract>,
        wallet_link: Arc<dyn WalletLinkContract>,
        evaluator: Arc<RuleEvaluator>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            space_contract,
            wallet_link,
            evaluator,
            linked_wallets_limit: config.linked_wallets_limit,
            contract_calls_timeout: config.contract_calls_timeout,
            entitlement_cache: EntitlementCache::new(&config.entitlement_cache),
            entitlement_manager_cache: EntitlementCache::new(&config.entitlement_manager_cache),
        }
    }

    /// Decide entitlement. `Ok(())` iff the principal is entitled; a denied
    /// principal gets a typed `PermissionDenied` error.
    pub async fn is_entitled(&self, args: &ChainAuthArgs) -> AuthResult<()> {
        if self.is_allowed(args).await? {
            Ok(())
        } else {
            Err(AuthError::PermissionDenied {
                space_id: args.space_id,
                channel_id: args.channel_id,
                principal: args.principal,
                permission: args.permission,
            })
        }
    }

    /// The cached boolean decision behind [`ChainAuth::is_entitled`].
    pub async fn is_allowed(&self, args: &ChainAuthArgs) -> AuthResult<bool> {
        let result = self
            .entitlement_cache
            .execute_using_cache(args, |key| self.check_entitlement(key))
            .await;

        let kind = kind_label(args.kind);
        match &result {
            Ok((allowed, hit)) => {
                metrics::cache_lookup("is_entitled", *hit);
                metrics::decision(kind, if *allowed { "allowed" } else { "denied" });
            }
            Err(_) => metrics::decision(kind, "error"),
        }

        result.map(|(allowed, _)| allowed)
    }

    /// Administrative/test invalidation of a cached decision.
    pub async fn invalidate(&self, args: &ChainAuthArgs) {
        self.entitlement_cache.invalidate(args).await;
        self.entitlement_manager_cache.invalidate(args).await;
    }

    /// The cache-miss path: one bounded evaluation of the full decision
    /// procedure. The deadline cancels every fan-out task transitively via
    /// the drop guard.
    async fn check_entitlement(&self, args: ChainAuthArgs) -> AuthResult<bool> {
        let token = CancellationToken::new();
        let _guard = token.clone().drop_guard();

        match tokio::time::timeout(
            self.contract_calls_timeout,
            self.check_entitlement_inner(&token, args),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(AuthError::Timeout { timeout: self.contract_calls_timeout }),
        }
    }

    async fn check_entitlement_inner(
        &self,
        token: &CancellationToken,
        args: ChainAuthArgs,
    ) -> AuthResult<bool> {
        match args.kind {
            ChainAuthKind::Space | ChainAuthKind::IsSpaceMember => {
                if let Err(err) = self.check_space_enabled(args.space_id).await {
                    debug!(space_id = %args.space_id, %err, "space gate failed, denying");
                    return Ok(false);
                }
            }
            ChainAuthKind::Channel => {
                let channel_id = args.channel_id.ok_or_else(|| {
                    AuthError::InvalidArgs("channel check without a channel id".to_string())
                })?;
                if let Err(err) = self.check_channel_enabled(args.space_id, channel_id).await {
                    debug!(
                        space_id = %args.space_id,
                        channel_id = %channel_id,
                        %err,
                        "channel gate failed, denying"
                    );
                    return Ok(false);
                }
            }
            ChainAuthKind::SpaceEnabled | ChainAuthKind::ChannelEnabled => {
                return Err(AuthError::InvalidArgs(
                    "enabled-flag kinds are internal cache keys".to_string(),
                ));
            }
        }

        let mut wallets = resolve_linked_wallets(self.wallet_link.as_ref(), args.principal)
            .await
            .map_err(AuthError::Contract)?;
        if !wallets.contains(&args.principal) {
            wallets.push(args.principal);
        }
        let args = args.with_linked_wallets(&wallets);

        if !self.check_any_member(token, &wallets, args.space_id).await {
            warn!(
                principal = %args.principal,
                space_id = %args.space_id,
                "principal is not a member of the space via any linked wallet"
            );
            return Ok(false);
        }

        // Entitlement evaluation fans out one chain call batch per wallet;
        // cap the union so one principal cannot amplify into unbounded RPC.
        if wallets.len() > self.linked_wallets_limit {
            error!(
                principal = %args.principal,
                wallets = wallets.len(),
                limit = self.linked_wallets_limit,
                "too many wallets linked to the principal"
            );
            metrics::wallet_limit_exceeded();
            return Err(AuthError::TooManyLinkedWallets {
                count: wallets.len(),
                limit: self.linked_wallets_limit,
            });
        }

        match args.kind {
            // membership was already proven by the fan-out above
            ChainAuthKind::IsSpaceMember => Ok(true),
            ChainAuthKind::Space => self.is_entitled_to_space(token, &args, &wallets).await,
            ChainAuthKind::Channel => self.is_entitled_to_channel(token, &args, &wallets).await,
            ChainAuthKind::SpaceEnabled | ChainAuthKind::ChannelEnabled => {
                Err(AuthError::InvalidArgs("unexpected chain auth kind".to_string()))
            }
        }
    }

    async fn check_space_enabled(&self, space_id: SpaceId) -> AuthResult<()> {
        let key = ChainAuthArgs::for_enabled_space(space_id);
        let space_contract = Arc::clone(&self.space_contract);
        let (enabled, hit) = self
            .entitlement_cache
            .execute_using_cache(&key, |_| async move {
                // The contract exposes "is disabled"; the cache stores "is
                // enabled" so the long positive TTL covers the common case and
                // a freshly disabled space is picked up within the short
                // negative TTL.
                let disabled = space_contract.is_space_disabled(space_id).await?;
                Ok::<bool, AuthError>(!disabled)
            })
            .await?;
        metrics::cache_lookup("is_space_enabled", hit);

        if enabled {
            Ok(())
        } else {
            Err(AuthError::SpaceDisabled { space_id })
        }
    }

    async fn check_channel_enabled(
        &self,
        space_id: SpaceId,
        channel_id: ChannelId,
    ) -> AuthResult<()> {
        let key = ChainAuthArgs::for_enabled_channel(space_id, channel_id);
        let space_contract = Arc::clone(&self.space_contract);
        let (enabled, hit) = self
            .entitlement_cache
            .execute_using_cache(&key, |_| async move {
                let disabled = space_contract
                    .is_channel_disabled(space_id, channel_id)
                    .await?;
                Ok::<bool, AuthError>(!disabled)
            })
            .await?;
        metrics::cache_lookup("is_channel_enabled", hit);

        if enabled {
            Ok(())
        } else {
            Err(AuthError::ChannelDisabled { space_id, channel_id })
        }
    }

    /// Concurrent membership check across the wallet union. Returns as soon
    /// as any wallet proves membership, cancelling the rest of the group.
    ///
    /// Per-wallet RPC failures are deliberately swallowed (logged, counted):
    /// membership needs only one positive signal and one flaky wallet must
    /// not sink an otherwise valid member.
    async fn check_any_member(
        &self,
        token: &CancellationToken,
        wallets: &[Address],
        space_id: SpaceId,
    ) -> bool {
        let group_token = token.child_token();
        let (tx, mut rx) = mpsc::channel::<bool>(wallets.len().max(1));

        for &wallet in wallets {
            let space_contract = Arc::clone(&self.space_contract);
            let task_token = group_token.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = tokio::select! {
                    result = space_contract.is_member(space_id, wallet) => result,
                    _ = task_token.cancelled() => return,
                };
                match result {
                    Ok(true) => {
                        let _ = tx.send(true).await;
                    }
                    Ok(false) => {
                        debug!(wallet = %wallet, space_id = %space_id, "wallet is not a member");
                    }
                    Err(err) => {
                        warn!(
                            wallet = %wallet,
                            space_id = %space_id,
                            %err,
                            "membership check failed, treating wallet as non-member"
                        );
                        metrics::membership_check_failure();
                    }
                }
            });
        }
        // the channel closes once every spawned task has finished or bailed
        drop(tx);

        while let Some(is_member) = rx.recv().await {
            if is_member {
                group_token.cancel();
                return true;
            }
        }
        false
    }

    async fn is_entitled_to_space(
        &self,
        token: &CancellationToken,
        args: &ChainAuthArgs,
        wallets: &[Address],
    ) -> AuthResult<bool> {
        let (allowed, hit) = self
            .entitlement_cache
            .execute_using_cache(args, |key| {
                self.is_entitled_to_space_uncached(token, key, wallets)
            })
            .await?;
        metrics::cache_lookup("is_entitled_to_space", hit);
        Ok(allowed)
    }

    async fn is_entitled_to_space_uncached(
        &self,
        token: &CancellationToken,
        args: ChainAuthArgs,
        wallets: &[Address],
    ) -> AuthResult<bool> {
        let snapshot = self.get_space_entitlements(&args).await?;

        // The space owner has su over all space operations.
        if wallets.contains(&snapshot.owner) {
            debug!(
                space_id = %args.space_id,
                owner = %snapshot.owner,
                "owner is entitled to space"
            );
            return Ok(true);
        }

        let banned = self
            .space_contract
            .is_banned(args.space_id, wallets)
            .await
            .map_err(AuthError::Contract)?;
        if banned {
            warn!(
                principal = %args.principal,
                space_id = %args.space_id,
                "banned principal attempted an entitlement check"
            );
            return Ok(false);
        }

        self.evaluate_entitlement_data(token, &args, &snapshot, wallets).await
    }

    /// One fan-out group per decision: a local task per wallet over the
    /// user-list entitlements, plus a task per rule entitlement evaluating
    /// the tree once over the whole union. First positive result wins and
    /// cancels the group; rule-evaluation errors surface instead of being
    /// mistaken for "not entitled".
    async fn evaluate_entitlement_data(
        &self,
        token: &CancellationToken,
        args: &ChainAuthArgs,
        snapshot: &EntitlementSnapshot,
        wallets: &[Address],
    ) -> AuthResult<bool> {
        let user_lists: Arc<Vec<Vec<Address>>> = Arc::new(
            snapshot
                .entitlements
                .iter()
                .filter_map(|entitlement| match entitlement {
                    Entitlement::User { users } => Some(users.clone()),
                    Entitlement::Rule { .. } => None,
                })
                .collect(),
        );
        let rules: Vec<RuleData> = snapshot
            .entitlements
            .iter()
            .filter_map(|entitlement| match entitlement {
                Entitlement::Rule { rule_data } => Some(rule_data.clone()),
                Entitlement::User { .. } => None,
            })
            .collect();

        let group_token = token.child_token();
        let capacity = (wallets.len() + rules.len()).max(1);
        let (tx, mut rx) = mpsc::channel::<AuthResult<bool>>(capacity);

        for &wallet in wallets {
            let user_lists = Arc::clone(&user_lists);
            let tx = tx.clone();
            tokio::spawn(async move {
                let listed = user_lists
                    .iter()
                    .any(|users| users.contains(&EVERYONE) || users.contains(&wallet));
                let _ = tx.send(Ok(listed)).await;
            });
        }

        for rule in rules {
            let evaluator = Arc::clone(&self.evaluator);
            let rule_token = group_token.clone();
            let tx = tx.clone();
            let wallets = wallets.to_vec();
            let space_id = args.space_id;
            tokio::spawn(async move {
                let result = evaluator
                    .evaluate_rule_data(&rule_token, &rule, &wallets)
                    .await;
                match &result {
                    Ok(outcome) => {
                        debug!(space_id = %space_id, outcome = *outcome, "rule entitlement evaluated")
                    }
                    Err(err) => debug!(space_id = %space_id, %err, "rule entitlement failed"),
                }
                let _ = tx.send(result.map_err(AuthError::Evaluation)).await;
            });
        }
        drop(tx);

        while let Some(result) = rx.recv().await {
            match result {
                Ok(true) => {
                    group_token.cancel();
                    return Ok(true);
                }
                Ok(false) => {}
                Err(err) => {
                    group_token.cancel();
                    return Err(err);
                }
            }
        }
        Ok(false)
    }

    async fn get_space_entitlements(
        &self,
        args: &ChainAuthArgs,
    ) -> AuthResult<EntitlementSnapshot> {
        let space_contract = Arc::clone(&self.space_contract);
        let (snapshot, hit) = self
            .entitlement_manager_cache
            .execute_using_cache(args, |key| async move {
                space_contract
                    .get_space_entitlements_for_permission(key.space_id, key.permission)
                    .await
                    .map_err(AuthError::Contract)
            })
            .await?;
        metrics::cache_lookup("get_space_entitlements", hit);
        Ok(snapshot)
    }

    async fn is_entitled_to_channel(
        &self,
        token: &CancellationToken,
        args: &ChainAuthArgs,
        wallets: &[Address],
    ) -> AuthResult<bool> {
        let (allowed, hit) = self
            .entitlement_cache
            .execute_using_cache(args, |key| {
                self.is_entitled_to_channel_uncached(token, key, wallets)
            })
            .await?;
        metrics::cache_lookup("is_entitled_to_channel", hit);
        Ok(allowed)
    }

    /// Channel entitlements are evaluated on-chain per wallet. Unlike
    /// membership, a per-wallet RPC failure here aborts the whole decision:
    /// there is no safe fallback for "could not determine", and swallowing it
    /// would produce silent wrong denials.
    async fn is_entitled_to_channel_uncached(
        &self,
        token: &CancellationToken,
        args: ChainAuthArgs,
        wallets: &[Address],
    ) -> AuthResult<bool> {
        let channel_id = args.channel_id.ok_or_else(|| {
            AuthError::InvalidArgs("channel check without a channel id".to_string())
        })?;

        let group_token = token.child_token();
        let (tx, mut rx) = mpsc::channel::<AuthResult<bool>>(wallets.len().max(1));

        for &wallet in wallets {
            let space_contract = Arc::clone(&self.space_contract);
            let task_token = group_token.clone();
            let tx = tx.clone();
            let space_id = args.space_id;
            let permission = args.permission;
            tokio::spawn(async move {
                let result = tokio::select! {
                    result = space_contract.is_entitled_to_channel(
                        space_id,
                        channel_id,
                        wallet,
                        permission,
                    ) => result.map_err(AuthError::Contract),
                    _ = task_token.cancelled() => return,
                };
                let _ = tx.send(result).await;
            });
        }
        drop(tx);

        while let Some(result) = rx.recv().await {
            match result {
                Ok(true) => {
                    group_token.cancel();
                    return Ok(true);
                }
                Ok(false) => {}
                Err(err) => {
                    group_token.cancel();
                    return Err(err);
                }
            }
        }
        Ok(false)
    }
}

fn kind_label(kind: ChainAuthKind) -> &'static str {
    match kind {
        ChainAuthKind::Space => "space",
        ChainAuthKind::Channel => "channel",
        ChainAuthKind::SpaceEnabled => "space_enabled",
        ChainAuthKind::ChannelEnabled => "channel_enabled",
        ChainAuthKind::IsSpaceMember => "is_space_member",
    }
}
