//! Check-leaf evaluation
//!
//! Every leaf is a blocking chain query raced against the ambient
//! cancellation token, so a short-circuiting sibling or an expiring deadline
//! never waits out an in-flight RPC.

use std::time::{Duration, Instant};

use alloy_primitives::{Address, U256};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::errors::{EntitlementError, EntitlementResult};
use super::evaluator::RuleEvaluator;
use super::operation::{CheckOperation, CheckType};
use crate::metrics;

impl RuleEvaluator {
    /// Dispatch a check leaf by type, recording per-type latency.
    pub(super) async fn evaluate_check(
        &self,
        token: &CancellationToken,
        op: &CheckOperation,
        linked_wallets: &[Address],
    ) -> EntitlementResult<bool> {
        if op.check_type != CheckType::Mock {
            if op.chain_id == 0 {
                return Err(EntitlementError::InvalidCheck(format!(
                    "{} check has no chain id",
                    op.check_type
                )));
            }
            if op.contract_address == Address::ZERO {
                return Err(EntitlementError::InvalidCheck(format!(
                    "{} check has no contract address",
                    op.check_type
                )));
            }
        }

        let start = Instant::now();
        let result = match op.check_type {
            CheckType::Mock => self.evaluate_mock(token, op).await,
            CheckType::Erc20 | CheckType::Erc721 => {
                self.evaluate_balance_threshold(token, op, linked_wallets).await
            }
            CheckType::Erc1155 => Err(EntitlementError::Unsupported(CheckType::Erc1155)),
            CheckType::IsEntitled => {
                self.evaluate_is_entitled(token, op, linked_wallets).await
            }
        };
        metrics::check_duration(op.check_type.as_str(), start.elapsed());
        result
    }

    /// Synthetic check: an interruptible sleep of `threshold` milliseconds
    /// standing in for RPC latency, passing iff `chain_id != 0`.
    async fn evaluate_mock(
        &self,
        token: &CancellationToken,
        op: &CheckOperation,
    ) -> EntitlementResult<bool> {
        let delay_ms = u64::try_from(op.threshold).unwrap_or(u64::MAX);
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(delay_ms)) => Ok(op.chain_id != 0),
            _ = token.cancelled() => Err(EntitlementError::Cancelled),
        }
    }

    /// ERC-20 / ERC-721 threshold check: balances are summed sequentially
    /// across the linked wallets and the leaf passes the moment the running
    /// total reaches the threshold (inclusive). The check is over the union's
    /// combined holdings, not any single wallet's.
    async fn evaluate_balance_threshold(
        &self,
        token: &CancellationToken,
        op: &CheckOperation,
        linked_wallets: &[Address],
    ) -> EntitlementResult<bool> {
        let client = self.clients().get(op.chain_id)?;

        if op.threshold.is_zero() {
            warn!(
                check_type = op.check_type.as_str(),
                contract = %op.contract_address,
                "balance check with a zero threshold is never satisfiable"
            );
            return Ok(false);
        }

        let mut total = U256::ZERO;
        for wallet in linked_wallets {
            let balance = tokio::select! {
                result = async {
                    match op.check_type {
                        CheckType::Erc20 => client.erc20_balance_of(op.contract_address, *wallet).await,
                        _ => client.erc721_balance_of(op.contract_address, *wallet).await,
                    }
                } => result?,
                _ = token.cancelled() => return Err(EntitlementError::Cancelled),
            };
            total = total.saturating_add(balance);
            debug!(
                check_type = op.check_type.as_str(),
                wallet = %wallet,
                balance = %balance,
                total = %total,
                threshold = %op.threshold,
                "accumulated token balance"
            );
            if total >= op.threshold {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Custom entitlement contract check: each linked wallet is queried
    /// individually and the leaf passes as soon as any one wallet is accepted.
    async fn evaluate_is_entitled(
        &self,
        token: &CancellationToken,
        op: &CheckOperation,
        linked_wallets: &[Address],
    ) -> EntitlementResult<bool> {
        let client = self.clients().get(op.chain_id)?;

        for wallet in linked_wallets {
            let entitled = tokio::select! {
                result = client.is_entitled(op.contract_address, std::slice::from_ref(wallet)) => result?,
                _ = token.cancelled() => return Err(EntitlementError::Cancelled),
            };
            if entitled {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
