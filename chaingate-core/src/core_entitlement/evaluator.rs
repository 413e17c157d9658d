//! Recursive rule-tree evaluation
//!
//! Logical nodes evaluate both children concurrently, each under its own
//! child cancellation token. The moment one child settles the node's outcome
//! — a definite `false` under AND, a definite `true` under OR — the sibling's
//! token is cancelled so its in-flight chain calls are abandoned.
//!
//! Error combination is asymmetric on purpose: a branch that failed to reach
//! a chain must not block a decision the other branch already settled
//! unambiguously, but if no branch settles the question the caller sees the
//! failure instead of a silent `false`. Internally generated short-circuit
//! cancellation does not count as a failure.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use alloy_primitives::Address;
use tokio_util::sync::CancellationToken;

use super::errors::{EntitlementError, EntitlementResult};
use super::operation::{Operation, RuleData};
use crate::core_chain::BlockchainClientPool;

/// Evaluates entitlement rule trees against per-chain clients.
pub struct RuleEvaluator {
    clients: Arc<BlockchainClientPool>,
}

impl RuleEvaluator {
    pub fn new(clients: Arc<BlockchainClientPool>) -> Self {
        Self { clients }
    }

    pub(super) fn clients(&self) -> &BlockchainClientPool {
        &self.clients
    }

    /// Decode a wire-shaped rule payload and evaluate it.
    pub async fn evaluate_rule_data(
        &self,
        token: &CancellationToken,
        rule: &RuleData,
        linked_wallets: &[Address],
    ) -> EntitlementResult<bool> {
        let tree = Operation::from_rule_data(rule)?;
        self.evaluate(token, &tree, linked_wallets).await
    }

    /// Evaluate a decoded rule tree over the full linked-wallet union.
    pub async fn evaluate(
        &self,
        token: &CancellationToken,
        op: &Operation,
        linked_wallets: &[Address],
    ) -> EntitlementResult<bool> {
        self.evaluate_op(token.clone(), op, linked_wallets).await
    }

    fn evaluate_op<'a>(
        &'a self,
        token: CancellationToken,
        op: &'a Operation,
        linked_wallets: &'a [Address],
    ) -> Pin<Box<dyn Future<Output = EntitlementResult<bool>> + Send + 'a>> {
        Box::pin(async move {
            match op {
                Operation::Check(check) => {
                    self.evaluate_check(&token, check, linked_wallets).await
                }
                Operation::And(left, right) => {
                    let (left_result, right_result) = self
                        .evaluate_branches(&token, left, right, linked_wallets, false)
                        .await;
                    combine_and(left_result, right_result)
                }
                Operation::Or(left, right) => {
                    let (left_result, right_result) = self
                        .evaluate_branches(&token, left, right, linked_wallets, true)
                        .await;
                    combine_or(left_result, right_result)
                }
            }
        })
    }

    /// Run both children concurrently. A child resolving to
    /// `short_circuit_on` with no error cancels its sibling's token; the
    /// sibling then unwinds with `Cancelled` from its next suspension point.
    async fn evaluate_branches(
        &self,
        token: &CancellationToken,
        left: &Operation,
        right: &Operation,
        linked_wallets: &[Address],
        short_circuit_on: bool,
    ) -> (EntitlementResult<bool>, EntitlementResult<bool>) {
        let left_token = token.child_token();
        let right_token = token.child_token();
        let cancel_right = right_token.clone();
        let cancel_left = left_token.clone();

        let left_fut = async {
            let result = self.evaluate_op(left_token, left, linked_wallets).await;
            if matches!(result, Ok(value) if value == short_circuit_on) {
                cancel_right.cancel();
            }
            result
        };
        let right_fut = async {
            let result = self.evaluate_op(right_token, right, linked_wallets).await;
            if matches!(result, Ok(value) if value == short_circuit_on) {
                cancel_left.cancel();
            }
            result
        };

        tokio::join!(left_fut, right_fut)
    }
}

/// AND combination: both true wins; a definite `false` from either side wins
/// over an errored or cancelled sibling; otherwise the real error(s) surface,
/// with cancellation propagated only when it is all there is.
fn combine_and(
    left: EntitlementResult<bool>,
    right: EntitlementResult<bool>,
) -> EntitlementResult<bool> {
    match (left, right) {
        (Ok(true), Ok(true)) => Ok(true),
        (Ok(false), _) | (_, Ok(false)) => Ok(false),
        (Ok(true), Err(e)) | (Err(e), Ok(true)) => Err(e),
        (Err(left), Err(right)) => Err(combine_errors(left, right)),
    }
}

/// OR combination: the dual of [`combine_and`].
fn combine_or(
    left: EntitlementResult<bool>,
    right: EntitlementResult<bool>,
) -> EntitlementResult<bool> {
    match (left, right) {
        (Ok(true), _) | (_, Ok(true)) => Ok(true),
        (Ok(false), Ok(false)) => Ok(false),
        (Ok(false), Err(e)) | (Err(e), Ok(false)) => Err(e),
        (Err(left), Err(right)) => Err(combine_errors(left, right)),
    }
}

/// Real errors win over cancellation; two real errors are combined.
fn combine_errors(left: EntitlementError, right: EntitlementError) -> EntitlementError {
    match (left.is_cancellation(), right.is_cancellation()) {
        (false, false) => EntitlementError::both(left, right),
        (true, false) => right,
        (false, true) => left,
        (true, true) => left,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_entitlement::operation::{CheckOperation, CheckType};
    use alloy_primitives::U256;
    use std::time::{Duration, Instant};

    const SLOW: u64 = 500;
    const FAST: u64 = 10;
    const TIMING_THRESHOLD: Duration = Duration::from_millis(100);

    fn evaluator() -> RuleEvaluator {
        RuleEvaluator::new(Arc::new(BlockchainClientPool::new()))
    }

    fn mock_check(chain_id: u64, delay_ms: u64) -> Operation {
        Operation::Check(CheckOperation {
            check_type: CheckType::Mock,
            chain_id,
            contract_address: Address::ZERO,
            threshold: U256::from(delay_ms),
        })
    }

    fn fast_true() -> Operation {
        mock_check(1, FAST)
    }

    fn slow_true() -> Operation {
        mock_check(1, SLOW)
    }

    fn fast_false() -> Operation {
        mock_check(0, FAST)
    }

    fn slow_false() -> Operation {
        mock_check(0, SLOW)
    }

    /// A check that errors quickly: ERC-20 with a missing chain client.
    fn fast_error() -> Operation {
        Operation::Check(CheckOperation {
            check_type: CheckType::Erc20,
            chain_id: 999,
            contract_address: Address::with_last_byte(1),
            threshold: U256::from(1),
        })
    }

    async fn eval(op: Operation) -> EntitlementResult<bool> {
        let evaluator = evaluator();
        let token = CancellationToken::new();
        evaluator.evaluate(&token, &op, &[]).await
    }

    async fn eval_timed(op: Operation) -> (EntitlementResult<bool>, Duration) {
        let start = Instant::now();
        let result = eval(op).await;
        (result, start.elapsed())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_and_short_circuits_on_fast_false() {
        let (result, elapsed) = eval_timed(Operation::and(fast_false(), slow_true())).await;
        assert_eq!(result.unwrap(), false);
        assert!(
            elapsed < Duration::from_millis(FAST) + TIMING_THRESHOLD,
            "AND(fastFalse, slowTrue) should resolve at the fast leaf's pace, took {:?}",
            elapsed
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_and_waits_for_both_when_true() {
        let (result, elapsed) = eval_timed(Operation::and(fast_true(), slow_true())).await;
        assert_eq!(result.unwrap(), true);
        assert!(
            elapsed >= Duration::from_millis(SLOW),
            "AND(fastTrue, slowTrue) must wait for the slow leaf, took {:?}",
            elapsed
        );
        assert!(elapsed < Duration::from_millis(SLOW) + TIMING_THRESHOLD);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_or_short_circuits_on_fast_true() {
        let (result, elapsed) = eval_timed(Operation::or(fast_true(), slow_false())).await;
        assert_eq!(result.unwrap(), true);
        assert!(
            elapsed < Duration::from_millis(FAST) + TIMING_THRESHOLD,
            "OR(fastTrue, slowFalse) should resolve at the fast leaf's pace, took {:?}",
            elapsed
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_or_waits_for_both_when_false() {
        let (result, elapsed) = eval_timed(Operation::or(slow_false(), fast_false())).await;
        assert_eq!(result.unwrap(), false);
        assert!(
            elapsed >= Duration::from_millis(SLOW),
            "OR of two false leaves must evaluate both, took {:?}",
            elapsed
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_and_definite_false_beats_sibling_error() {
        let result = eval(Operation::and(fast_false(), fast_error())).await;
        assert_eq!(result.unwrap(), false);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_or_definite_true_beats_sibling_error() {
        let result = eval(Operation::or(fast_true(), fast_error())).await;
        assert_eq!(result.unwrap(), true);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_and_error_surfaces_without_definite_false() {
        let result = eval(Operation::and(fast_true(), fast_error())).await;
        assert!(result.is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_or_error_surfaces_without_definite_true() {
        let result = eval(Operation::or(fast_false(), fast_error())).await;
        assert!(result.is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_both_real_errors_are_combined() {
        let result = eval(Operation::and(fast_error(), fast_error())).await;
        match result {
            Err(EntitlementError::Both { .. }) => {}
            other => panic!("expected combined error, got {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_nested_tree_evaluation() {
        // (false AND true) OR true => true
        let tree = Operation::or(
            Operation::and(fast_false(), fast_true()),
            mock_check(1, FAST),
        );
        assert_eq!(eval(tree).await.unwrap(), true);

        // (true AND true) OR false => true
        let tree = Operation::or(
            Operation::and(fast_true(), fast_true()),
            fast_false(),
        );
        assert_eq!(eval(tree).await.unwrap(), true);

        // (false OR false) AND true => false
        let tree = Operation::and(
            Operation::or(fast_false(), fast_false()),
            fast_true(),
        );
        assert_eq!(eval(tree).await.unwrap(), false);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_caller_cancellation_aborts_mock_sleep() {
        let evaluator = evaluator();
        let token = CancellationToken::new();
        let op = slow_true();

        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        });

        let start = Instant::now();
        let result = evaluator.evaluate(&token, &op, &[]).await;
        let elapsed = start.elapsed();

        assert!(matches!(result, Err(EntitlementError::Cancelled)));
        assert!(
            elapsed < Duration::from_millis(SLOW),
            "cancelled mock check must not sleep out its full delay, took {:?}",
            elapsed
        );
    }

    #[test]
    fn test_combine_and_table() {
        let err = || EntitlementError::InvalidCheck("x".to_string());
        let cancelled = || EntitlementError::Cancelled;

        assert_eq!(combine_and(Ok(true), Ok(true)).unwrap(), true);
        assert_eq!(combine_and(Ok(false), Ok(true)).unwrap(), false);
        assert_eq!(combine_and(Ok(false), Err(err())).unwrap(), false);
        assert_eq!(combine_and(Ok(false), Err(cancelled())).unwrap(), false);
        assert!(combine_and(Ok(true), Err(err())).is_err());
        assert!(matches!(
            combine_and(Err(cancelled()), Err(err())),
            Err(EntitlementError::InvalidCheck(_))
        ));
        assert!(matches!(
            combine_and(Err(cancelled()), Err(cancelled())),
            Err(EntitlementError::Cancelled)
        ));
    }

    #[test]
    fn test_combine_or_table() {
        let err = || EntitlementError::InvalidCheck("x".to_string());
        let cancelled = || EntitlementError::Cancelled;

        assert_eq!(combine_or(Ok(true), Err(err())).unwrap(), true);
        assert_eq!(combine_or(Err(cancelled()), Ok(true)).unwrap(), true);
        assert_eq!(combine_or(Ok(false), Ok(false)).unwrap(), false);
        assert!(combine_or(Ok(false), Err(err())).is_err());
        assert!(matches!(
            combine_or(Err(err()), Err(cancelled())),
            Err(EntitlementError::InvalidCheck(_))
        ));
    }
}
