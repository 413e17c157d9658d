/*
    Metrics - observability for the entitlement engine

    Provides counters and histograms for:
    - Cache effectiveness (hits/misses per lookup function)
    - Check-leaf latency per check type (the slow RPC-bound path)
    - Fan-out outcomes (membership and entitlement decisions)

    Metrics can be exported via Prometheus or other backends through the
    `metrics` facade.
*/

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Initialize metric descriptions (call once at startup)
pub fn init_metrics() {
    describe_counter!(
        "chaingate_entitlement_cache_total",
        "Entitlement cache lookups, labeled by function and result (hit, miss)"
    );

    describe_histogram!(
        "chaingate_check_duration_seconds",
        "Duration of a single rule-tree check leaf, labeled by check type"
    );

    describe_counter!(
        "chaingate_entitlement_decisions_total",
        "Terminal entitlement decisions, labeled by kind and outcome (allowed, denied, error)"
    );

    describe_counter!(
        "chaingate_membership_check_failures_total",
        "Per-wallet membership RPC failures that were swallowed as non-membership"
    );

    describe_counter!(
        "chaingate_wallet_limit_exceeded_total",
        "Evaluations rejected because the linked-wallet union exceeded the configured cap"
    );
}

/// Record a cache lookup outcome for a given lookup function
pub fn cache_lookup(function: &'static str, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("chaingate_entitlement_cache_total", "function" => function, "result" => result)
        .increment(1);
}

/// Record the latency of one check leaf
pub fn check_duration(check_type: &'static str, elapsed: Duration) {
    histogram!("chaingate_check_duration_seconds", "check_type" => check_type)
        .record(elapsed.as_secs_f64());
}

/// Record a terminal decision
pub fn decision(kind: &'static str, outcome: &'static str) {
    counter!("chaingate_entitlement_decisions_total", "kind" => kind, "outcome" => outcome)
        .increment(1);
}

/// Record a swallowed per-wallet membership failure
pub fn membership_check_failure() {
    counter!("chaingate_membership_check_failures_total").increment(1);
}

/// Record a rejected oversized linked-wallet union
pub fn wallet_limit_exceeded() {
    counter!("chaingate_wallet_limit_exceeded_total").increment(1);
}
