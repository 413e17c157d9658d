//! Error types for rule-tree evaluation

use thiserror::Error;

use super::operation::CheckType;
use crate::core_chain::ChainError;

/// Result type for rule-tree evaluation
pub type EntitlementResult<T> = Result<T, EntitlementError>;

/// Errors that can occur while evaluating a rule tree
#[derive(Debug, Error, Clone)]
pub enum EntitlementError {
    /// The evaluation was cancelled before producing a result. Generated by
    /// short-circuiting siblings and by caller deadline expiry.
    #[error("Evaluation cancelled")]
    Cancelled,

    /// The flat rule encoding does not decode to a well-formed binary tree
    #[error("Malformed rule tree: {0}")]
    MalformedTree(String),

    /// A check leaf is missing required parameters
    #[error("Invalid check operation: {0}")]
    InvalidCheck(String),

    /// The check type is declared on the contract surface but not evaluable
    #[error("{0} checks are not implemented")]
    Unsupported(CheckType),

    /// A chain client call failed
    #[error("Chain call failed: {0}")]
    Chain(#[from] ChainError),

    /// Both branches of a logical node failed with real errors
    #[error("left: {left}; right: {right}")]
    Both {
        left: Box<EntitlementError>,
        right: Box<EntitlementError>,
    },
}

impl EntitlementError {
    /// Internally generated short-circuit cancellation is not a "real" error
    /// when combining branch results; everything else is.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, EntitlementError::Cancelled)
    }

    pub fn both(left: EntitlementError, right: EntitlementError) -> Self {
        EntitlementError::Both { left: Box::new(left), right: Box::new(right) }
    }
}
