//! Rule tree model
//!
//! Entitlement rules arrive from the chain as a flat post-order operation
//! list with index references into side tables of check and logical
//! operations. They are decoded into a closed [`Operation`] sum type — a
//! binary tree, built once per evaluation and discarded afterwards. Malformed
//! encodings fail decoding; they can never evaluate to "entitled".

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::{EntitlementError, EntitlementResult};

/// The kind of on-chain check a leaf performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckType {
    /// Deterministic synthetic check for timing and cancellation tests:
    /// sleeps `threshold` milliseconds, passes iff `chain_id != 0`
    Mock,
    /// ERC-20 balance threshold, summed across linked wallets
    Erc20,
    /// ERC-721 balance threshold, summed across linked wallets
    Erc721,
    /// ERC-1155 balance threshold; declared but not implemented
    Erc1155,
    /// Custom contract `isEntitled` query, per wallet
    IsEntitled,
}

impl CheckType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckType::Mock => "MOCK",
            CheckType::Erc20 => "ERC20",
            CheckType::Erc721 => "ERC721",
            CheckType::Erc1155 => "ERC1155",
            CheckType::IsEntitled => "ISENTITLED",
        }
    }
}

impl fmt::Display for CheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A leaf check against one chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOperation {
    pub check_type: CheckType,
    pub chain_id: u64,
    pub contract_address: Address,
    pub threshold: U256,
}

/// Logical combinator kind in the flat encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalType {
    None,
    And,
    Or,
}

/// Entry kind in the flat post-order operation list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationType {
    None,
    Check,
    Logical,
}

/// One entry of the flat operation list: a discriminant plus an index into
/// the matching side table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedOperation {
    pub op_type: OperationType,
    pub index: u8,
}

/// Logical side-table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalOperation {
    pub logical_type: LogicalType,
}

/// The wire-shaped rule payload fetched from the space contract
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleData {
    /// Post-order traversal of the rule tree
    pub operations: Vec<EncodedOperation>,
    pub check_operations: Vec<CheckOperation>,
    pub logical_operations: Vec<LogicalOperation>,
}

impl RuleData {
    /// A rule consisting of a single check leaf
    pub fn single_check(check: CheckOperation) -> Self {
        Self {
            operations: vec![EncodedOperation { op_type: OperationType::Check, index: 0 }],
            check_operations: vec![check],
            logical_operations: vec![],
        }
    }
}

/// A decoded rule tree node. Logical nodes always have exactly two children;
/// the encoding cannot express anything else once decoding has succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Check(CheckOperation),
    And(Box<Operation>, Box<Operation>),
    Or(Box<Operation>, Box<Operation>),
}

impl Operation {
    pub fn and(left: Operation, right: Operation) -> Self {
        Operation::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Operation, right: Operation) -> Self {
        Operation::Or(Box::new(left), Box::new(right))
    }

    /// Decode the flat post-order encoding into a tree.
    ///
    /// Standard post-order stack build: checks push a leaf, logical entries
    /// pop two operands. Anything that does not reduce to exactly one root is
    /// malformed and fails closed.
    pub fn from_rule_data(rule: &RuleData) -> EntitlementResult<Operation> {
        let mut stack: Vec<Operation> = Vec::new();

        for encoded in &rule.operations {
            match encoded.op_type {
                OperationType::Check => {
                    let check = rule
                        .check_operations
                        .get(encoded.index as usize)
                        .ok_or_else(|| {
                            EntitlementError::MalformedTree(format!(
                                "check index {} out of range",
                                encoded.index
                            ))
                        })?;
                    stack.push(Operation::Check(check.clone()));
                }
                OperationType::Logical => {
                    let logical = rule
                        .logical_operations
                        .get(encoded.index as usize)
                        .ok_or_else(|| {
                            EntitlementError::MalformedTree(format!(
                                "logical index {} out of range",
                                encoded.index
                            ))
                        })?;
                    let right = stack.pop().ok_or_else(|| {
                        EntitlementError::MalformedTree(
                            "not enough operands for logical operation".to_string(),
                        )
                    })?;
                    let left = stack.pop().ok_or_else(|| {
                        EntitlementError::MalformedTree(
                            "not enough operands for logical operation".to_string(),
                        )
                    })?;
                    let node = match logical.logical_type {
                        LogicalType::And => Operation::and(left, right),
                        LogicalType::Or => Operation::or(left, right),
                        LogicalType::None => {
                            return Err(EntitlementError::MalformedTree(
                                "unknown logical operation type".to_string(),
                            ))
                        }
                    };
                    stack.push(node);
                }
                OperationType::None => {
                    return Err(EntitlementError::MalformedTree(
                        "unknown operation type".to_string(),
                    ))
                }
            }
        }

        let root = stack.pop().ok_or_else(|| {
            EntitlementError::MalformedTree("empty rule encoding".to_string())
        })?;
        if !stack.is_empty() {
            return Err(EntitlementError::MalformedTree(format!(
                "invalid post-order encoding: {} unconsumed operands",
                stack.len()
            )));
        }
        Ok(root)
    }
}
