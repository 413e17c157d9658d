//! Chain authorization test suite
//!
//! End-to-end decision scenarios over mock contracts, plus the fan-out
//! failure-handling cases.


// Test fixtures and mock contracts
pub mod helpers;
