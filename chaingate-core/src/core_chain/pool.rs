//! Chain id to client lookup

use std::collections::HashMap;
use std::sync::Arc;

use super::client::{ChainClient, ChainError};

/// Maps chain ids to read clients.
///
/// Built once at startup from the configured chains and shared (`Arc`) with
/// every evaluator. Lookup of an unconfigured chain is an error, never a
/// silent "not entitled".
#[derive(Clone, Default)]
pub struct BlockchainClientPool {
    clients: HashMap<u64, Arc<dyn ChainClient>>,
}

impl BlockchainClientPool {
    pub fn new() -> Self {
        Self { clients: HashMap::new() }
    }

    /// Register a client for a chain id, replacing any previous one.
    pub fn insert(&mut self, chain_id: u64, client: Arc<dyn ChainClient>) {
        self.clients.insert(chain_id, client);
    }

    /// Builder-style registration, handy in tests
    pub fn with_client(mut self, chain_id: u64, client: Arc<dyn ChainClient>) -> Self {
        self.insert(chain_id, client);
        self
    }

    /// Look up the client for a chain id.
    pub fn get(&self, chain_id: u64) -> Result<Arc<dyn ChainClient>, ChainError> {
        self.clients
            .get(&chain_id)
            .cloned()
            .ok_or(ChainError::UnknownChain(chain_id))
    }

    /// The chain ids this pool can serve
    pub fn chain_ids(&self) -> Vec<u64> {
        self.clients.keys().copied().collect()
    }
}

impl std::fmt::Debug for BlockchainClientPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClientPool")
            .field("chains", &self.chain_ids())
            .finish()
    }
}
