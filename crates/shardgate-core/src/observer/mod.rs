//! Sharded node registry and routing providers.
//!
//! The registry classifies every configured node as synced, out-of-sync,
//! fallback or snapshotless, per availability mode, and the providers turn
//! that classification into an ordered candidate list for a request:
//!
//! - [`CircularQueueNodesProvider`]: fair round-robin rotation under
//!   concurrency, the default policy.
//! - [`SimpleNodesProvider`]: fixed configuration order.
//! - [`DisabledNodesProvider`]: inert stub used when a node pool (e.g.
//!   full-history) is not configured.
//!
//! A [`SyncStateChecker`] runs in the background and pushes fresh sync flags
//! into the registry through [`NodesProvider::update_nodes_based_on_sync_state`].

pub mod base_provider;
pub mod circular;
pub mod disabled;
pub mod errors;
pub mod factory;
pub mod holder;
pub mod simple;
pub mod sync_checker;

pub use base_provider::BaseNodeProvider;
pub use circular::CircularQueueNodesProvider;
pub use disabled::DisabledNodesProvider;
pub use errors::NodesProviderError;
pub use factory::create_nodes_provider;
pub use holder::NodesHolder;
pub use simple::SimpleNodesProvider;
pub use sync_checker::SyncStateChecker;

use crate::types::{DataAvailability, NodeData, NodeType, ReloadResponse};

/// Routing seam between the HTTP/processor layer and the node registry.
///
/// Implementations must be safe to share across request workers; every
/// method can be called concurrently.
pub trait NodesProvider: Send + Sync {
    /// Returns the ordered candidate nodes for one shard. The first element
    /// is the one a caller should try first.
    ///
    /// # Errors
    ///
    /// Returns [`NodesProviderError::ShardNotAvailable`] for unknown shard
    /// ids and [`NodesProviderError::NoAvailableNode`] when every candidate
    /// list is empty.
    fn get_nodes_by_shard_id(
        &self,
        shard_id: u32,
        availability: DataAvailability,
    ) -> Result<Vec<NodeData>, NodesProviderError>;

    /// Returns ordered candidates across every shard.
    ///
    /// # Errors
    ///
    /// Returns [`NodesProviderError::EmptyObserversList`] when no node is
    /// available at all.
    fn get_all_nodes(
        &self,
        availability: DataAvailability,
    ) -> Result<Vec<NodeData>, NodesProviderError>;

    /// Pushes freshly observed sync flags into the registry. Called by the
    /// periodic sync-state checker, cadence owned by the caller.
    fn update_nodes_based_on_sync_state(&self, nodes: Vec<NodeData>);

    /// Re-reads the configuration file and atomically swaps the registry.
    /// The live registry is untouched on any failure.
    fn reload_nodes(&self, node_type: NodeType) -> ReloadResponse;

    /// Logs a per-shard summary of the registry contents.
    fn print_nodes_in_shards(&self);

    /// The fixed shard-id set this provider is responsible for.
    fn shard_ids(&self) -> Vec<u32>;

    /// Every configured node regardless of sync state, in configuration
    /// order. Used by the sync checker to know what to probe.
    fn configured_nodes(&self) -> Vec<NodeData>;
}
