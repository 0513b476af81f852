use tracing::debug;

use super::{errors::NodesProviderError, NodesProvider};
use crate::types::{DataAvailability, NodeData, NodeType, ReloadResponse};

/// Inert provider used when a node pool is not configured (e.g. no
/// full-history nodes). Every routing call fails with a fixed error instead
/// of the process refusing to start; callers of pool-specific endpoints
/// degrade gracefully.
pub struct DisabledNodesProvider {
    description: String,
}

impl DisabledNodesProvider {
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self { description: description.into() }
    }

    fn error(&self) -> NodesProviderError {
        NodesProviderError::Disabled(self.description.clone())
    }
}

impl NodesProvider for DisabledNodesProvider {
    fn get_nodes_by_shard_id(
        &self,
        _shard_id: u32,
        _availability: DataAvailability,
    ) -> Result<Vec<NodeData>, NodesProviderError> {
        Err(self.error())
    }

    fn get_all_nodes(
        &self,
        _availability: DataAvailability,
    ) -> Result<Vec<NodeData>, NodesProviderError> {
        Err(self.error())
    }

    fn update_nodes_based_on_sync_state(&self, _nodes: Vec<NodeData>) {
        debug!(provider = %self.description, "sync state update ignored by disabled provider");
    }

    fn reload_nodes(&self, node_type: NodeType) -> ReloadResponse {
        ReloadResponse::failed(
            format!("cannot reload {}", node_type.as_str()),
            self.error().to_string(),
        )
    }

    fn print_nodes_in_shards(&self) {
        debug!(provider = %self.description, "disabled provider holds no nodes");
    }

    fn shard_ids(&self) -> Vec<u32> {
        Vec::new()
    }

    fn configured_nodes(&self) -> Vec<NodeData> {
        Vec::new()
    }
}
