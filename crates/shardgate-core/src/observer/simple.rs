use super::{errors::NodesProviderError, BaseNodeProvider, NodesProvider};
use crate::types::{DataAvailability, NodeData, NodeType, ReloadResponse};

/// Fixed-order routing policy: candidates come back in stored
/// (configuration) order, so the first configured eligible node is always
/// tried first. Deterministic, deliberately not fair across calls.
pub struct SimpleNodesProvider {
    base: BaseNodeProvider,
}

impl SimpleNodesProvider {
    #[must_use]
    pub fn new(base: BaseNodeProvider) -> Self {
        Self { base }
    }
}

impl NodesProvider for SimpleNodesProvider {
    fn get_nodes_by_shard_id(
        &self,
        shard_id: u32,
        availability: DataAvailability,
    ) -> Result<Vec<NodeData>, NodesProviderError> {
        let nodes = self.base.get_synced_nodes_for_shard(shard_id, availability)?;
        if nodes.is_empty() {
            return Err(NodesProviderError::NoAvailableNode(shard_id));
        }
        Ok(nodes)
    }

    fn get_all_nodes(
        &self,
        availability: DataAvailability,
    ) -> Result<Vec<NodeData>, NodesProviderError> {
        let nodes = self.base.get_all_nodes(availability);
        if nodes.is_empty() {
            return Err(NodesProviderError::EmptyObserversList);
        }
        Ok(nodes)
    }

    fn update_nodes_based_on_sync_state(&self, nodes: Vec<NodeData>) {
        self.base.update_nodes_based_on_sync_state(&nodes);
    }

    fn reload_nodes(&self, node_type: NodeType) -> ReloadResponse {
        self.base.reload_nodes(node_type)
    }

    fn print_nodes_in_shards(&self) {
        self.base.print_nodes_in_shards();
    }

    fn shard_ids(&self) -> Vec<u32> {
        self.base.shard_ids().to_vec()
    }

    fn configured_nodes(&self) -> Vec<NodeData> {
        self.base.configured_nodes()
    }
}
