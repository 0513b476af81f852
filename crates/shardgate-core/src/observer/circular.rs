use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use parking_lot::Mutex;
use tracing::trace;

use super::{errors::NodesProviderError, BaseNodeProvider, NodesProvider};
use crate::types::{DataAvailability, NodeData, NodeType, ReloadResponse};

/// Round-robin routing policy over the shared registry.
///
/// Every call rotates the eligible list by an internal counter so the
/// "first" position is distributed fairly across all eligible nodes: N
/// calls against M nodes put each node first exactly N/M times.
///
/// The per-shard counters and the all-nodes counter are independent and sit
/// behind their own lock, distinct from the registry's holder locks, so
/// rotation arithmetic never serializes behind reconciliation passes.
/// Rotation recomputes modulo the *current* list length, so the list
/// shrinking or growing between calls is tolerated.
pub struct CircularQueueNodesProvider {
    base: BaseNodeProvider,
    shard_counters: Mutex<HashMap<u32, usize>>,
    all_nodes_counter: AtomicUsize,
}

impl CircularQueueNodesProvider {
    #[must_use]
    pub fn new(base: BaseNodeProvider) -> Self {
        Self {
            base,
            shard_counters: Mutex::new(HashMap::new()),
            all_nodes_counter: AtomicUsize::new(0),
        }
    }

    /// Advances the shard's counter and returns the rotation offset for a
    /// list of `len` elements. Counters grow monotonically; the modulo is
    /// applied per call against the current length.
    fn next_shard_offset(&self, shard_id: u32, len: usize) -> usize {
        let mut counters = self.shard_counters.lock();
        let counter = counters.entry(shard_id).or_insert(0);
        let offset = *counter % len;
        *counter = counter.wrapping_add(1);
        offset
    }

    fn next_global_offset(&self, len: usize) -> usize {
        self.all_nodes_counter.fetch_add(1, Ordering::Relaxed) % len
    }
}

impl NodesProvider for CircularQueueNodesProvider {
    fn get_nodes_by_shard_id(
        &self,
        shard_id: u32,
        availability: DataAvailability,
    ) -> Result<Vec<NodeData>, NodesProviderError> {
        let mut nodes = self.base.get_synced_nodes_for_shard(shard_id, availability)?;
        if nodes.is_empty() {
            return Err(NodesProviderError::NoAvailableNode(shard_id));
        }

        let offset = self.next_shard_offset(shard_id, nodes.len());
        nodes.rotate_left(offset);

        trace!(shard = shard_id, offset, candidates = nodes.len(), "rotated shard candidates");
        Ok(nodes)
    }

    fn get_all_nodes(
        &self,
        availability: DataAvailability,
    ) -> Result<Vec<NodeData>, NodesProviderError> {
        let mut nodes = self.base.get_all_nodes(availability);
        if nodes.is_empty() {
            return Err(NodesProviderError::EmptyObserversList);
        }

        let offset = self.next_global_offset(nodes.len());
        nodes.rotate_left(offset);
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

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc};

    use super::*;

    fn shard0_provider(count: usize) -> CircularQueueNodesProvider {
        let nodes: Vec<NodeData> =
            (0..count).map(|i| NodeData::new(format!("http://obs-{i}"), 0)).collect();
        let base = BaseNodeProvider::new(nodes, "config.toml", NodeType::Observers).unwrap();
        CircularQueueNodesProvider::new(base)
    }

    #[test]
    fn test_fairness_each_node_first_equally_often() {
        let provider = shard0_provider(4);
        let calls = 8;

        let mut firsts: HashMap<String, usize> = HashMap::new();
        for _ in 0..calls {
            let nodes = provider.get_nodes_by_shard_id(0, DataAvailability::All).unwrap();
            *firsts.entry(nodes[0].address.clone()).or_insert(0) += 1;
        }

        assert_eq!(firsts.len(), 4);
        for (address, count) in firsts {
            assert_eq!(count, 2, "node {address} was first {count} times");
        }
    }

    #[test]
    fn test_rotation_returns_to_initial_ordering() {
        let provider = shard0_provider(3);

        let first = provider.get_nodes_by_shard_id(0, DataAvailability::All).unwrap();
        for _ in 0..2 {
            provider.get_nodes_by_shard_id(0, DataAvailability::All).unwrap();
        }
        let wrapped = provider.get_nodes_by_shard_id(0, DataAvailability::All).unwrap();

        assert_eq!(first, wrapped);
    }

    #[test]
    fn test_rotation_tolerates_list_shrinking_between_calls() {
        let provider = shard0_provider(4);

        // Advance the counter well past the smaller list length.
        for _ in 0..3 {
            provider.get_nodes_by_shard_id(0, DataAvailability::All).unwrap();
        }

        let update: Vec<NodeData> = (0..4)
            .map(|i| NodeData::new(format!("http://obs-{i}"), 0).with_synced(i < 2))
            .collect();
        provider.update_nodes_based_on_sync_state(update);

        let nodes = provider.get_nodes_by_shard_id(0, DataAvailability::All).unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_all_nodes_rotation_across_shards() {
        // 4 nodes over 2 shards: 4 successive calls put each address first
        // exactly once.
        let nodes = vec![
            NodeData::new("http://obs-0a", 0),
            NodeData::new("http://obs-0b", 0),
            NodeData::new("http://obs-1a", 1),
            NodeData::new("http://obs-1b", 1),
        ];
        let base = BaseNodeProvider::new(nodes, "config.toml", NodeType::Observers).unwrap();
        let provider = CircularQueueNodesProvider::new(base);

        let mut firsts: HashMap<String, usize> = HashMap::new();
        for _ in 0..4 {
            let all = provider.get_all_nodes(DataAvailability::All).unwrap();
            assert_eq!(all.len(), 4);
            *firsts.entry(all[0].address.clone()).or_insert(0) += 1;
        }

        assert_eq!(firsts.len(), 4);
        assert!(firsts.values().all(|&count| count == 1));
    }

    #[tokio::test]
    async fn test_fairness_under_concurrency() {
        let provider = Arc::new(shard0_provider(4));
        let per_node = 25;

        let mut handles = Vec::new();
        for _ in 0..4 * per_node {
            let provider = Arc::clone(&provider);
            handles.push(tokio::spawn(async move {
                provider.get_nodes_by_shard_id(0, DataAvailability::All).unwrap()[0]
                    .address
                    .clone()
            }));
        }

        let mut firsts: HashMap<String, usize> = HashMap::new();
        for handle in handles {
            let address = handle.await.expect("task should complete");
            *firsts.entry(address).or_insert(0) += 1;
        }

        assert_eq!(firsts.len(), 4);
        for (address, count) in firsts {
            assert_eq!(count, per_node, "node {address} was first {count} times");
        }
    }

    #[test]
    fn test_per_shard_counters_are_independent() {
        let nodes = vec![
            NodeData::new("http://obs-0a", 0),
            NodeData::new("http://obs-0b", 0),
            NodeData::new("http://obs-1a", 1),
            NodeData::new("http://obs-1b", 1),
        ];
        let base = BaseNodeProvider::new(nodes, "config.toml", NodeType::Observers).unwrap();
        let provider = CircularQueueNodesProvider::new(base);

        // Spin shard 0's counter; shard 1 must be unaffected.
        for _ in 0..3 {
            provider.get_nodes_by_shard_id(0, DataAvailability::All).unwrap();
        }

        let shard1 = provider.get_nodes_by_shard_id(1, DataAvailability::All).unwrap();
        assert_eq!(shard1[0].address, "http://obs-1a");
    }
}
