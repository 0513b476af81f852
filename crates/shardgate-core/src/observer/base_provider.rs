use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    sync::Arc,
};

use arc_swap::ArcSwap;
use tracing::{info, warn};

use super::{errors::NodesProviderError, holder::NodesHolder};
use crate::{
    config::AppConfig,
    types::{DataAvailability, NodeData, NodeType, ReloadResponse},
};

/// Shard-indexed registry over two [`NodesHolder`] instances (regular and
/// snapshotless) with graceful degradation and atomic reload.
///
/// The holders live behind an [`ArcSwap`]: a reload builds a complete new
/// state and swaps it in a single store, so in-flight readers finish against
/// the old registry and no partial mutation is ever observable.
pub struct BaseNodeProvider {
    node_type: NodeType,
    config_path: PathBuf,
    shard_ids: Vec<u32>,
    state: ArcSwap<ProviderState>,
}

struct ProviderState {
    regular: NodesHolder,
    snapshotless: NodesHolder,
    /// Every configured node in file order, membership untouched by sync
    /// updates. Probed by the sync checker.
    all_nodes: Vec<NodeData>,
}

impl ProviderState {
    /// Partitions the configured nodes into the two holders, validating the
    /// registry invariants.
    fn build(nodes: Vec<NodeData>) -> Result<(Self, Vec<u32>), NodesProviderError> {
        if nodes.is_empty() {
            return Err(NodesProviderError::EmptyObserversList);
        }

        // Ascending order; the metachain sentinel is u32::MAX and lands last.
        let shard_ids: Vec<u32> =
            nodes.iter().map(|n| n.shard_id).collect::<BTreeSet<u32>>().into_iter().collect();

        for shard_id in &shard_ids {
            let has_eligible =
                nodes.iter().any(|n| n.shard_id == *shard_id && !n.is_snapshotless);
            if !has_eligible {
                return Err(NodesProviderError::NoEligibleNodeForShard(*shard_id));
            }
        }

        let regular = NodesHolder::new(&nodes, shard_ids.clone(), DataAvailability::All);
        let snapshotless = NodesHolder::new(&nodes, shard_ids.clone(), DataAvailability::Recent);

        Ok((Self { regular, snapshotless, all_nodes: nodes }, shard_ids))
    }
}

impl BaseNodeProvider {
    /// Builds the registry from the configured node list.
    ///
    /// # Errors
    ///
    /// Returns [`NodesProviderError::EmptyObserversList`] for an empty input
    /// and [`NodesProviderError::NoEligibleNodeForShard`] when a shard has
    /// only snapshotless nodes.
    pub fn new(
        nodes: Vec<NodeData>,
        config_path: impl AsRef<Path>,
        node_type: NodeType,
    ) -> Result<Self, NodesProviderError> {
        let (state, shard_ids) = ProviderState::build(nodes)?;

        info!(
            node_type = node_type.as_str(),
            shards = shard_ids.len(),
            nodes = state.all_nodes.len(),
            "node registry built"
        );

        Ok(Self {
            node_type,
            config_path: config_path.as_ref().to_path_buf(),
            shard_ids,
            state: ArcSwap::from_pointee(state),
        })
    }

    /// The fixed shard-id set, ascending, metachain last.
    #[must_use]
    pub fn shard_ids(&self) -> &[u32] {
        &self.shard_ids
    }

    /// Every configured node in file order, regardless of sync state.
    #[must_use]
    pub fn configured_nodes(&self) -> Vec<NodeData> {
        self.state.load().all_nodes.clone()
    }

    /// Returns the candidate nodes for one shard, best first, degrading to
    /// stale data rather than failing.
    ///
    /// Preference order for `Recent`: snapshotless-synced, regular-synced,
    /// fallback-synced, snapshotless-stale, backup, regular-stale. For
    /// `All`: regular-synced, fallback-synced, backup, regular-stale,
    /// fallback-stale.
    ///
    /// # Errors
    ///
    /// Returns [`NodesProviderError::ShardNotAvailable`] only when the shard
    /// id is entirely unknown to the registry.
    pub fn get_synced_nodes_for_shard(
        &self,
        shard_id: u32,
        availability: DataAvailability,
    ) -> Result<Vec<NodeData>, NodesProviderError> {
        if !self.shard_ids.contains(&shard_id) {
            return Err(NodesProviderError::ShardNotAvailable(shard_id));
        }

        let state = self.state.load();
        let tiers: Vec<(Vec<NodeData>, bool)> = match availability {
            DataAvailability::Recent => vec![
                (state.snapshotless.synced_nodes(shard_id), false),
                (state.regular.synced_nodes(shard_id), false),
                (state.regular.synced_fallback_nodes(shard_id), false),
                (state.snapshotless.out_of_sync_nodes(shard_id), true),
                (state.regular.last_synced_node(shard_id).into_iter().collect(), true),
                (state.regular.out_of_sync_nodes(shard_id), true),
            ],
            DataAvailability::All => vec![
                (state.regular.synced_nodes(shard_id), false),
                (state.regular.synced_fallback_nodes(shard_id), false),
                (state.regular.last_synced_node(shard_id).into_iter().collect(), true),
                (state.regular.out_of_sync_nodes(shard_id), true),
                (state.regular.out_of_sync_fallback_nodes(shard_id), true),
            ],
        };

        for (nodes, stale) in tiers {
            if nodes.is_empty() {
                continue;
            }
            if stale {
                warn!(
                    shard = shard_id,
                    availability = availability.as_str(),
                    candidates = nodes.len(),
                    "no synced observer for shard, serving stale data"
                );
            }
            return Ok(nodes);
        }

        Ok(Vec::new())
    }

    /// Returns candidates across every shard, per-shard preference applied,
    /// shards in ascending order.
    #[must_use]
    pub fn get_all_nodes(&self, availability: DataAvailability) -> Vec<NodeData> {
        let mut all = Vec::new();
        for shard_id in &self.shard_ids {
            if let Ok(mut nodes) = self.get_synced_nodes_for_shard(*shard_id, availability) {
                all.append(&mut nodes);
            }
        }
        all
    }

    /// Delegates freshly observed sync flags to both holders.
    pub fn update_nodes_based_on_sync_state(&self, nodes: &[NodeData]) {
        let state = self.state.load();
        state.regular.update_nodes(nodes);
        state.snapshotless.update_nodes(nodes);
    }

    /// Re-reads the recorded configuration file and rebuilds the registry.
    ///
    /// Build-then-swap: on any failure (unreadable file, invalid node set,
    /// changed shard set) the live registry is left untouched and the
    /// response carries `ok_request = false`.
    pub fn reload_nodes(&self, node_type: NodeType) -> ReloadResponse {
        let path = self.config_path.display().to_string();

        let config = match AppConfig::from_file(&self.config_path) {
            Ok(config) => config,
            Err(err) => {
                return ReloadResponse::failed(
                    format!("cannot read configuration file {path}"),
                    err.to_string(),
                );
            }
        };

        let (new_state, new_shard_ids) = match ProviderState::build(config.nodes_for(node_type)) {
            Ok(built) => built,
            Err(err) => {
                return ReloadResponse::failed(
                    format!("invalid {} configuration in {path}", node_type.as_str()),
                    err.to_string(),
                );
            }
        };

        if new_shard_ids != self.shard_ids {
            return ReloadResponse::failed(
                format!(
                    "different shard set in {path}: configured {} shards, provider has {}",
                    new_shard_ids.len(),
                    self.shard_ids.len()
                ),
                "shard set mismatch".to_string(),
            );
        }

        let node_count = new_state.all_nodes.len();
        self.state.store(Arc::new(new_state));
        info!(
            node_type = node_type.as_str(),
            nodes = node_count,
            "node registry reloaded"
        );

        ReloadResponse::ok(format!("reloaded {} {} from {path}", node_count, node_type.as_str()))
    }

    /// Logs a per-shard dump of every node class. Diagnostic only.
    pub fn print_nodes_in_shards(&self) {
        let state = self.state.load();
        for shard_id in &self.shard_ids {
            info!(
                node_type = self.node_type.as_str(),
                shard = shard_id,
                synced = state.regular.synced_nodes(*shard_id).len(),
                out_of_sync = state.regular.out_of_sync_nodes(*shard_id).len(),
                synced_fallback = state.regular.synced_fallback_nodes(*shard_id).len(),
                out_of_sync_fallback = state.regular.out_of_sync_fallback_nodes(*shard_id).len(),
                snapshotless_synced = state.snapshotless.synced_nodes(*shard_id).len(),
                has_backup = state.regular.last_synced_node(*shard_id).is_some(),
                "nodes in shard"
            );
        }
    }
}
