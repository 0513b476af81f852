use std::collections::HashMap;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::types::{DataAvailability, NodeData};

/// Minimum number of synced regular nodes a shard must retain before the
/// reconciliation pass starts substituting the last-known-good backup.
/// Snapshotless partitions are allowed to drain completely; callers fall
/// back to regular nodes instead.
const MIN_SYNCED_NODES_ALL: usize = 1;
const MIN_SYNCED_NODES_RECENT: usize = 0;

/// Per-availability-mode container of the four node lists plus the
/// one-slot-per-shard backup map.
///
/// Invariants:
/// - a node appears in at most one of the four lists at a time;
/// - `last_synced` holds a shard's most recently known-good node and is
///   cleared only when a *regular* node re-syncs for that shard;
/// - the same node may be both the backup and an out-of-sync entry, the two
///   structures serve separate purposes.
///
/// All mutation goes through [`update_nodes`](Self::update_nodes), which runs
/// the whole reconciliation pass under the write lock. Read views are
/// memoized in a lock-free cache invalidated on structural change.
pub struct NodesHolder {
    availability: DataAvailability,
    shard_ids: Vec<u32>,
    inner: RwLock<HolderState>,
    view_cache: DashMap<String, Vec<NodeData>>,
}

#[derive(Default)]
struct HolderState {
    synced_nodes: Vec<NodeData>,
    out_of_sync_nodes: Vec<NodeData>,
    synced_fallback_nodes: Vec<NodeData>,
    out_of_sync_fallback_nodes: Vec<NodeData>,
    last_synced: HashMap<u32, NodeData>,
}

fn count_for_shard(nodes: &[NodeData], shard_id: u32) -> usize {
    nodes.iter().filter(|n| n.shard_id == shard_id).count()
}

fn nodes_for_shard(nodes: &[NodeData], shard_id: u32) -> Vec<NodeData> {
    nodes.iter().filter(|n| n.shard_id == shard_id).cloned().collect()
}

fn remove_node(nodes: &mut Vec<NodeData>, node: &NodeData) -> bool {
    let before = nodes.len();
    nodes.retain(|n| !n.same_node(node));
    nodes.len() != before
}

/// Appends `node`, or refreshes the stored flags when the node is already
/// present. Dedup is by `(address, shard_id)`.
fn push_unique(nodes: &mut Vec<NodeData>, node: NodeData) {
    if let Some(existing) = nodes.iter_mut().find(|n| n.same_node(&node)) {
        *existing = node;
    } else {
        nodes.push(node);
    }
}

impl NodesHolder {
    /// Builds a holder from the configured node set.
    ///
    /// Nodes outside this holder's availability partition are ignored; the
    /// remainder is split into the synced and synced-fallback lists (every
    /// configured node starts out considered synced).
    #[must_use]
    pub fn new(nodes: &[NodeData], shard_ids: Vec<u32>, availability: DataAvailability) -> Self {
        let mut state = HolderState::default();
        for node in nodes.iter().filter(|n| Self::accepts_node(availability, n)) {
            let node = node.clone().with_synced(true);
            if node.is_fallback {
                state.synced_fallback_nodes.push(node);
            } else {
                state.synced_nodes.push(node);
            }
        }

        Self { availability, shard_ids, inner: RwLock::new(state), view_cache: DashMap::new() }
    }

    fn accepts_node(availability: DataAvailability, node: &NodeData) -> bool {
        match availability {
            DataAvailability::All => !node.is_snapshotless,
            DataAvailability::Recent => node.is_snapshotless,
        }
    }

    fn min_synced(&self) -> usize {
        match self.availability {
            DataAvailability::All => MIN_SYNCED_NODES_ALL,
            DataAvailability::Recent => MIN_SYNCED_NODES_RECENT,
        }
    }

    /// The availability mode this holder serves.
    #[must_use]
    pub fn availability(&self) -> DataAvailability {
        self.availability
    }

    /// Reconciles the holder against a full node set carrying freshly
    /// observed sync flags.
    ///
    /// This is the single mutation entry point. The pass is ordered: nodes
    /// that fell out of sync are processed before newly synced ones, and the
    /// fallback-removal checks run before backup substitution. The whole
    /// pass holds the write lock because the per-node decisions reference
    /// shared backup state.
    pub fn update_nodes(&self, all_nodes: &[NodeData]) {
        let mut newly_synced: Vec<&NodeData> = Vec::new();
        let mut newly_synced_fallback: Vec<&NodeData> = Vec::new();
        let mut newly_out_of_sync: Vec<&NodeData> = Vec::new();

        for node in all_nodes.iter().filter(|n| Self::accepts_node(self.availability, n)) {
            if node.is_synced {
                if node.is_fallback {
                    newly_synced_fallback.push(node);
                } else {
                    newly_synced.push(node);
                }
            } else {
                newly_out_of_sync.push(node);
            }
        }

        let mut state = self.inner.write();

        // Fast path: same synced counts and nothing fell out of sync means
        // no structural change is possible.
        if newly_synced.len() == state.synced_nodes.len() &&
            newly_synced_fallback.len() == state.synced_fallback_nodes.len() &&
            newly_out_of_sync.is_empty()
        {
            self.log_shard_summary(&state);
            return;
        }

        for node in &newly_out_of_sync {
            if node.is_fallback {
                self.handle_out_of_sync_fallback(&mut state, node);
            } else {
                self.handle_out_of_sync_regular(&mut state, node);
            }
        }

        for node in &newly_synced {
            remove_node(&mut state.out_of_sync_nodes, node);
            push_unique(&mut state.synced_nodes, (*node).clone().with_synced(true));
            // Fresh regular data supersedes the backup.
            if state.last_synced.remove(&node.shard_id).is_some() {
                debug!(
                    shard = node.shard_id,
                    observer = %node.address,
                    "regular node re-synced, clearing shard backup"
                );
            }
        }

        for node in &newly_synced_fallback {
            remove_node(&mut state.out_of_sync_fallback_nodes, node);
            push_unique(&mut state.synced_fallback_nodes, (*node).clone().with_synced(true));
        }

        self.log_shard_summary(&state);
        // Invalidated under the write lock so a concurrent reader cannot
        // repopulate the cache from pre-mutation state afterwards.
        self.view_cache.clear();
    }

    fn handle_out_of_sync_fallback(&self, state: &mut HolderState, node: &NodeData) {
        let shard_id = node.shard_id;
        let regular_synced = count_for_shard(&state.synced_nodes, shard_id);
        let fallback_synced = count_for_shard(&state.synced_fallback_nodes, shard_id);

        // `fallback_synced` still counts this node; strictly more than the
        // minimum means removal leaves the shard at or above it.
        let covered_without_it = regular_synced >= 1 || fallback_synced > self.min_synced();
        let has_backup = state.last_synced.contains_key(&shard_id);

        if covered_without_it || has_backup {
            if remove_node(&mut state.synced_fallback_nodes, node) {
                debug!(
                    shard = shard_id,
                    observer = %node.address,
                    "fallback node out of sync, moving to out-of-sync fallback list"
                );
            }
            push_unique(
                &mut state.out_of_sync_fallback_nodes,
                node.clone().with_synced(false),
            );
            return;
        }

        // Nothing else can route this shard. Keep the node in the active
        // list, flag refreshed, until something better shows up.
        warn!(
            shard = shard_id,
            observer = %node.address,
            "fallback node out of sync but it is the only route for its shard, keeping it"
        );
        remove_node(&mut state.out_of_sync_fallback_nodes, node);
        push_unique(&mut state.synced_fallback_nodes, node.clone().with_synced(false));
    }

    fn handle_out_of_sync_regular(&self, state: &mut HolderState, node: &NodeData) {
        let shard_id = node.shard_id;
        let currently_synced = state.synced_nodes.iter().any(|n| n.same_node(node));

        if !currently_synced {
            push_unique(&mut state.out_of_sync_nodes, node.clone().with_synced(false));
            return;
        }

        let synced_in_shard = count_for_shard(&state.synced_nodes, shard_id);
        if synced_in_shard > self.min_synced() {
            remove_node(&mut state.synced_nodes, node);
            push_unique(&mut state.out_of_sync_nodes, node.clone().with_synced(false));
            debug!(
                shard = shard_id,
                observer = %node.address,
                "node out of sync, shard still has synced nodes"
            );
            return;
        }

        // Removing this node drops the shard below its minimum. Record it as
        // the last-known-good backup before removal so the shard stays
        // routable with stale data.
        state.last_synced.insert(shard_id, node.clone().with_synced(false));
        remove_node(&mut state.synced_nodes, node);
        push_unique(&mut state.out_of_sync_nodes, node.clone().with_synced(false));
        warn!(
            availability = self.availability.as_str(),
            shard = shard_id,
            observer = %node.address,
            "shard left without synced regular nodes, keeping last known good node as backup"
        );
    }

    fn log_shard_summary(&self, state: &HolderState) {
        for shard_id in &self.shard_ids {
            let mut active = count_for_shard(&state.synced_nodes, *shard_id) +
                count_for_shard(&state.synced_fallback_nodes, *shard_id);
            if active == 0 && state.last_synced.contains_key(shard_id) {
                active = 1;
            }
            info!(
                availability = self.availability.as_str(),
                shard = shard_id,
                active_nodes = active,
                "shard observer summary"
            );
        }
    }

    fn cached_view(
        &self,
        kind: &str,
        shard_id: u32,
        compute: impl FnOnce(&HolderState) -> Vec<NodeData>,
    ) -> Vec<NodeData> {
        let key = format!("{kind}_{shard_id}");
        if let Some(hit) = self.view_cache.get(&key) {
            return hit.clone();
        }

        // Compute and insert while holding the read lock: `update_nodes`
        // clears the cache under the write lock, so an insert here can never
        // land after a clear for state it did not observe.
        let state = self.inner.read();
        let computed = compute(&state);
        self.view_cache.insert(key, computed.clone());
        computed
    }

    /// Synced regular nodes for one shard, in stored order.
    #[must_use]
    pub fn synced_nodes(&self, shard_id: u32) -> Vec<NodeData> {
        self.cached_view("synced", shard_id, |s| nodes_for_shard(&s.synced_nodes, shard_id))
    }

    /// Synced fallback nodes for one shard.
    #[must_use]
    pub fn synced_fallback_nodes(&self, shard_id: u32) -> Vec<NodeData> {
        self.cached_view("synced_fallback", shard_id, |s| {
            nodes_for_shard(&s.synced_fallback_nodes, shard_id)
        })
    }

    /// Out-of-sync regular nodes for one shard (stale data, last resorts).
    #[must_use]
    pub fn out_of_sync_nodes(&self, shard_id: u32) -> Vec<NodeData> {
        self.cached_view("out_of_sync", shard_id, |s| {
            nodes_for_shard(&s.out_of_sync_nodes, shard_id)
        })
    }

    /// Out-of-sync fallback nodes for one shard.
    #[must_use]
    pub fn out_of_sync_fallback_nodes(&self, shard_id: u32) -> Vec<NodeData> {
        self.cached_view("out_of_sync_fallback", shard_id, |s| {
            nodes_for_shard(&s.out_of_sync_fallback_nodes, shard_id)
        })
    }

    /// The shard's last-known-good backup node, if any. Reported with
    /// `is_synced = false`.
    #[must_use]
    pub fn last_synced_node(&self, shard_id: u32) -> Option<NodeData> {
        self.inner.read().last_synced.get(&shard_id).cloned()
    }

    /// Count of nodes currently able to serve the shard without degradation.
    #[must_use]
    pub fn active_node_count(&self, shard_id: u32) -> usize {
        let state = self.inner.read();
        let active = count_for_shard(&state.synced_nodes, shard_id) +
            count_for_shard(&state.synced_fallback_nodes, shard_id);
        if active == 0 && state.last_synced.contains_key(&shard_id) {
            return 1;
        }
        active
    }
}
