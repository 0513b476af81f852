use std::{sync::Arc, time::Duration};

use futures::future::join_all;
use tokio::{sync::broadcast, time::interval};
use tracing::{debug, info, warn};

use super::NodesProvider;
use crate::{
    transport::{get_typed, RestClient},
    types::{NodeData, NodeStatusData},
};

/// Periodically probes every configured node and pushes the observed sync
/// flags into the registry.
///
/// A node counts as synced when its probable highest nonce is within
/// `tolerance_nonces` of its current nonce. A node that cannot be reached is
/// simply not synced; the registry's degradation policy decides what happens
/// next.
pub struct SyncStateChecker {
    provider: Arc<dyn NodesProvider>,
    client: Arc<dyn RestClient>,
    check_interval: Duration,
    tolerance_nonces: u64,
}

impl SyncStateChecker {
    #[must_use]
    pub fn new(
        provider: Arc<dyn NodesProvider>,
        client: Arc<dyn RestClient>,
        check_interval: Duration,
        tolerance_nonces: u64,
    ) -> Self {
        Self { provider, client, check_interval, tolerance_nonces }
    }

    /// Spawns the probe loop. One pass runs per interval tick until the
    /// shutdown channel fires.
    #[must_use]
    pub fn start_with_shutdown(
        self: Arc<Self>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.check_interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.probe_all_nodes().await;
                    }
                    _ = shutdown_rx.recv() => {
                        info!("sync state checker shutting down");
                        break;
                    }
                }
            }
        })
    }

    /// Probes every configured node concurrently and feeds the result into
    /// the registry as one reconciliation pass.
    pub async fn probe_all_nodes(&self) {
        let nodes = self.provider.configured_nodes();
        if nodes.is_empty() {
            return;
        }

        let probes: Vec<_> = nodes
            .into_iter()
            .map(|node| async move {
                let is_synced = self.probe_node(&node).await;
                node.with_synced(is_synced)
            })
            .collect();

        let probed = join_all(probes).await;

        let synced_count = probed.iter().filter(|n| n.is_synced).count();
        debug!(synced = synced_count, total = probed.len(), "sync probe pass finished");

        self.provider.update_nodes_based_on_sync_state(probed);
    }

    async fn probe_node(&self, node: &NodeData) -> bool {
        match get_typed::<NodeStatusData>(&*self.client, &node.address, "/node/status").await {
            Ok(status) => {
                let behind = status
                    .metrics
                    .probable_highest_nonce
                    .saturating_sub(status.metrics.nonce);
                behind <= self.tolerance_nonces
            }
            Err(err) => {
                warn!(
                    observer = %node.address,
                    shard = node.shard_id,
                    error = %err,
                    "sync probe failed, marking node out of sync"
                );
                false
            }
        }
    }
}
