use std::{collections::HashMap, sync::Arc};

use tracing::warn;

use super::ProcessError;
use crate::{
    observer::NodesProvider,
    transport::{get_typed, RestClient},
    types::{DataAvailability, HeartbeatData, HeartbeatEntry},
};

const HEARTBEAT_PATH: &str = "/node/heartbeatstatus";

/// Merges per-shard heartbeat reports into one network-wide view.
pub struct NodeGroupProcessor {
    provider: Arc<dyn NodesProvider>,
    client: Arc<dyn RestClient>,
}

impl NodeGroupProcessor {
    #[must_use]
    pub fn new(provider: Arc<dyn NodesProvider>, client: Arc<dyn RestClient>) -> Self {
        Self { provider, client }
    }

    /// Queries one observer per shard and merges the reported heartbeats
    /// into a single list, deduplicated by public key and sorted by it.
    ///
    /// For duplicate keys seen across shards the active report wins; between
    /// two reports with the same activity the first seen is kept.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::HeartbeatNotAvailable`] when every observer
    /// of any shard fails to produce a non-empty report. Heartbeats are an
    /// all-shards-or-nothing view.
    pub async fn get_heartbeat_data(&self) -> Result<HeartbeatData, ProcessError> {
        let mut merged: HashMap<String, HeartbeatEntry> = HashMap::new();

        for shard_id in self.provider.shard_ids() {
            let entries = self.heartbeats_from_shard(shard_id).await?;
            for entry in entries {
                if !belongs_to_shard(&entry, shard_id) {
                    continue;
                }
                match merged.get(&entry.public_key) {
                    Some(existing) if existing.is_active || !entry.is_active => {}
                    _ => {
                        merged.insert(entry.public_key.clone(), entry);
                    }
                }
            }
        }

        let mut heartbeats: Vec<HeartbeatEntry> = merged.into_values().collect();
        heartbeats.sort_by(|a, b| a.public_key.cmp(&b.public_key));

        Ok(HeartbeatData { heartbeats })
    }

    async fn heartbeats_from_shard(
        &self,
        shard_id: u32,
    ) -> Result<Vec<HeartbeatEntry>, ProcessError> {
        let observers = self
            .provider
            .get_nodes_by_shard_id(shard_id, DataAvailability::All)?;

        for observer in &observers {
            match get_typed::<HeartbeatData>(&*self.client, &observer.address, HEARTBEAT_PATH)
                .await
            {
                Ok(data) if !data.heartbeats.is_empty() => return Ok(data.heartbeats),
                Ok(_) => {
                    warn!(
                        observer = %observer.address,
                        shard = shard_id,
                        "observer returned an empty heartbeat list, trying next"
                    );
                }
                Err(err) => {
                    warn!(
                        observer = %observer.address,
                        shard = shard_id,
                        error = %err,
                        "heartbeat query failed, trying next observer"
                    );
                }
            }
        }

        Err(ProcessError::HeartbeatNotAvailable)
    }
}

/// An entry counts toward a shard when the node computed itself into it or
/// was last seen there after shuffling.
fn belongs_to_shard(entry: &HeartbeatEntry, shard_id: u32) -> bool {
    entry.computed_shard_id == shard_id || entry.received_shard_id == shard_id
}
