use std::sync::Arc;

use tracing::{debug, warn};

use super::{BlockQueryOptions, ProcessError};
use crate::{
    observer::NodesProvider,
    transport::{get_typed, RestClient},
    types::{Block, BlockData, DataAvailability},
};

/// Fetches the block each shard produced in a given round.
pub struct BlocksProcessor {
    provider: Arc<dyn NodesProvider>,
    client: Arc<dyn RestClient>,
}

impl BlocksProcessor {
    #[must_use]
    pub fn new(provider: Arc<dyn NodesProvider>, client: Arc<dyn RestClient>) -> Self {
        Self { provider, client }
    }

    /// Returns the blocks produced in `round`, one per shard that has one,
    /// ordered by ascending shard id with the metachain last.
    ///
    /// A shard where no observer answers is skipped rather than failing the
    /// whole query; rounds where a shard produced no block are expected.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Provider`] when the registry cannot route any
    /// shard at all.
    pub async fn blocks_by_round(
        &self,
        round: u64,
        options: BlockQueryOptions,
    ) -> Result<Vec<Block>, ProcessError> {
        let path = format!("/block/by-round/{round}?withTxs={}", options.with_txs);

        let mut blocks = Vec::new();
        for shard_id in self.provider.shard_ids() {
            match self.block_from_shard(shard_id, &path).await? {
                Some(block) => blocks.push(block),
                None => debug!(shard = shard_id, round, "no block for round"),
            }
        }

        Ok(blocks)
    }

    async fn block_from_shard(
        &self,
        shard_id: u32,
        path: &str,
    ) -> Result<Option<Block>, ProcessError> {
        let observers = self
            .provider
            .get_nodes_by_shard_id(shard_id, DataAvailability::All)?;

        for observer in &observers {
            match get_typed::<BlockData>(&*self.client, &observer.address, path).await {
                Ok(data) => return Ok(Some(data.block)),
                Err(err) => {
                    warn!(
                        observer = %observer.address,
                        shard = shard_id,
                        error = %err,
                        "block query failed, trying next observer"
                    );
                }
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use bytes::Bytes;

    use super::*;
    use crate::{
        observer::{BaseNodeProvider, SimpleNodesProvider},
        transport::TransportError,
        types::{NodeData, NodeType, METACHAIN_SHARD_ID},
    };

    /// Serves a canned block per address; missing addresses answer 500.
    struct BlockClient {
        responses: HashMap<String, String>,
    }

    #[async_trait]
    impl RestClient for BlockClient {
        async fn call_get(
            &self,
            address: &str,
            _path: &str,
        ) -> Result<(u16, Bytes), TransportError> {
            match self.responses.get(address) {
                Some(body) => Ok((200, Bytes::from(body.clone()))),
                None => Ok((500, Bytes::new())),
            }
        }

        async fn call_post(
            &self,
            _address: &str,
            _path: &str,
            _body: Bytes,
        ) -> Result<(u16, Bytes), TransportError> {
            Ok((404, Bytes::new()))
        }
    }

    fn block_body(shard: u32, round: u64) -> String {
        format!(
            r#"{{"data":{{"block":{{"nonce":10,"round":{round},"epoch":1,"hash":"h{shard}","shard":{shard},"prevBlockHash":"p","stateRootHash":"s","timestamp":0,"status":"on-chain","miniblocks":[]}}}},"error":"","code":"successful"}}"#
        )
    }

    fn provider() -> Arc<dyn NodesProvider> {
        let nodes = vec![
            NodeData::new("http://obs-0", 0),
            NodeData::new("http://obs-0-bis", 0),
            NodeData::new("http://obs-1", 1),
            NodeData::new("http://meta", METACHAIN_SHARD_ID),
        ];
        let base = BaseNodeProvider::new(nodes, "config.toml", NodeType::Observers).unwrap();
        Arc::new(SimpleNodesProvider::new(base))
    }

    #[tokio::test]
    async fn test_blocks_by_round_collects_every_shard_in_order() {
        let client = Arc::new(BlockClient {
            responses: HashMap::from([
                ("http://obs-0".to_string(), block_body(0, 7)),
                ("http://obs-1".to_string(), block_body(1, 7)),
                ("http://meta".to_string(), block_body(METACHAIN_SHARD_ID, 7)),
            ]),
        });

        let processor = BlocksProcessor::new(provider(), client);
        let blocks = processor
            .blocks_by_round(7, BlockQueryOptions::default())
            .await
            .unwrap();

        let shards: Vec<u32> = blocks.iter().map(|b| b.shard).collect();
        assert_eq!(shards, vec![0, 1, METACHAIN_SHARD_ID]);
    }

    #[tokio::test]
    async fn test_failed_observer_falls_through_to_next() {
        // obs-0 answers 500, obs-0-bis has the block.
        let client = Arc::new(BlockClient {
            responses: HashMap::from([
                ("http://obs-0-bis".to_string(), block_body(0, 7)),
                ("http://obs-1".to_string(), block_body(1, 7)),
                ("http://meta".to_string(), block_body(METACHAIN_SHARD_ID, 7)),
            ]),
        });

        let processor = BlocksProcessor::new(provider(), client);
        let blocks = processor
            .blocks_by_round(7, BlockQueryOptions::default())
            .await
            .unwrap();

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].hash, "h0");
    }

    #[tokio::test]
    async fn test_shard_with_no_block_is_skipped() {
        // Shard 1 has no answer anywhere; the rest of the round survives.
        let client = Arc::new(BlockClient {
            responses: HashMap::from([
                ("http://obs-0".to_string(), block_body(0, 7)),
                ("http://meta".to_string(), block_body(METACHAIN_SHARD_ID, 7)),
            ]),
        });

        let processor = BlocksProcessor::new(provider(), client);
        let blocks = processor
            .blocks_by_round(7, BlockQueryOptions::default())
            .await
            .unwrap();

        let shards: Vec<u32> = blocks.iter().map(|b| b.shard).collect();
        assert_eq!(shards, vec![0, METACHAIN_SHARD_ID]);
    }
}
