use serde::{Deserialize, Serialize};

/// Sentinel shard id of the metachain, the coordinating shard that
/// notarizes shard blocks.
pub const METACHAIN_SHARD_ID: u32 = 0xFFFF_FFFF;

/// Availability mode a caller requests data under.
///
/// `All` is the default full node set and tolerates stale data; `Recent`
/// prefers snapshotless nodes for light/fast queries over recent state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataAvailability {
    All,
    Recent,
}

impl DataAvailability {
    /// Static label used in logs and cache keys.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Recent => "recent",
        }
    }
}

/// Which node pool a provider serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Observers,
    FullHistoryNodes,
}

impl NodeType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Observers => "observers",
            Self::FullHistoryNodes => "full history nodes",
        }
    }
}

/// One backend observer node as known to the registry.
///
/// Immutable per snapshot except for `is_synced`, which is refreshed by the
/// periodic sync-state checker. Identity is `(address, shard_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    pub address: String,
    #[serde(rename = "shardId")]
    pub shard_id: u32,
    #[serde(default, rename = "isFallback")]
    pub is_fallback: bool,
    #[serde(default, rename = "isSnapshotless")]
    pub is_snapshotless: bool,
    #[serde(default, rename = "isSynced")]
    pub is_synced: bool,
}

impl NodeData {
    /// Creates a regular, synced node. Flags are adjusted through the
    /// builder-style helpers below.
    #[must_use]
    pub fn new(address: impl Into<String>, shard_id: u32) -> Self {
        Self {
            address: address.into(),
            shard_id,
            is_fallback: false,
            is_snapshotless: false,
            is_synced: true,
        }
    }

    #[must_use]
    pub fn fallback(mut self) -> Self {
        self.is_fallback = true;
        self
    }

    #[must_use]
    pub fn snapshotless(mut self) -> Self {
        self.is_snapshotless = true;
        self
    }

    #[must_use]
    pub fn with_synced(mut self, synced: bool) -> Self {
        self.is_synced = synced;
        self
    }

    /// Returns `true` if `other` names the same node (same address in the
    /// same shard), regardless of the mutable flags.
    #[must_use]
    pub fn same_node(&self, other: &Self) -> bool {
        self.address == other.address && self.shard_id == other.shard_id
    }
}

/// Outcome of a registry reload request.
///
/// `ok_request = false` means the live registry was left untouched;
/// `description` explains what happened either way.
#[derive(Debug, Clone, Serialize)]
pub struct ReloadResponse {
    #[serde(rename = "okRequest")]
    pub ok_request: bool,
    pub description: String,
    pub error: String,
}

impl ReloadResponse {
    #[must_use]
    pub fn ok(description: impl Into<String>) -> Self {
        Self { ok_request: true, description: description.into(), error: String::new() }
    }

    #[must_use]
    pub fn failed(description: impl Into<String>, error: impl Into<String>) -> Self {
        Self { ok_request: false, description: description.into(), error: error.into() }
    }
}

/// Generic response envelope used by every observer endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub code: String,
}

/// A transaction as carried inside a miniblock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub receiver: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub source_shard: u32,
    #[serde(default)]
    pub destination_shard: u32,
}

/// Miniblock type carrying peer (validator) state changes. Its transactions
/// are never surfaced in hyperblocks.
pub const PEER_BLOCK_TYPE: &str = "PeerBlock";

/// A miniblock: a batch of transactions moving between a source and a
/// destination shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniBlock {
    pub hash: String,
    #[serde(rename = "type")]
    pub block_type: String,
    pub source_shard: u32,
    pub destination_shard: u32,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// An account whose state was altered by a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlteredAccount {
    pub address: String,
    #[serde(default)]
    pub balance: String,
}

/// A block as returned by an observer, either from a regular shard or the
/// metachain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub nonce: u64,
    pub round: u64,
    #[serde(default)]
    pub epoch: u32,
    pub hash: String,
    pub shard: u32,
    #[serde(default)]
    pub prev_block_hash: String,
    #[serde(default)]
    pub state_root_hash: String,
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub miniblocks: Vec<MiniBlock>,
    #[serde(default)]
    pub altered_accounts: Option<Vec<AlteredAccount>>,
}

/// Envelope an observer wraps a single block in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockData {
    pub block: Block,
}

/// A shard block entry inside a hyperblock, one per notarized shard block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotarizedBlock {
    pub hash: String,
    pub nonce: u64,
    pub round: u64,
    pub shard: u32,
    #[serde(default)]
    pub root_hash: String,
    /// Always present, empty when the shard block carried no miniblocks.
    pub mini_block_hashes: Vec<String>,
    pub altered_accounts: Vec<AlteredAccount>,
}

/// A proxy-synthesized logical block: one metachain block merged with every
/// shard block it notarizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hyperblock {
    pub hash: String,
    #[serde(default)]
    pub prev_block_hash: String,
    #[serde(default)]
    pub state_root_hash: String,
    pub nonce: u64,
    pub round: u64,
    pub epoch: u32,
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub status: String,
    pub num_txs: u64,
    pub shard_blocks: Vec<NotarizedBlock>,
    pub transactions: Vec<Transaction>,
}

/// One node's heartbeat as reported by an observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatEntry {
    pub public_key: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(rename = "receivedShardID", default)]
    pub received_shard_id: u32,
    #[serde(rename = "computedShardID", default)]
    pub computed_shard_id: u32,
    #[serde(default)]
    pub node_display_name: String,
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub peer_type: String,
}

/// Heartbeat list as returned by one observer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeartbeatData {
    pub heartbeats: Vec<HeartbeatEntry>,
}

/// ESDT token supply figures, base-10 big-integer strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EsdtSupply {
    pub supply: String,
    pub minted: String,
    pub burned: String,
    #[serde(default)]
    pub initial_minted: String,
    #[serde(default)]
    pub recomputed_supply: bool,
}

impl Default for EsdtSupply {
    fn default() -> Self {
        Self {
            supply: "0".to_string(),
            minted: "0".to_string(),
            burned: "0".to_string(),
            initial_minted: "0".to_string(),
            recomputed_supply: false,
        }
    }
}

/// Node status metrics probed by the sync checker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeStatusMetrics {
    #[serde(rename = "erd_nonce")]
    pub nonce: u64,
    #[serde(rename = "erd_probable_highest_nonce")]
    pub probable_highest_nonce: u64,
}

/// `/node/status` payload wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeStatusData {
    pub metrics: NodeStatusMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_data_builders() {
        let node = NodeData::new("http://10.0.0.1:8080", 2).fallback().with_synced(false);
        assert_eq!(node.shard_id, 2);
        assert!(node.is_fallback);
        assert!(!node.is_snapshotless);
        assert!(!node.is_synced);
    }

    #[test]
    fn test_same_node_ignores_flags() {
        let a = NodeData::new("http://a", 0);
        let b = NodeData::new("http://a", 0).fallback().with_synced(false);
        assert!(a.same_node(&b));

        let c = NodeData::new("http://a", 1);
        assert!(!a.same_node(&c));
    }

    #[test]
    fn test_node_data_deserialization_defaults() {
        let node: NodeData =
            serde_json::from_str(r#"{"address":"http://a","shardId":4294967295}"#).unwrap();
        assert_eq!(node.shard_id, METACHAIN_SHARD_ID);
        assert!(!node.is_fallback);
        assert!(!node.is_snapshotless);
        assert!(!node.is_synced);
    }

    #[test]
    fn test_block_deserialization() {
        let raw = r#"{
            "nonce": 10,
            "round": 11,
            "hash": "abcd",
            "shard": 1,
            "miniblocks": [
                {
                    "hash": "mb1",
                    "type": "TxBlock",
                    "sourceShard": 1,
                    "destinationShard": 0,
                    "transactions": [{"hash": "tx1", "sourceShard": 1, "destinationShard": 0}]
                }
            ]
        }"#;
        let block: Block = serde_json::from_str(raw).unwrap();
        assert_eq!(block.miniblocks.len(), 1);
        assert_eq!(block.miniblocks[0].transactions[0].hash, "tx1");
        assert!(block.altered_accounts.is_none());
    }

    #[test]
    fn test_heartbeat_shard_id_field_names() {
        let raw = r#"{"publicKey":"pk1","isActive":true,"receivedShardID":1,"computedShardID":2}"#;
        let entry: HeartbeatEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.received_shard_id, 1);
        assert_eq!(entry.computed_shard_id, 2);
    }
}
