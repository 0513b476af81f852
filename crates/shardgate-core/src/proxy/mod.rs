//! Cross-shard read aggregation.
//!
//! The processors in this module answer queries that span every shard:
//! fetching the block each shard produced in a round, assembling a
//! hyperblock from the metachain view, merging heartbeat reports, and
//! summing ESDT token supplies. Each processor asks the node registry for
//! routed observers and walks them in order until one answers.

pub mod blocks;
pub mod esdt_supply;
pub mod heartbeat;
pub mod hyperblock;

pub use blocks::BlocksProcessor;
pub use esdt_supply::EsdtSupplyProcessor;
pub use heartbeat::NodeGroupProcessor;
pub use hyperblock::HyperblockBuilder;

use async_trait::async_trait;
use thiserror::Error;

use crate::observer::NodesProviderError;

/// Errors produced while aggregating data across shards.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Every routed observer for the shard failed to answer.
    #[error("sending request error for shard {0}")]
    SendingRequest(u32),

    /// No observer in some shard returned a usable heartbeat list.
    #[error("heartbeat status not available")]
    HeartbeatNotAvailable,

    /// The node registry could not route the request.
    #[error(transparent)]
    Provider(#[from] NodesProviderError),

    /// A shard returned a supply value that does not parse as an integer.
    #[error("invalid supply value: {0}")]
    InvalidSupply(String),

    /// The metachain produced no block for the requested round.
    #[error("no metachain block for round {0}")]
    MissingMetachainBlock(u64),
}

/// Options controlling how blocks are fetched and how miniblocks are
/// attributed to shard blocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockQueryOptions {
    /// Ask observers to include full transaction bodies.
    pub with_txs: bool,
    /// Attribute miniblocks by source shard instead of destination shard.
    pub notarized_at_source: bool,
}

/// External view of a token's genesis mint, answered by a system smart
/// contract query.
#[async_trait]
pub trait ScQueryService: Send + Sync {
    /// Returns the initially minted amount for `token` as a decimal string.
    async fn get_initial_minted(&self, token: &str) -> Result<String, ProcessError>;
}
