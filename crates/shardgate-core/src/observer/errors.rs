use thiserror::Error;

/// Errors surfaced by the node registry and routing providers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NodesProviderError {
    /// The configured node list was empty at construction or reload.
    #[error("empty observers list")]
    EmptyObserversList,

    /// The requested shard id is not known to the registry at all.
    #[error("observers for shard {0} are not available")]
    ShardNotAvailable(u32),

    /// A shard was configured without any non-snapshotless node, which would
    /// make it permanently unroutable under `All` availability.
    #[error("shard {0} has no eligible non-snapshotless node configured")]
    NoEligibleNodeForShard(u32),

    /// Every candidate list for a known shard came back empty.
    #[error("no observer node available for shard {0}")]
    NoAvailableNode(u32),

    /// The provider was built without backing nodes and rejects every call.
    #[error("{0} provider is disabled")]
    Disabled(String),

    /// The configuration file backing a reload could not be loaded.
    #[error("cannot load node configuration: {0}")]
    InvalidConfiguration(String),
}
