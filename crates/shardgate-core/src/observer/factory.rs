use std::{path::Path, sync::Arc};

use tracing::info;

use super::{
    errors::NodesProviderError, BaseNodeProvider, CircularQueueNodesProvider,
    DisabledNodesProvider, NodesProvider, SimpleNodesProvider,
};
use crate::{config::AppConfig, types::NodeType};

/// Builds the routing provider for one node pool from configuration.
///
/// The policy flag (`balanced_observers` / `balanced_full_history_nodes`)
/// selects circular-queue vs simple routing. An empty full-history pool
/// yields a [`DisabledNodesProvider`] instead of an error so that
/// full-history-only endpoints degrade gracefully; an empty observer pool is
/// a hard configuration error.
///
/// # Errors
///
/// Returns [`NodesProviderError::EmptyObserversList`] for an empty observer
/// pool and construction errors from [`BaseNodeProvider::new`] otherwise.
pub fn create_nodes_provider(
    config: &AppConfig,
    config_path: impl AsRef<Path>,
    node_type: NodeType,
) -> Result<Arc<dyn NodesProvider>, NodesProviderError> {
    let nodes = config.nodes_for(node_type);

    if nodes.is_empty() {
        if node_type == NodeType::FullHistoryNodes {
            info!("no full history nodes configured, provider disabled");
            return Ok(Arc::new(DisabledNodesProvider::new(node_type.as_str())));
        }
        return Err(NodesProviderError::EmptyObserversList);
    }

    let base = BaseNodeProvider::new(nodes, config_path, node_type)?;

    let balanced = match node_type {
        NodeType::Observers => config.general.balanced_observers,
        NodeType::FullHistoryNodes => config.general.balanced_full_history_nodes,
    };

    let provider: Arc<dyn NodesProvider> = if balanced {
        info!(node_type = node_type.as_str(), "using circular queue nodes provider");
        Arc::new(CircularQueueNodesProvider::new(base))
    } else {
        info!(node_type = node_type.as_str(), "using simple nodes provider");
        Arc::new(SimpleNodesProvider::new(base))
    };

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ObserverEntry, types::DataAvailability};

    fn config_with(observers: Vec<ObserverEntry>, balanced: bool) -> AppConfig {
        let mut config = AppConfig { observers, ..AppConfig::default() };
        config.general.balanced_observers = balanced;
        config
    }

    fn entry(address: &str, shard_id: u32) -> ObserverEntry {
        ObserverEntry {
            address: address.to_string(),
            shard_id,
            is_fallback: false,
            is_snapshotless: false,
        }
    }

    #[test]
    fn test_empty_observers_is_a_hard_error() {
        let config = config_with(Vec::new(), true);
        let err = create_nodes_provider(&config, "config.toml", NodeType::Observers)
            .err()
            .unwrap();
        assert_eq!(err, NodesProviderError::EmptyObserversList);
    }

    #[test]
    fn test_empty_full_history_pool_yields_disabled_provider() {
        let config = config_with(vec![entry("http://obs-0", 0)], true);
        let provider =
            create_nodes_provider(&config, "config.toml", NodeType::FullHistoryNodes).unwrap();

        let err = provider.get_nodes_by_shard_id(0, DataAvailability::All).err().unwrap();
        assert!(matches!(err, NodesProviderError::Disabled(_)));
    }

    #[test]
    fn test_balanced_flag_selects_rotation() {
        let config =
            config_with(vec![entry("http://obs-0a", 0), entry("http://obs-0b", 0)], true);
        let provider = create_nodes_provider(&config, "config.toml", NodeType::Observers).unwrap();

        let first = provider.get_nodes_by_shard_id(0, DataAvailability::All).unwrap();
        let second = provider.get_nodes_by_shard_id(0, DataAvailability::All).unwrap();
        assert_ne!(first[0].address, second[0].address);
    }

    #[test]
    fn test_unbalanced_flag_selects_stored_order() {
        let config =
            config_with(vec![entry("http://obs-0a", 0), entry("http://obs-0b", 0)], false);
        let provider = create_nodes_provider(&config, "config.toml", NodeType::Observers).unwrap();

        for _ in 0..3 {
            let nodes = provider.get_nodes_by_shard_id(0, DataAvailability::All).unwrap();
            assert_eq!(nodes[0].address, "http://obs-0a");
        }
    }
}
