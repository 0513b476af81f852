use std::sync::Arc;

use num_bigint::BigInt;
use tracing::warn;

use super::{ProcessError, ScQueryService};
use crate::{
    observer::NodesProvider,
    transport::{get_typed, RestClient},
    types::{DataAvailability, EsdtSupply, METACHAIN_SHARD_ID},
};

/// Aggregates per-shard ESDT supply figures into network totals.
pub struct EsdtSupplyProcessor {
    provider: Arc<dyn NodesProvider>,
    client: Arc<dyn RestClient>,
    sc_query: Arc<dyn ScQueryService>,
}

impl EsdtSupplyProcessor {
    #[must_use]
    pub fn new(
        provider: Arc<dyn NodesProvider>,
        client: Arc<dyn RestClient>,
        sc_query: Arc<dyn ScQueryService>,
    ) -> Self {
        Self { provider, client, sc_query }
    }

    /// Sums supply, minted and burned for `token` across every non-metachain
    /// shard.
    ///
    /// When any shard reports a recomputed supply, the recomputed figures
    /// are authoritative totals rather than deltas, so the aggregate is
    /// flagged recomputed and minted/burned are zeroed. Fungible tokens add
    /// the genesis initial-minted amount on top of the summed supply.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::SendingRequest`] when every observer of a
    /// shard fails, and [`ProcessError::InvalidSupply`] when a shard reports
    /// a value that does not parse as a base-10 integer.
    pub async fn get_token_supply(&self, token: &str) -> Result<EsdtSupply, ProcessError> {
        let mut supply = BigInt::default();
        let mut minted = BigInt::default();
        let mut burned = BigInt::default();
        let mut recomputed = false;

        let path = format!("/network/esdt/supply/{token}");

        for shard_id in self.provider.shard_ids() {
            if shard_id == METACHAIN_SHARD_ID {
                continue;
            }

            let shard_supply = self.supply_from_shard(shard_id, &path).await?;
            supply += parse_amount(&shard_supply.supply)?;
            minted += parse_amount(&shard_supply.minted)?;
            burned += parse_amount(&shard_supply.burned)?;
            recomputed |= shard_supply.recomputed_supply;
        }

        let mut initial_minted = BigInt::default();
        if is_fungible(token) {
            let raw = self.sc_query.get_initial_minted(token).await?;
            initial_minted = parse_amount(&raw)?;
            supply += &initial_minted;
        }

        if recomputed {
            minted = BigInt::default();
            burned = BigInt::default();
        }

        Ok(EsdtSupply {
            supply: supply.to_string(),
            minted: minted.to_string(),
            burned: burned.to_string(),
            initial_minted: initial_minted.to_string(),
            recomputed_supply: recomputed,
        })
    }

    async fn supply_from_shard(
        &self,
        shard_id: u32,
        path: &str,
    ) -> Result<EsdtSupply, ProcessError> {
        let observers = self
            .provider
            .get_nodes_by_shard_id(shard_id, DataAvailability::All)?;

        for observer in &observers {
            match get_typed::<EsdtSupply>(&*self.client, &observer.address, path).await {
                Ok(data) => return Ok(data),
                Err(err) => {
                    warn!(
                        observer = %observer.address,
                        shard = shard_id,
                        error = %err,
                        "supply query failed, trying next observer"
                    );
                }
            }
        }

        Err(ProcessError::SendingRequest(shard_id))
    }
}

fn parse_amount(raw: &str) -> Result<BigInt, ProcessError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(BigInt::default());
    }
    trimmed
        .parse::<BigInt>()
        .map_err(|_| ProcessError::InvalidSupply(raw.to_string()))
}

/// Token identifiers are `TICKER-random` for fungible tokens; semi- and
/// non-fungible identifiers append a nonce segment, giving three or more
/// dash-separated parts.
fn is_fungible(token: &str) -> bool {
    token.split('-').count() < 3
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
        types::{NodeData, NodeType},
    };

    struct SupplyClient {
        responses: HashMap<String, String>,
    }

    #[async_trait]
    impl RestClient for SupplyClient {
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

    struct FixedInitialMinted(String);

    #[async_trait]
    impl ScQueryService for FixedInitialMinted {
        async fn get_initial_minted(&self, _token: &str) -> Result<String, ProcessError> {
            Ok(self.0.clone())
        }
    }

    fn supply_body(supply: &str, minted: &str, burned: &str, recomputed: bool) -> String {
        format!(
            r#"{{"data":{{"supply":"{supply}","minted":"{minted}","burned":"{burned}","recomputedSupply":{recomputed}}},"error":"","code":"successful"}}"#
        )
    }

    fn provider() -> Arc<dyn NodesProvider> {
        let nodes = vec![
            NodeData::new("http://obs-0", 0),
            NodeData::new("http://obs-1", 1),
            NodeData::new("http://meta", METACHAIN_SHARD_ID),
        ];
        let base = BaseNodeProvider::new(nodes, "config.toml", NodeType::Observers).unwrap();
        Arc::new(SimpleNodesProvider::new(base))
    }

    fn processor(responses: HashMap<String, String>, initial_minted: &str) -> EsdtSupplyProcessor {
        EsdtSupplyProcessor::new(
            provider(),
            Arc::new(SupplyClient { responses }),
            Arc::new(FixedInitialMinted(initial_minted.to_string())),
        )
    }

    #[tokio::test]
    async fn test_fungible_supply_sums_shards_and_initial_minted() {
        let processor = processor(
            HashMap::from([
                ("http://obs-0".to_string(), supply_body("100", "30", "10", false)),
                ("http://obs-1".to_string(), supply_body("200", "20", "5", false)),
            ]),
            "50",
        );

        let supply = processor.get_token_supply("WEGLD-bd4d79").await.unwrap();
        assert_eq!(supply.supply, "350"); // 100 + 200 + 50 initial
        assert_eq!(supply.minted, "50");
        assert_eq!(supply.burned, "15");
        assert_eq!(supply.initial_minted, "50");
        assert!(!supply.recomputed_supply);
    }

    #[tokio::test]
    async fn test_non_fungible_identifier_skips_initial_minted() {
        let processor = processor(
            HashMap::from([
                ("http://obs-0".to_string(), supply_body("100", "0", "0", false)),
                ("http://obs-1".to_string(), supply_body("200", "0", "0", false)),
            ]),
            "50",
        );

        let supply = processor.get_token_supply("ART-1a2b3c-05").await.unwrap();
        assert_eq!(supply.supply, "300");
        assert_eq!(supply.initial_minted, "0");
    }

    #[tokio::test]
    async fn test_recomputed_shard_zeroes_minted_and_burned() {
        let processor = processor(
            HashMap::from([
                ("http://obs-0".to_string(), supply_body("100", "30", "10", true)),
                ("http://obs-1".to_string(), supply_body("200", "20", "5", false)),
            ]),
            "0",
        );

        let supply = processor.get_token_supply("WEGLD-bd4d79").await.unwrap();
        assert!(supply.recomputed_supply);
        assert_eq!(supply.minted, "0");
        assert_eq!(supply.burned, "0");
        assert_eq!(supply.supply, "300");
    }

    #[tokio::test]
    async fn test_shard_exhaustion_is_a_hard_error() {
        // Shard 1 never answers.
        let processor = processor(
            HashMap::from([("http://obs-0".to_string(), supply_body("100", "0", "0", false))]),
            "0",
        );

        let err = processor.get_token_supply("WEGLD-bd4d79").await.unwrap_err();
        assert!(matches!(err, ProcessError::SendingRequest(1)));
    }

    #[tokio::test]
    async fn test_garbage_amount_is_rejected() {
        let processor = processor(
            HashMap::from([
                ("http://obs-0".to_string(), supply_body("not-a-number", "0", "0", false)),
                ("http://obs-1".to_string(), supply_body("200", "0", "0", false)),
            ]),
            "0",
        );

        let err = processor.get_token_supply("WEGLD-bd4d79").await.unwrap_err();
        assert!(matches!(err, ProcessError::InvalidSupply(_)));
    }

    #[test]
    fn test_fungibility_by_identifier_shape() {
        assert!(is_fungible("WEGLD-bd4d79"));
        assert!(is_fungible("EGLD"));
        assert!(!is_fungible("ART-1a2b3c-05"));
        assert!(!is_fungible("SFT-aaaaaa-01-extra"));
    }
}
