use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use super::{RestClient, TransportError};

/// Reqwest-backed [`RestClient`] with a fixed per-request timeout.
pub struct HttpRestClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpRestClient {
    /// Creates a client applying `timeout` to every request.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Network`] if the underlying client cannot
    /// be built.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self { client, timeout })
    }

    fn url(address: &str, path: &str) -> String {
        format!("{}{}", address.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl RestClient for HttpRestClient {
    async fn call_get(
        &self,
        address: &str,
        path: &str,
    ) -> Result<(u16, Bytes), TransportError> {
        let response = self
            .client
            .get(Self::url(address, path))
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok((status, body))
    }

    async fn call_post(
        &self,
        address: &str,
        path: &str,
        body: Bytes,
    ) -> Result<(u16, Bytes), TransportError> {
        let response = self
            .client
            .post(Self::url(address, path))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok((status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        assert_eq!(
            HttpRestClient::url("http://10.0.0.1:8080/", "/node/status"),
            "http://10.0.0.1:8080/node/status"
        );
        assert_eq!(
            HttpRestClient::url("http://10.0.0.1:8080", "/node/status"),
            "http://10.0.0.1:8080/node/status"
        );
    }
}
