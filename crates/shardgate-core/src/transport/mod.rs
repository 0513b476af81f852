//! REST client seam towards observer nodes.
//!
//! The routing core never talks HTTP directly; it goes through the
//! [`RestClient`] trait, which returns the raw status code and body so the
//! caller decides how to decode. [`get_typed`] / [`post_typed`] layer the
//! standard observer envelope on top. [`HttpRestClient`] is the
//! reqwest-backed default implementation.

pub mod http;

pub use http::HttpRestClient;

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::types::ApiResponse;

/// Errors from the transport layer or envelope decoding.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TransportError {
    /// Network-level failure from the underlying HTTP client.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Observer answered with a non-200 status code.
    #[error("observer returned HTTP status {0}")]
    HttpStatus(u16),

    /// Response body could not be decoded.
    #[error("invalid response body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    /// The envelope carried an application-level error.
    #[error("observer returned error: {0}")]
    Api(String),
}

/// Byte-level REST access to one observer node. Implementations own the
/// timeout; routing never blocks indefinitely.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Issues a GET; returns the status code and raw body, even on non-2xx.
    async fn call_get(&self, address: &str, path: &str)
        -> Result<(u16, Bytes), TransportError>;

    /// Issues a POST with a JSON body; returns the status code and raw body.
    async fn call_post(
        &self,
        address: &str,
        path: &str,
        body: Bytes,
    ) -> Result<(u16, Bytes), TransportError>;
}

/// GETs `path` on `address` and decodes the standard envelope, yielding its
/// `data` payload.
///
/// # Errors
///
/// Returns [`TransportError::HttpStatus`] for non-200 responses and
/// [`TransportError::Api`] when the envelope carries an error string.
pub async fn get_typed<T: DeserializeOwned>(
    client: &dyn RestClient,
    address: &str,
    path: &str,
) -> Result<T, TransportError> {
    let (status, body) = client.call_get(address, path).await?;
    decode_envelope(status, &body)
}

/// POSTs `body` to `path` on `address` and decodes the standard envelope.
///
/// # Errors
///
/// Same taxonomy as [`get_typed`].
pub async fn post_typed<T: DeserializeOwned>(
    client: &dyn RestClient,
    address: &str,
    path: &str,
    body: Bytes,
) -> Result<T, TransportError> {
    let (status, body) = client.call_post(address, path, body).await?;
    decode_envelope(status, &body)
}

fn decode_envelope<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<T, TransportError> {
    if status != 200 {
        return Err(TransportError::HttpStatus(status));
    }

    let envelope: ApiResponse<T> = serde_json::from_slice(body)?;
    if !envelope.error.is_empty() {
        return Err(TransportError::Api(envelope.error));
    }

    Ok(envelope.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        value: u64,
    }

    #[test]
    fn test_decode_envelope_success() {
        let body = br#"{"data":{"value":7},"error":"","code":"successful"}"#;
        let payload: Payload = decode_envelope(200, body).unwrap();
        assert_eq!(payload, Payload { value: 7 });
    }

    #[test]
    fn test_decode_envelope_rejects_non_200() {
        let body = br#"{"data":{"value":7},"error":"","code":"successful"}"#;
        let err = decode_envelope::<Payload>(503, body).err().unwrap();
        assert!(matches!(err, TransportError::HttpStatus(503)));
    }

    #[test]
    fn test_decode_envelope_surfaces_api_error() {
        let body = br#"{"data":null,"error":"block not found","code":"internal_issue"}"#;
        let err = decode_envelope::<Option<Payload>>(200, body).err().unwrap();
        assert!(matches!(err, TransportError::Api(msg) if msg == "block not found"));
    }
}
