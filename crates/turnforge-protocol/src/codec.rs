//! Codec trait and implementations for serializing session envelopes.
//!
//! The store and the cache both hold the same bytes for a session. That
//! only works if encoding is deterministic: two equal values must encode
//! to byte-identical output. Every codec in this module upholds that, and
//! every type that goes through one avoids unordered containers.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust values to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because a single codec instance is shared by
/// every in-flight request task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented
    /// in this format.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Struct fields are written in declaration order, so output is stable
/// for equal values. This is behind the `json` feature flag (enabled by
/// default).
///
/// ## Example
///
/// ```rust
/// use turnforge_protocol::{Codec, Id, JsonCodec};
///
/// let codec = JsonCodec;
/// let id = Id::generate();
///
/// let bytes = codec.encode(&id).unwrap();
/// let decoded: Id = codec.decode(&bytes).unwrap();
/// assert_eq!(id, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u32,
        players: Vec<String>,
        turn: u32,
    }

    fn row() -> Row {
        Row {
            id: 7,
            players: vec!["a".into(), "b".into()],
            turn: 3,
        }
    }

    #[test]
    fn test_encode_equal_values_byte_identical() {
        let codec = JsonCodec;
        let a = codec.encode(&row()).unwrap();
        let b = codec.encode(&row()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_decode_restores_value() {
        let codec = JsonCodec;
        let bytes = codec.encode(&row()).unwrap();
        let decoded: Row = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, row());
    }

    #[test]
    fn test_decode_truncated_returns_error() {
        let codec = JsonCodec;
        let bytes = codec.encode(&row()).unwrap();
        let result: Result<Row, _> = codec.decode(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
