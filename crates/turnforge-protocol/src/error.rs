//! Error types for the protocol layer.

/// Errors that can occur while encoding, decoding or parsing identifiers.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust value).
    ///
    /// Common causes: truncated cache entries, a row written by an
    /// incompatible payload schema, or an invalid board digit.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A textual identifier could not be parsed.
    #[error("invalid id: {0}")]
    InvalidId(String),
}
