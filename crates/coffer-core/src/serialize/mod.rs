mod cbor;

use crate::error::InternalError;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use thiserror::Error as ThisError;

/// Generic CBOR serialization infrastructure.
///
/// This module is format-level only:
/// - No table-layer constants or policy limits are defined here.
/// - Callers that need bounded decode must pass explicit limits.
/// - Engine-specific decode policy belongs in the table layer.

///
/// SerializeError
///

#[derive(Debug, ThisError)]
pub enum SerializeError {
    #[error("serialize error: {0}")]
    Serialize(String),

    #[error("deserialize error: {0}")]
    Deserialize(String),

    #[error("deserialize size limit exceeded: {len} bytes (limit {max_bytes})")]
    DeserializeSizeLimitExceeded { len: usize, max_bytes: usize },
}

///
/// SerializeErrorKind
///
/// Stable error-kind taxonomy for serializer failures.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SerializeErrorKind {
    Serialize,
    Deserialize,
    DeserializeSizeLimitExceeded,
}

impl SerializeErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Serialize => "serialize",
            Self::Deserialize => "deserialize",
            Self::DeserializeSizeLimitExceeded => "deserialize_size_limit_exceeded",
        }
    }
}

impl fmt::Display for SerializeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SerializeError {
    /// Return a stable error kind independent of backend error-message text.
    #[must_use]
    pub const fn kind(&self) -> SerializeErrorKind {
        match self {
            Self::Serialize(_) => SerializeErrorKind::Serialize,
            Self::Deserialize(_) => SerializeErrorKind::Deserialize,
            Self::DeserializeSizeLimitExceeded { .. } => {
                SerializeErrorKind::DeserializeSizeLimitExceeded
            }
        }
    }
}

impl From<SerializeError> for InternalError {
    fn from(err: SerializeError) -> Self {
        match err.kind() {
            // Encode-side failures are an unsupported payload, not damage.
            SerializeErrorKind::Serialize => Self::serialize_unsupported(err.to_string()),
            // Stored bytes the codec cannot parse are a corruption signal.
            SerializeErrorKind::Deserialize
            | SerializeErrorKind::DeserializeSizeLimitExceeded => {
                Self::serialize_corruption(err.to_string())
            }
        }
    }
}

/// Serialize a value into CBOR bytes.
pub fn serialize<T>(ty: &T) -> Result<Vec<u8>, SerializeError>
where
    T: Serialize,
{
    cbor::serialize(ty)
}

/// Deserialize a value produced by [`serialize`].
pub fn deserialize<T>(bytes: &[u8]) -> Result<T, SerializeError>
where
    T: DeserializeOwned,
{
    cbor::deserialize(bytes)
}

/// Deserialize a value produced by [`serialize`], with an explicit size limit.
///
/// Size limits are caller policy, not serialization-format policy.
pub fn deserialize_bounded<T>(bytes: &[u8], max_bytes: usize) -> Result<T, SerializeError>
where
    T: DeserializeOwned,
{
    cbor::deserialize_bounded(bytes, max_bytes)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorClass, ErrorOrigin};

    #[test]
    fn round_trip_preserves_value() {
        let value = vec![1u64, 2, 3];
        let bytes = serialize(&value).expect("serialize");
        let decoded: Vec<u64> = deserialize(&bytes).expect("deserialize");
        assert_eq!(decoded, value);
    }

    #[test]
    fn malformed_bytes_map_to_corruption() {
        let err = deserialize::<Vec<u64>>(&[0xFF, 0xFF, 0xFF]).expect_err("must fail");
        assert_eq!(err.kind(), SerializeErrorKind::Deserialize);

        let internal = InternalError::from(err);
        assert_eq!(internal.class, ErrorClass::Corruption);
        assert_eq!(internal.origin, ErrorOrigin::Serialize);
    }

    #[test]
    fn bounded_decode_rejects_oversized_payload() {
        let bytes = serialize(&vec![0u8; 64]).expect("serialize");
        let err = deserialize_bounded::<Vec<u8>>(&bytes, 8).expect_err("must fail");
        assert_eq!(err.kind(), SerializeErrorKind::DeserializeSizeLimitExceeded);
    }
}
