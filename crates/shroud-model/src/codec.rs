//! Codec trait and implementations for the durable record stores.
//!
//! The stores (lobby and arena definitions, player snapshots) don't care
//! how a record is serialized, only that it implements
//! [`Codec`]. [`JsonCodec`] is the only implementation today: stored files
//! stay human-readable so admins can inspect and hand-fix them.

use serde::{Serialize, de::DeserializeOwned};

use crate::CodecError;

/// A codec that can encode records to bytes and decode bytes back.
///
/// `Send + Sync + 'static` so a store holding one can live inside the
/// long-running runtime task.
pub trait Codec: Send + Sync + 'static {
    /// File extension (without the dot) used by directory-backed stores.
    fn extension(&self) -> &'static str;

    /// Serializes a record into bytes.
    ///
    /// # Errors
    /// Returns [`CodecError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    /// Deserializes bytes back into a record.
    ///
    /// # Errors
    /// Returns [`CodecError::Decode`] if the bytes are malformed or don't
    /// match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, CodecError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that writes pretty-printed JSON (via `serde_json`).
///
/// ```rust
/// use shroud_model::{BlockPos, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let pos = BlockPos::new("world", 1, 64, -3);
/// let bytes = codec.encode(&pos).unwrap();
/// let back: BlockPos = codec.decode(&bytes).unwrap();
/// assert_eq!(pos, back);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec_pretty(value).map_err(CodecError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(data).map_err(CodecError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{Pose, Region};

    #[test]
    fn test_json_codec_output_is_readable() {
        let region = Region::new("world", (0, 60, 0), (10, 70, 10), 8);
        let bytes = JsonCodec.encode(&region).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\"world\""));
        assert!(text.contains("\"capacity\": 8"));
    }

    #[test]
    fn test_json_codec_decode_rejects_garbage() {
        let result: Result<Pose, _> = JsonCodec.decode(b"{not json");
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_json_codec_extension() {
        assert_eq!(JsonCodec.extension(), "json");
    }
}
