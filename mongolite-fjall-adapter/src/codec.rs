use mongolite::collection::Document;
use mongolite::errors::{ErrorKind, MongoliteError};
use std::error::Error;
use thiserror::Error;

/// Error type for document serialization in the Fjall adapter.
///
/// Distinguishes encode failures (a document could not be turned into bytes)
/// from decode failures (stored bytes could not be turned back into a
/// document, e.g. after on-disk corruption).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FjallCodecError {
    /// Serialization of a document failed
    #[error("Serialization failed: {0}")]
    EncodeError(String),
    /// Deserialization of stored bytes failed
    #[error("Deserialization failed: {0}")]
    DecodeError(String),
    /// Invalid UTF-8 encountered in a stored key
    #[error("Invalid UTF-8 in stored key: {0}")]
    InvalidUtf8(String),
}

impl From<FjallCodecError> for MongoliteError {
    fn from(err: FjallCodecError) -> Self {
        // Decode failures mean the stored bytes are bad, which is a backend
        // problem rather than a caller error.
        let kind = match &err {
            FjallCodecError::EncodeError(_) => ErrorKind::EncodingError,
            FjallCodecError::DecodeError(_) | FjallCodecError::InvalidUtf8(_) => {
                ErrorKind::BackendError
            }
        };
        MongoliteError::new(&err.to_string(), kind)
    }
}

/// Result type for codec operations.
pub type FjallCodecResult<T> = Result<T, FjallCodecError>;

/// Serializes a document to bytes for storage in a Fjall partition.
#[inline]
pub(crate) fn encode_document(document: &Document) -> FjallCodecResult<Vec<u8>> {
    bincode::serde::encode_to_vec(document, bincode::config::legacy())
        .map_err(|e| FjallCodecError::EncodeError(e.to_string()))
}

/// Deserializes a document from bytes read out of a Fjall partition.
#[inline]
pub(crate) fn decode_document(bytes: &[u8]) -> FjallCodecResult<Document> {
    bincode::serde::decode_from_slice(bytes, bincode::config::legacy())
        .map(|(document, _)| document)
        .map_err(|e| FjallCodecError::DecodeError(e.to_string()))
}

/// Decodes a stored key back into a document id string.
#[inline]
pub(crate) fn decode_key(bytes: &[u8]) -> FjallCodecResult<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| FjallCodecError::InvalidUtf8(e.to_string()))
}

/// Converts a Fjall backend error to a [MongoliteError].
///
/// Maps error message patterns to error kinds:
/// - "closed" → StoreAlreadyClosed
/// - "not found" / "deleted" / "PartitionDeleted" → StoreNotInitialized
/// - "permission" → PermissionDenied
/// - anything else → BackendError
pub(crate) fn to_store_error(error: impl Error) -> MongoliteError {
    let error_msg = error.to_string();
    let error_kind = if error_msg.contains("closed") {
        ErrorKind::StoreAlreadyClosed
    } else if error_msg.contains("not found")
        || error_msg.contains("deleted")
        || error_msg.contains("PartitionDeleted")
    {
        ErrorKind::StoreNotInitialized
    } else if error_msg.contains("permission") {
        ErrorKind::PermissionDenied
    } else {
        ErrorKind::BackendError
    };
    MongoliteError::new(&format!("Fjall error: {}", error_msg), error_kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongolite::doc;

    #[test]
    fn test_document_round_trip() {
        let original = doc! {
            _id: "64f1a2b3c4d5e6f708192a3b",
            name: "Alice",
            age: 30,
            tags: ["a", "b"],
            address: { city: "Wonderland", zip: 10001 }
        };
        let bytes = encode_document(&original).unwrap();
        let recovered = decode_document(&bytes).unwrap();
        assert_eq!(original, recovered);
    }

    #[test]
    fn test_empty_document_round_trip() {
        let original = doc! {};
        let bytes = encode_document(&original).unwrap();
        let recovered = decode_document(&bytes).unwrap();
        assert_eq!(original, recovered);
    }

    #[test]
    fn test_corrupted_bytes_return_decode_error() {
        let result = decode_document(&[0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            FjallCodecError::DecodeError(_)
        ));
    }

    #[test]
    fn test_empty_bytes_return_decode_error() {
        let result = decode_document(&[]);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_key_rejects_invalid_utf8() {
        let result = decode_key(&[0xC3, 0x28]);
        assert!(matches!(
            result.unwrap_err(),
            FjallCodecError::InvalidUtf8(_)
        ));
    }

    #[test]
    fn test_codec_error_into_mongolite_error() {
        let err = FjallCodecError::DecodeError("bad bytes".to_string());
        let converted: MongoliteError = err.into();
        assert_eq!(converted.kind(), &ErrorKind::BackendError);
        assert!(converted.to_string().contains("Deserialization failed"));

        let err = FjallCodecError::EncodeError("bad value".to_string());
        let converted: MongoliteError = err.into();
        assert_eq!(converted.kind(), &ErrorKind::EncodingError);
    }

    #[test]
    fn test_to_store_error_mapping() {
        let err = to_store_error(std::io::Error::other("partition is closed"));
        assert_eq!(err.kind(), &ErrorKind::StoreAlreadyClosed);

        let err = to_store_error(std::io::Error::other("partition not found"));
        assert_eq!(err.kind(), &ErrorKind::StoreNotInitialized);

        let err = to_store_error(std::io::Error::other("permission denied"));
        assert_eq!(err.kind(), &ErrorKind::PermissionDenied);

        let err = to_store_error(std::io::Error::other("something else"));
        assert_eq!(err.kind(), &ErrorKind::BackendError);
        assert!(err.to_string().contains("Fjall error: something else"));
    }
}
