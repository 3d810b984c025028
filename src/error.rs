use std::path::PathBuf;

use thiserror::Error;

use crate::data::model::{CalibrationType, DataType};

/// Convenience alias used throughout the decoder.
pub type Result<T, E = AsdError> = std::result::Result<T, E>;

/// Errors raised while decoding an ASD file or deriving quantities from it.
#[derive(Error, Debug)]
pub enum AsdError {
    /// Malformed or truncated binary input.
    #[error("malformed ASD data at offset {offset} of a {len}-byte buffer: {reason}")]
    Format {
        /// Byte offset where decoding failed.
        offset: usize,
        /// Total length of the buffer being decoded.
        len: usize,
        /// What was wrong at that offset.
        reason: String,
    },

    /// A derived quantity was requested that the file's data type cannot provide.
    #[error("{operation} requires {expected} data, but the file contains {found}")]
    TypeCompatibility {
        operation: &'static str,
        expected: DataType,
        found: DataType,
    },

    /// Radiance needs calibration buffers the file does not carry.
    #[error("{operation} requires a {buffer} calibration buffer, but the file has none")]
    MissingCalibration {
        operation: &'static str,
        buffer: CalibrationType,
    },

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AsdError {
    /// Create a format error at `offset` within a buffer of `len` bytes.
    pub fn format(offset: usize, len: usize, reason: impl Into<String>) -> Self {
        Self::Format {
            offset,
            len,
            reason: reason.into(),
        }
    }

    /// Whether the caller can fall back to another accessor after this error.
    ///
    /// Decode failures are final: the file must be treated as unreadable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TypeCompatibility { .. } | Self::MissingCalibration { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_reports_offset_and_length() {
        let err = AsdError::format(612, 700, "string length 300 exceeds remaining 88 bytes");
        let msg = err.to_string();
        assert!(msg.contains("612"));
        assert!(msg.contains("700"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_type_compatibility_names_found_type() {
        let err = AsdError::TypeCompatibility {
            operation: "reflectance",
            expected: DataType::Ref,
            found: DataType::Rad,
        };
        assert_eq!(
            err.to_string(),
            "reflectance requires REF data, but the file contains RAD"
        );
        assert!(err.is_recoverable());
    }
}
