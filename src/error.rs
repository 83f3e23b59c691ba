//! Error types for the permessage-deflate extension.
//!
//! Every error returned by a frame stage is terminal for the connection:
//! the caller is expected to close it with the status given by
//! [`Error::close_code`] instead of feeding further frames.

use thiserror::Error;

use crate::message::CloseCode;

/// Result type alias for extension operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while compressing or decompressing messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The native codec session could not be created.
    #[error("Codec initialization failed: {0}")]
    CodecInit(String),

    /// A native codec call left input unconsumed or produced no output.
    #[error("Codec consumed {consumed} of {total} input bytes")]
    IncompleteConsumption {
        /// Bytes the codec accepted.
        consumed: usize,
        /// Bytes handed to the codec.
        total: usize,
    },

    /// The deflate stream reported an error.
    #[error("Compression failed: {0}")]
    Compression(String),

    /// The inflate stream reported an error (corrupt or truncated input).
    #[error("Decompression failed: {0}")]
    Decompression(String),

    /// Frame sequencing violates RFC 6455 / RFC 7692.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// Message size exceeds configured maximum.
    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge {
        /// Actual message size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Invalid extension configuration or parameter.
    #[error("Invalid extension: {0}")]
    InvalidExtension(String),
}

impl Error {
    /// Close status the connection should be failed with.
    #[must_use]
    pub const fn close_code(&self) -> CloseCode {
        match self {
            Error::MessageTooLarge { .. } => CloseCode::MessageTooBig,
            _ => CloseCode::ProtocolError,
        }
    }
}

impl From<flate2::CompressError> for Error {
    fn from(err: flate2::CompressError) -> Self {
        Error::Compression(err.to_string())
    }
}

impl From<flate2::DecompressError> for Error {
    fn from(err: flate2::DecompressError) -> Self {
        Error::Decompression(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MessageTooLarge {
            size: 20_000_000,
            max: 16_000_000,
        };
        assert_eq!(
            err.to_string(),
            "Message too large: 20000000 bytes (max: 16000000)"
        );

        let err = Error::IncompleteConsumption {
            consumed: 3,
            total: 10,
        };
        assert_eq!(err.to_string(), "Codec consumed 3 of 10 input bytes");
    }

    #[test]
    fn test_close_code_mapping() {
        let too_big = Error::MessageTooLarge { size: 2, max: 1 };
        assert_eq!(too_big.close_code(), CloseCode::MessageTooBig);

        let corrupt = Error::Decompression("invalid block type".into());
        assert_eq!(corrupt.close_code(), CloseCode::ProtocolError);

        let sequencing = Error::ProtocolViolation("Unexpected continuation frame".into());
        assert_eq!(sequencing.close_code().as_u16(), 1002);
    }

    #[test]
    fn test_error_clone() {
        let err = Error::CodecInit("out of memory".into());
        let cloned = err.clone();
        assert_eq!(err, cloned);
    }
}
