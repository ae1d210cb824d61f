//! Playback error types and handling
//!
//! This module defines all error types used throughout the playback pump,
//! providing clear error messages and context for debugging and error
//! handling.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for playback operations
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// Operation invalid for the current transport state
    #[error("Invalid state: {message}")]
    InvalidState {
        /// State error message
        message: String,
    },

    /// Container has no video track to play
    #[error("No video track found in {path}")]
    NoVideoTrack {
        /// Path of the offending container
        path: PathBuf,
    },

    /// No decoder available for the track's encoding
    #[error("Unsupported encoding: {mime}")]
    UnsupportedEncoding {
        /// MIME type that could not be decoded
        mime: String,
    },

    /// Decoder construction or startup failed
    #[error("Decoder initialization failed: {reason}")]
    DecoderInit {
        /// Failure reason
        reason: String,
    },

    /// Decoding a sample failed (malformed sample, codec fault)
    #[error("Decode failed: {reason}")]
    Decode {
        /// Failure reason
        reason: String,
    },

    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// Result type alias for playback operations
pub type PlaybackResult<T> = Result<T, PlaybackError>;

impl PlaybackError {
    /// Check if the pipeline can continue past this error
    ///
    /// Decode failures are swallowed inside the asynchronous exchange
    /// handlers and playback continues with the next buffer; everything
    /// else surfaces synchronously to the caller.
    pub fn is_recoverable(&self) -> bool {
        match self {
            PlaybackError::Decode { .. } => true,
            PlaybackError::Io { .. } => true,
            PlaybackError::InvalidState { .. } => false,
            PlaybackError::NoVideoTrack { .. } => false,
            PlaybackError::UnsupportedEncoding { .. } => false,
            PlaybackError::DecoderInit { .. } => false,
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            PlaybackError::InvalidState { .. } => ErrorCategory::State,
            PlaybackError::NoVideoTrack { .. } => ErrorCategory::Resource,
            PlaybackError::UnsupportedEncoding { .. } => ErrorCategory::Resource,
            PlaybackError::DecoderInit { .. } => ErrorCategory::Resource,
            PlaybackError::Decode { .. } => ErrorCategory::Decode,
            PlaybackError::Io { .. } => ErrorCategory::System,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transport state errors, surfaced synchronously to the caller
    State,
    /// Decoder/demuxer construction failures, surfaced from `play_video`
    Resource,
    /// Failures inside the asynchronous exchange handlers, logged and skipped
    Decode,
    /// System-level errors (I/O, permissions, etc.)
    System,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let state_error = PlaybackError::InvalidState {
            message: "seek without an active session".to_string(),
        };
        assert_eq!(state_error.category(), ErrorCategory::State);
        assert!(!state_error.is_recoverable());

        let decode_error = PlaybackError::Decode {
            reason: "truncated NAL unit".to_string(),
        };
        assert_eq!(decode_error.category(), ErrorCategory::Decode);
        assert!(decode_error.is_recoverable());

        let resource_error = PlaybackError::UnsupportedEncoding {
            mime: "video/av01".to_string(),
        };
        assert_eq!(resource_error.category(), ErrorCategory::Resource);
        assert!(!resource_error.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let error = PlaybackError::NoVideoTrack {
            path: PathBuf::from("/media/silence.mp4"),
        };
        assert_eq!(
            error.to_string(),
            "No video track found in /media/silence.mp4"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let playback_error = PlaybackError::from(io_error);

        match playback_error {
            PlaybackError::Io { .. } => (),
            _ => panic!("Expected Io error variant"),
        }
    }
}
