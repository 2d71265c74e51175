//! Error types for initseg-fmp4.

use initseg_codecs::CodecError;
use thiserror::Error;

use crate::boxes::FourCc;

/// Result type for initseg-fmp4 operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for init segment encoding and decoding.
#[derive(Debug, Error)]
pub enum Error {
    /// Input ended inside a box header or a declared box extent.
    #[error("Truncated input in {context}: need {need} bytes, have {have}")]
    TruncatedInput {
        context: String,
        need: u64,
        have: u64,
    },

    /// A box declares a length smaller than its own header.
    #[error("Invalid size {size} for box {kind}")]
    InvalidBoxSize { kind: FourCc, size: u64 },

    /// A box the segment cannot be interpreted without is absent.
    #[error("Missing required box: {0}")]
    MissingRequiredBox(&'static str),

    /// Sample entry, handler or object type outside H.264 / MPEG-4 audio.
    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    /// Malformed codec configuration (avcC record, ES descriptor, parameter sets).
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// Track list or track fields that cannot be encoded.
    #[error("Invalid track: {0}")]
    InvalidTrack(String),
}

impl Error {
    /// Create a truncated input error.
    pub fn truncated(context: impl ToString, need: u64, have: u64) -> Self {
        Self::TruncatedInput {
            context: context.to_string(),
            need,
            have,
        }
    }

    /// Create an unsupported codec error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedCodec(msg.into())
    }

    /// Create an invalid descriptor error.
    pub fn invalid_descriptor(msg: impl Into<String>) -> Self {
        Self::InvalidDescriptor(msg.into())
    }

    /// Create an invalid track error.
    pub fn invalid_track(msg: impl Into<String>) -> Self {
        Self::InvalidTrack(msg.into())
    }

    /// Overruns inside a codec configuration record are descriptor defects,
    /// not container truncation.
    pub(crate) fn into_descriptor_error(self) -> Self {
        match self {
            Self::TruncatedInput { context, need, have } => Self::InvalidDescriptor(format!(
                "{} overruns its record: need {} bytes, have {}",
                context, need, have
            )),
            other => other,
        }
    }
}

impl From<CodecError> for Error {
    fn from(err: CodecError) -> Self {
        Self::InvalidDescriptor(err.to_string())
    }
}
