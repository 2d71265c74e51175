//! Error types for initseg-codecs

/// Result type for codec bitstream operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors raised while reading or writing codec bitstreams
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Bitstream ended before the named structure was complete
    #[error("Truncated bitstream while reading {0}")]
    Truncated(&'static str),

    /// Sequence parameter set is malformed or not an SPS
    #[error("Invalid SPS: {0}")]
    InvalidSps(String),

    /// AudioSpecificConfig cannot be represented or parsed
    #[error("Invalid audio config: {0}")]
    InvalidConfig(String),
}

impl CodecError {
    /// Create an invalid SPS error.
    pub fn invalid_sps(msg: impl Into<String>) -> Self {
        Self::InvalidSps(msg.into())
    }

    /// Create an invalid audio config error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
