//! Error types for ipdslink

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// ipdslink error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Read past the end of the available bytes
    ///
    /// Always fatal to the record being decoded. There is no implicit
    /// zero-fill; a short buffer is a framing failure.
    #[error("truncated data: needed {needed} bytes, {available} available")]
    Truncated {
        /// Bytes the read required
        needed: usize,
        /// Bytes actually available
        available: usize,
    },

    /// Declared record length disagrees with the actual byte count
    #[error("inconsistent length: declared {declared}, actual {actual}")]
    InconsistentLength {
        /// Length stated in the record header
        declared: usize,
        /// Bytes actually present
        actual: usize,
    },

    /// Peer violated the protocol (bad envelope, mixed reassembly sequence,
    /// unexpected acknowledgment type)
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// No reply arrived within the configured timeout
    #[error("timed out waiting for a reply")]
    ReplyTimeout,

    /// Transport reached end-of-stream or was closed
    #[error("connection closed")]
    ConnectionClosed,

    /// Startup handshake or capability negotiation failed
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// Text not representable in the target character set
    #[error("invalid text: {0}")]
    InvalidText(String),

    /// Invalid parameter
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
