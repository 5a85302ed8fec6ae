//! Error types for the link layer.
//!
//! [`LinkError`] covers the failures a consumer can see from the link API:
//! a port that would not open, a baud rate that is not a number, and writes
//! attempted while disconnected. In-loop failures (malformed telemetry,
//! transient read faults) are deliberately *not* here: the monitor loop
//! recovers from them locally and reports them to the consumer as events
//! ([`crate::protocol::TelemetryFrame::Malformed`] and debug lines), so they
//! never surface as `Result` errors and never stop the loop.

use thiserror::Error;

/// Convenience alias for results using the link error type.
pub type LinkResult<T> = std::result::Result<T, LinkError>;

/// Failures surfaced by [`crate::link::LinkManager`].
#[derive(Error, Debug)]
pub enum LinkError {
    /// The serial device could not be opened (missing, busy, or permission
    /// denied). The connect attempt aborts; no automatic retry.
    #[error("failed to open serial port {path}: {source}")]
    PortOpenFailed {
        /// Port path from the config.
        path: String,
        /// Underlying serial error.
        #[source]
        source: tokio_serial::Error,
    },

    /// The configured baud rate is not a positive integer.
    #[error("invalid baud rate {0:?}")]
    InvalidBaud(String),

    /// A write was attempted with no open connection. Nothing is queued.
    #[error("not connected")]
    NotConnected,

    /// I/O failure on an established connection.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        let err = LinkError::InvalidBaud("fast".into());
        assert_eq!(err.to_string(), "invalid baud rate \"fast\"");

        assert_eq!(LinkError::NotConnected.to_string(), "not connected");
    }
}
