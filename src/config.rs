//! Link configuration.
//!
//! The configuration surface of the link is deliberately small: a serial
//! port path and a baud rate, both operator-editable up until `connect()` is
//! called. The baud rate is kept as the text the operator typed; the only
//! validation is integer parseability, applied at connect time so the
//! operator sees the error next to the connect action rather than while
//! still typing.

use crate::error::{LinkError, LinkResult};
use serde::{Deserialize, Serialize};

/// Serial link settings, set by the consumer before connecting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Serial device path (e.g. `/dev/tty.usbserial-0001`, `COM3`).
    pub port_path: String,
    /// Baud rate as entered by the operator. Parsed at connect time.
    pub baud_rate: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port_path: "/dev/ttyUSB0".to_string(),
            baud_rate: "115200".to_string(),
        }
    }
}

impl LinkConfig {
    /// Build a config from explicit values.
    pub fn new(port_path: impl Into<String>, baud_rate: impl Into<String>) -> Self {
        Self {
            port_path: port_path.into(),
            baud_rate: baud_rate.into(),
        }
    }

    /// Parse the baud text as a positive integer.
    ///
    /// # Errors
    /// [`LinkError::InvalidBaud`] when the text is not a positive integer.
    pub fn baud(&self) -> LinkResult<u32> {
        match self.baud_rate.trim().parse::<u32>() {
            Ok(baud) if baud > 0 => Ok(baud),
            _ => Err(LinkError::InvalidBaud(self.baud_rate.clone())),
        }
    }
}
