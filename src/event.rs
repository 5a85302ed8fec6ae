//! Consumer-facing event delivery.
//!
//! The monitor loop does not know what the consumer is (GUI, headless CLI,
//! test harness); it forwards everything through an [`EventSink`] the
//! consumer registers before connecting. [`ChannelSink`] is the stock
//! implementation, bridging the sink into a tokio mpsc channel so the
//! consumer can receive [`LinkEvent`]s from its own task.

use crate::protocol::TelemetryFrame;
use tokio::sync::mpsc;

/// Receiver half of the callbacks invoked by the monitor loop.
///
/// Implementations must be cheap and non-blocking: the monitor loop calls
/// them inline between reads, so a slow sink stalls frame intake.
pub trait EventSink: Send + Sync {
    /// One decoded inbound frame (telemetry, heartbeat, debug, or
    /// malformed).
    fn on_telemetry(&self, frame: TelemetryFrame);

    /// A link-level diagnostic that did not come off the wire (e.g. a
    /// transport read error).
    fn on_debug(&self, line: &str);
}

/// An event as delivered through a [`ChannelSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// Decoded inbound frame.
    Telemetry(TelemetryFrame),
    /// Link-level diagnostic text.
    Debug(String),
}

/// [`EventSink`] that forwards events into an unbounded mpsc channel.
///
/// Dropped receivers are tolerated: once the consumer goes away the sink
/// silently discards, so a late frame can never wedge the monitor loop
/// during teardown.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<LinkEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver the consumer reads events from.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<LinkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn on_telemetry(&self, frame: TelemetryFrame) {
        let _ = self.tx.send(LinkEvent::Telemetry(frame));
    }

    fn on_debug(&self, line: &str) {
        let _ = self.tx.send(LinkEvent::Debug(line.to_string()));
    }
}
