//! # gcs-link
//!
//! Command/telemetry link between an operator console and the embedded
//! avionics controller of a liquid-rocket test stand, over a serial
//! connection. This crate is the protocol and link-management core only;
//! the console UI and the stand-sizing calculation scripts live elsewhere
//! and talk to it through [`LinkManager`](link::LinkManager) and
//! [`EventSink`](event::EventSink).
//!
//! ## Module structure
//!
//! - **`protocol`**: pure codec between logical [`Command`]s /
//!   [`TelemetryFrame`]s and the newline-delimited ASCII wire format.
//! - **`config`**: [`LinkConfig`] — serial port path and baud rate, the
//!   whole configuration surface of the link.
//! - **`error`**: [`LinkError`], the consumer-visible failure taxonomy.
//! - **`event`**: the [`EventSink`] callback seam and the
//!   [`ChannelSink`](event::ChannelSink) mpsc adapter.
//! - **`link`**: [`LinkManager`](link::LinkManager) — exclusive owner of
//!   the serial handle, plus the background monitor loop that reads and
//!   decodes inbound frames.
//! - **`valve`**: [`ValveTracker`](valve::ValveTracker) — per-valve logical
//!   state, converting operator intents into commands.
//!
//! ## Flow
//!
//! Consumer → `ValveTracker`/`Command` → `protocol::encode` →
//! `LinkManager::write`. Monitor loop → `protocol::decode` → `EventSink` →
//! consumer.

pub mod config;
pub mod error;
pub mod event;
pub mod link;
pub mod protocol;
pub mod valve;

pub use config::LinkConfig;
pub use error::{LinkError, LinkResult};
pub use event::{EventSink, LinkEvent};
pub use protocol::{Command, TelemetryFrame, ValveId, ValveState};
