//! Wire protocol between the ground console and the stand controller.
//!
//! Protocol Overview:
//! - Format: ASCII, one newline-terminated frame per line, both directions
//! - Outbound: `CMD:<verb>\n` (e.g. `CMD:IGN`, `CMD:V1:OPEN`, `CMD:CLOSE_ALL`)
//! - Inbound: `TLM:<json>` (pressures + optional load cell reading),
//!   `HBT:<counter>`, anything else is opaque firmware debug output
//!
//! The codec is pure and stateless: [`encode`] maps every [`Command`] to
//! exactly one frame, [`decode`] maps every inbound line to exactly one
//! [`TelemetryFrame`]. A line that fails to parse comes back as
//! [`TelemetryFrame::Malformed`] rather than an error so the read loop never
//! has to care whether the firmware (or the radio link) corrupted a frame.
//!
//! The load cell reports grams-force; [`decode`] converts to newtons before
//! the value reaches the consumer.

use serde::Deserialize;

/// The four actuated valves on the test stand.
///
/// Each valve maps to one wire verb (`V1`..`V4`). The set is closed: adding a
/// valve means adding a variant here and a row to the firmware's command
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValveId {
    /// `V1` — pressurizes the fuel tank from the nitrogen bottle.
    FuelPressurization,
    /// `V2` — vents fuel tank pressure.
    FuelDepressurization,
    /// `V3` — main fuel run valve.
    FuelRelease,
    /// `V4` — main oxidizer run valve.
    OxRelease,
}

impl ValveId {
    /// All valves, in console display order.
    pub const ALL: [ValveId; 4] = [
        ValveId::FuelPressurization,
        ValveId::FuelDepressurization,
        ValveId::FuelRelease,
        ValveId::OxRelease,
    ];

    /// Wire verb for this valve (`V1`..`V4`).
    pub fn verb(self) -> &'static str {
        match self {
            ValveId::FuelPressurization => "V1",
            ValveId::FuelDepressurization => "V2",
            ValveId::FuelRelease => "V3",
            ValveId::OxRelease => "V4",
        }
    }

    /// Human-readable name, as shown on the console switch labels.
    pub fn display_name(self) -> &'static str {
        match self {
            ValveId::FuelPressurization => "Fuel Pressurization Valve",
            ValveId::FuelDepressurization => "Fuel De-pressurization Valve",
            ValveId::FuelRelease => "Fuel Release Valve",
            ValveId::OxRelease => "OX Release Valve",
        }
    }
}

/// Commanded position of a valve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValveState {
    /// Valve driven open.
    Open,
    /// Valve driven closed. Initial state of every valve.
    #[default]
    Closed,
    /// Actuator de-energized.
    Neutral,
}

impl ValveState {
    /// Wire token for this state. Note the firmware expects `CLOSE`, not
    /// `CLOSED`.
    pub fn wire_token(self) -> &'static str {
        match self {
            ValveState::Open => "OPEN",
            ValveState::Closed => "CLOSE",
            ValveState::Neutral => "NEUTRAL",
        }
    }

    /// Upper-case label token for console display (`OPEN`/`CLOSED`/`NEUTRAL`).
    pub fn label_token(self) -> &'static str {
        match self {
            ValveState::Open => "OPEN",
            ValveState::Closed => "CLOSED",
            ValveState::Neutral => "NEUTRAL",
        }
    }
}

/// A logical command issued by the operator console.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Fire the igniter.
    Ignite,
    /// Drive one valve to a position.
    SetValve(ValveId, ValveState),
    /// Drive all valves closed.
    CloseAll,
    /// Drive all valves open.
    OpenAll,
    /// Free-text verb typed by the operator (e.g. `V2:30` for a partial
    /// open). Sent as-is after the `CMD:` prefix.
    Raw(String),
}

/// One decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryFrame {
    /// Sensor readings from the stand.
    Telemetry {
        /// Fuel tank pressure, psi.
        psi_fuel: f64,
        /// Oxidizer tank pressure, psi.
        psi_ox: f64,
        /// Thrust from the load cell, converted to newtons. Absent when the
        /// firmware omits the `load` field (load cell not fitted).
        load_newtons: Option<f64>,
    },
    /// Controller liveness counter. Decoded and surfaced, but no timeout
    /// policy is attached to it (see DESIGN.md).
    Heartbeat(u64),
    /// Opaque firmware debug output, passed through verbatim.
    Debug(String),
    /// A `TLM:`/`HBT:` line that failed to parse. Carries the raw line so
    /// the operator can see exactly what arrived.
    Malformed {
        /// The full line as received.
        raw: String,
        /// Why it failed to parse.
        reason: String,
    },
}

/// Standard gravity used for the load cell conversion, m/s².
const STANDARD_GRAVITY: f64 = 9.81;

/// Convert a load cell reading from grams-force to newtons.
pub fn grams_force_to_newtons(grams: f64) -> f64 {
    grams * STANDARD_GRAVITY / 1000.0
}

/// JSON payload of a `TLM:` frame.
#[derive(Debug, Deserialize)]
struct TelemetryRecord {
    psi_fuel: f64,
    psi_ox: f64,
    /// Load cell reading in grams-force.
    load: Option<f64>,
}

/// Encode a command as its wire frame, newline included.
///
/// The mapping is total: every command (and every valve/state pair) has
/// exactly one frame. An empty `Raw` command still encodes to `CMD:\n`;
/// callers that take operator input reject empty text before reaching the
/// codec (see [`crate::link::LinkManager::send_raw`]).
pub fn encode(command: &Command) -> Vec<u8> {
    let frame = match command {
        Command::Ignite => "CMD:IGN\n".to_string(),
        Command::SetValve(valve, state) => {
            format!("CMD:{}:{}\n", valve.verb(), state.wire_token())
        }
        Command::CloseAll => "CMD:CLOSE_ALL\n".to_string(),
        Command::OpenAll => "CMD:OPEN_ALL\n".to_string(),
        Command::Raw(text) => format!("CMD:{text}\n"),
    };
    frame.into_bytes()
}

/// Decode one inbound line (already stripped of its newline).
///
/// Never panics and never propagates a parse failure: a structurally bad
/// `TLM:` or `HBT:` payload comes back as [`TelemetryFrame::Malformed`].
/// Firmware debug chatter (anything without a known prefix) comes back as
/// [`TelemetryFrame::Debug`] verbatim.
pub fn decode(line: &str) -> TelemetryFrame {
    if let Some(payload) = line.strip_prefix("TLM:") {
        return match serde_json::from_str::<TelemetryRecord>(payload) {
            Ok(record) => TelemetryFrame::Telemetry {
                psi_fuel: record.psi_fuel,
                psi_ox: record.psi_ox,
                load_newtons: record.load.map(grams_force_to_newtons),
            },
            Err(e) => TelemetryFrame::Malformed {
                raw: line.to_string(),
                reason: e.to_string(),
            },
        };
    }

    if let Some(payload) = line.strip_prefix("HBT:") {
        return match payload.trim().parse::<u64>() {
            Ok(count) => TelemetryFrame::Heartbeat(count),
            Err(e) => TelemetryFrame::Malformed {
                raw: line.to_string(),
                reason: format!("bad heartbeat counter: {e}"),
            },
        };
    }

    TelemetryFrame::Debug(line.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_str(command: &Command) -> String {
        String::from_utf8(encode(command)).unwrap()
    }

    #[test]
    fn encodes_ignite_and_group_commands() {
        assert_eq!(encode_str(&Command::Ignite), "CMD:IGN\n");
        assert_eq!(encode_str(&Command::CloseAll), "CMD:CLOSE_ALL\n");
        assert_eq!(encode_str(&Command::OpenAll), "CMD:OPEN_ALL\n");
    }

    #[test]
    fn encodes_every_valve_state_pair() {
        let expected = [
            (ValveId::FuelPressurization, "V1"),
            (ValveId::FuelDepressurization, "V2"),
            (ValveId::FuelRelease, "V3"),
            (ValveId::OxRelease, "V4"),
        ];

        for (valve, verb) in expected {
            assert_eq!(
                encode_str(&Command::SetValve(valve, ValveState::Open)),
                format!("CMD:{verb}:OPEN\n")
            );
            assert_eq!(
                encode_str(&Command::SetValve(valve, ValveState::Closed)),
                format!("CMD:{verb}:CLOSE\n")
            );
            assert_eq!(
                encode_str(&Command::SetValve(valve, ValveState::Neutral)),
                format!("CMD:{verb}:NEUTRAL\n")
            );
        }
    }

    #[test]
    fn encodes_raw_text_verbatim() {
        assert_eq!(encode_str(&Command::Raw("V2:30".into())), "CMD:V2:30\n");
    }

    #[test]
    fn decodes_telemetry_without_load() {
        let frame = decode("TLM:{\"psi_fuel\":500,\"psi_ox\":600}");
        assert_eq!(
            frame,
            TelemetryFrame::Telemetry {
                psi_fuel: 500.0,
                psi_ox: 600.0,
                load_newtons: None,
            }
        );
    }

    #[test]
    fn decodes_telemetry_with_load_in_newtons() {
        let frame = decode("TLM:{\"psi_fuel\":10,\"psi_ox\":20,\"load\":1000}");
        match frame {
            TelemetryFrame::Telemetry {
                psi_fuel,
                psi_ox,
                load_newtons: Some(n),
            } => {
                assert_eq!(psi_fuel, 10.0);
                assert_eq!(psi_ox, 20.0);
                assert!((n - 9.81).abs() < 1e-9, "got {n}");
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn bad_telemetry_json_is_malformed_not_a_panic() {
        match decode("TLM:not-json") {
            TelemetryFrame::Malformed { raw, reason } => {
                assert_eq!(raw, "TLM:not-json");
                assert!(!reason.is_empty());
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn telemetry_missing_required_field_is_malformed() {
        match decode("TLM:{\"psi_fuel\":500}") {
            TelemetryFrame::Malformed { reason, .. } => {
                assert!(reason.contains("psi_ox"), "reason: {reason}");
            }
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn decodes_heartbeat_counter() {
        assert_eq!(decode("HBT:42"), TelemetryFrame::Heartbeat(42));
    }

    #[test]
    fn bad_heartbeat_counter_is_malformed() {
        match decode("HBT:x") {
            TelemetryFrame::Malformed { raw, .. } => assert_eq!(raw, "HBT:x"),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn unknown_lines_pass_through_as_debug() {
        assert_eq!(
            decode("hello world"),
            TelemetryFrame::Debug("hello world".into())
        );
    }

    #[test]
    fn load_conversion_matches_standard_gravity() {
        assert!((grams_force_to_newtons(1000.0) - 9.81).abs() < 1e-12);
        assert_eq!(grams_force_to_newtons(0.0), 0.0);
    }
}
