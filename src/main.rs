//! Headless operator console for the stand link.
//!
//! A stand-in consumer for bench work without the GUI: connects the serial
//! link, prints every decoded event, and reads operator commands from stdin.
//!
//! # Usage
//!
//! ```bash
//! gcs-link --port /dev/tty.usbserial-0001 --baud 115200
//! ```
//!
//! Prompt commands:
//! - `ign` — fire the igniter
//! - `v1..v4 open|close|neutral` — drive one valve
//! - `close_all` / `open_all` — drive every valve
//! - `status` — print link status and valve labels
//! - `quit` — disconnect and exit
//! - anything else — sent verbatim as `CMD:<text>` (e.g. `V2:30`)

use anyhow::Result;
use clap::Parser;
use gcs_link::link::LinkManager;
use gcs_link::valve::ValveBank;
use gcs_link::{Command, LinkConfig, LinkEvent, TelemetryFrame, ValveId, ValveState};
use gcs_link::event::ChannelSink;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gcs-link")]
#[command(about = "Ground-control serial link console for the test stand", long_about = None)]
struct Cli {
    /// Serial port path
    #[arg(long, default_value = "/dev/ttyUSB0")]
    port: String,

    /// Baud rate
    #[arg(long, default_value = "115200")]
    baud: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = LinkConfig::new(cli.port, cli.baud);

    let (sink, mut events) = ChannelSink::channel();
    let mut link = LinkManager::new(Arc::new(sink));
    let mut valves = ValveBank::new();

    link.connect(&config).await?;
    println!("Serial connection to {} successful.", config.port_path);

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_event(&event);
        }
    });

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = stdin.next_line().await? {
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("quit") {
            break;
        }
        if input.eq_ignore_ascii_case("status") {
            println!("link: {:?}", link.status());
            for label in valves.labels() {
                println!("{label}");
            }
            continue;
        }

        match parse_command(input, &mut valves) {
            Some((command, label)) => {
                if let Some(label) = label {
                    println!("{label}");
                }
                if let Err(e) = link.send(&command).await {
                    eprintln!("{e}");
                }
            }
            None => {
                if let Err(e) = link.send_raw(input).await {
                    eprintln!("{e}");
                }
            }
        }
    }

    link.disconnect().await;
    printer.abort();
    Ok(())
}

/// Parse an operator line into a command, updating valve state as a side
/// effect. Returns the refreshed console label for valve commands. `None`
/// means the line is a free-text verb for [`LinkManager::send_raw`].
fn parse_command(input: &str, valves: &mut ValveBank) -> Option<(Command, Option<String>)> {
    let lowered = input.to_ascii_lowercase();
    match lowered.as_str() {
        "ign" => return Some((Command::Ignite, None)),
        "close_all" => return Some((Command::CloseAll, None)),
        "open_all" => return Some((Command::OpenAll, None)),
        _ => {}
    }

    let mut parts = lowered.split_whitespace();
    let valve = parse_valve(parts.next()?)?;
    let state = parse_state(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }

    let tracker = valves.tracker_mut(valve);
    let command = tracker.set_state(state);
    Some((command, Some(tracker.label())))
}

fn parse_valve(token: &str) -> Option<ValveId> {
    match token {
        "v1" => Some(ValveId::FuelPressurization),
        "v2" => Some(ValveId::FuelDepressurization),
        "v3" => Some(ValveId::FuelRelease),
        "v4" => Some(ValveId::OxRelease),
        _ => None,
    }
}

fn parse_state(token: &str) -> Option<ValveState> {
    match token {
        "open" => Some(ValveState::Open),
        "close" | "closed" => Some(ValveState::Closed),
        "neutral" => Some(ValveState::Neutral),
        _ => None,
    }
}

fn print_event(event: &LinkEvent) {
    match event {
        LinkEvent::Telemetry(TelemetryFrame::Telemetry {
            psi_fuel,
            psi_ox,
            load_newtons,
        }) => match load_newtons {
            Some(n) => println!("TLM fuel {psi_fuel:.1} psi | ox {psi_ox:.1} psi | thrust {n:.2} N"),
            None => println!("TLM fuel {psi_fuel:.1} psi | ox {psi_ox:.1} psi"),
        },
        LinkEvent::Telemetry(TelemetryFrame::Heartbeat(count)) => {
            println!("HBT {count}");
        }
        LinkEvent::Telemetry(TelemetryFrame::Debug(text)) => {
            println!("Debug: {text}");
        }
        LinkEvent::Telemetry(TelemetryFrame::Malformed { raw, reason }) => {
            println!("Malformed frame {raw:?}: {reason}");
        }
        LinkEvent::Debug(text) => {
            println!("{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valve_commands_and_updates_label() {
        let mut valves = ValveBank::new();
        let (command, label) = parse_command("v3 open", &mut valves).unwrap();
        assert_eq!(
            command,
            Command::SetValve(ValveId::FuelRelease, ValveState::Open)
        );
        assert_eq!(label.as_deref(), Some("Fuel Release Valve [OPEN]"));
    }

    #[test]
    fn unknown_input_falls_through_to_raw() {
        let mut valves = ValveBank::new();
        assert!(parse_command("V2:30", &mut valves).is_none());
        assert!(parse_command("v9 open", &mut valves).is_none());
    }

    #[test]
    fn group_commands_do_not_touch_trackers() {
        let mut valves = ValveBank::new();
        let (command, label) = parse_command("open_all", &mut valves).unwrap();
        assert_eq!(command, Command::OpenAll);
        assert!(label.is_none());
        assert_eq!(
            valves.tracker_mut(ValveId::FuelRelease).state(),
            ValveState::Closed
        );
    }
}
