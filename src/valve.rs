//! Per-valve logical state tracking.
//!
//! One [`ValveTracker`] per valve, fully independent of the others: there is
//! no interlock between valves or between valves and ignition. Sequencing is
//! the operator's responsibility, exactly as on the physical console (see
//! DESIGN.md for the open question around this).

use crate::protocol::{Command, ValveId, ValveState};

/// Tracked state of one valve on the operator console.
///
/// Transitions are unconditional: `set_state` overwrites whatever was there
/// and hands back the command to transmit. The tracked state is display
/// state only; the stand does not acknowledge valve commands, so the tracker
/// reflects what was last *commanded*, not a measured position.
#[derive(Debug, Clone)]
pub struct ValveTracker {
    id: ValveId,
    state: ValveState,
}

impl ValveTracker {
    /// New tracker, starting `Closed`.
    pub fn new(id: ValveId) -> Self {
        Self {
            id,
            state: ValveState::default(),
        }
    }

    /// Which valve this tracker drives.
    pub fn id(&self) -> ValveId {
        self.id
    }

    /// Last commanded state.
    pub fn state(&self) -> ValveState {
        self.state
    }

    /// Overwrite the tracked state and return the command to transmit.
    ///
    /// The state update happens first so the console label is already
    /// current when the caller logs the outgoing frame.
    #[must_use = "the returned command must be transmitted for the valve to move"]
    pub fn set_state(&mut self, new_state: ValveState) -> Command {
        self.state = new_state;
        Command::SetValve(self.id, new_state)
    }

    /// Console label, e.g. `Fuel Release Valve [CLOSED]`.
    pub fn label(&self) -> String {
        format!("{} [{}]", self.id.display_name(), self.state.label_token())
    }
}

/// The four trackers of the reference stand as one unit.
#[derive(Debug, Clone)]
pub struct ValveBank {
    trackers: [ValveTracker; 4],
}

impl Default for ValveBank {
    fn default() -> Self {
        Self::new()
    }
}

impl ValveBank {
    /// All four valves, all starting `Closed`.
    pub fn new() -> Self {
        Self {
            trackers: ValveId::ALL.map(ValveTracker::new),
        }
    }

    /// Tracker for one valve.
    pub fn tracker_mut(&mut self, id: ValveId) -> &mut ValveTracker {
        // ALL is in the same order as the array was built from.
        let index = ValveId::ALL
            .iter()
            .position(|v| *v == id)
            .unwrap_or_default();
        &mut self.trackers[index]
    }

    /// Current labels in console display order.
    pub fn labels(&self) -> Vec<String> {
        self.trackers.iter().map(ValveTracker::label).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_closed() {
        let tracker = ValveTracker::new(ValveId::FuelRelease);
        assert_eq!(tracker.state(), ValveState::Closed);
        assert_eq!(tracker.label(), "Fuel Release Valve [CLOSED]");
    }

    #[test]
    fn set_state_sequence_yields_matching_commands() {
        let mut tracker = ValveTracker::new(ValveId::OxRelease);

        let commands = [
            tracker.set_state(ValveState::Open),
            tracker.set_state(ValveState::Neutral),
            tracker.set_state(ValveState::Closed),
        ];

        assert_eq!(
            commands,
            [
                Command::SetValve(ValveId::OxRelease, ValveState::Open),
                Command::SetValve(ValveId::OxRelease, ValveState::Neutral),
                Command::SetValve(ValveId::OxRelease, ValveState::Closed),
            ]
        );
        assert_eq!(tracker.state(), ValveState::Closed);
    }

    #[test]
    fn transitions_are_unconditional() {
        let mut tracker = ValveTracker::new(ValveId::FuelPressurization);
        // Open -> Open is not rejected or deduplicated.
        tracker.set_state(ValveState::Open);
        let cmd = tracker.set_state(ValveState::Open);
        assert_eq!(
            cmd,
            Command::SetValve(ValveId::FuelPressurization, ValveState::Open)
        );
    }

    #[test]
    fn trackers_are_independent() {
        let mut bank = ValveBank::new();
        bank.tracker_mut(ValveId::FuelRelease)
            .set_state(ValveState::Open);

        assert_eq!(
            bank.tracker_mut(ValveId::OxRelease).state(),
            ValveState::Closed
        );
        assert_eq!(
            bank.tracker_mut(ValveId::FuelRelease).state(),
            ValveState::Open
        );
    }

    #[test]
    fn bank_labels_follow_console_order() {
        let bank = ValveBank::new();
        assert_eq!(
            bank.labels(),
            vec![
                "Fuel Pressurization Valve [CLOSED]",
                "Fuel De-pressurization Valve [CLOSED]",
                "Fuel Release Valve [CLOSED]",
                "OX Release Valve [CLOSED]",
            ]
        );
    }
}
