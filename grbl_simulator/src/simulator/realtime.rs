//! Single-byte real-time commands, handled outside the line protocol.

use super::Simulator;
use crate::modal::ModalState;
use crate::overrides::Overrides;
use crate::state::MachineState;
use grbl_shared::AlarmCode;

pub const STATUS_QUERY: u8 = b'?';
pub const FEED_HOLD: u8 = b'!';
pub const CYCLE_START: u8 = b'~';
pub const SOFT_RESET: u8 = 0x18;
pub const SAFETY_DOOR: u8 = 0x84;
pub const JOG_CANCEL: u8 = 0x85;

/// Bytes that never reach the line buffer.
pub fn is_realtime(byte: u8) -> bool {
    matches!(byte, STATUS_QUERY | FEED_HOLD | CYCLE_START | SOFT_RESET) || byte >= 0x80
}

impl Simulator {
    /// Handles a real-time byte; returns the text to send back, if any.
    pub fn realtime(&mut self, byte: u8) -> Option<String> {
        match byte {
            STATUS_QUERY => Some(self.status_report()),
            FEED_HOLD => {
                if self.state.can_hold() {
                    self.set_machine_state(MachineState::Hold);
                }
                None
            }
            CYCLE_START => {
                // Resuming does not continue the interrupted move.
                if self.state.is_suspended() {
                    self.set_machine_state(MachineState::Idle);
                }
                None
            }
            SOFT_RESET => Some(self.soft_reset()),
            SAFETY_DOOR => {
                if self.state.can_open_door() {
                    self.set_machine_state(MachineState::Door);
                }
                None
            }
            JOG_CANCEL => {
                if self.state == MachineState::Jog {
                    self.abort_motion();
                    tracing::info!("jog cancelled at {}", self.machine_position.format_report());
                    self.set_machine_state(MachineState::Idle);
                }
                None
            }
            other => {
                self.overrides.apply(other);
                None
            }
        }
    }

    /// Ctrl-X: drop every buffer and queue and return to power-on modal state.
    /// Work offsets other than G92 survive.
    pub fn soft_reset(&mut self) -> String {
        let in_flight = self.abort_motion();
        self.rx.clear();
        self.admission.clear();
        self.dwell = None;
        self.modal = ModalState::default();
        self.frame.clear_g92();
        self.overrides = Overrides::default();
        self.refresh_work_position();

        if in_flight {
            tracing::warn!("reset during motion, position may be lost");
            self.alarm = Some(AlarmCode::AbortCycle);
            self.set_machine_state(MachineState::Alarm);
            format!("{}{}", AlarmCode::AbortCycle.push(), self.banner())
        } else {
            tracing::info!("soft reset");
            self.alarm = None;
            self.set_machine_state(MachineState::Idle);
            self.banner()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::SimClock;
    use super::*;
    use crate::overrides::FEED_COARSE_PLUS;
    use std::sync::Arc;

    fn simulator() -> Simulator {
        Simulator::with_clock(Arc::new(SimClock::new()))
    }

    #[test]
    fn realtime_classification() {
        assert!(is_realtime(b'?'));
        assert!(is_realtime(JOG_CANCEL));
        assert!(!is_realtime(b'G'));
        assert!(!is_realtime(b'\n'));
    }

    #[test]
    fn hold_and_resume_only_in_legal_states() {
        let mut sim = simulator();
        assert_eq!(sim.realtime(FEED_HOLD), None);
        assert_eq!(sim.state(), MachineState::Idle);
        sim.set_machine_state(MachineState::Run);
        sim.realtime(FEED_HOLD);
        assert_eq!(sim.state(), MachineState::Hold);
        sim.realtime(CYCLE_START);
        assert_eq!(sim.state(), MachineState::Idle);
    }

    #[test]
    fn door_then_resume() {
        let mut sim = simulator();
        sim.realtime(SAFETY_DOOR);
        assert_eq!(sim.state(), MachineState::Door);
        sim.realtime(CYCLE_START);
        assert_eq!(sim.state(), MachineState::Idle);
    }

    #[test]
    fn idle_reset_returns_banner() {
        let mut sim = simulator();
        sim.submit_line("G91 G55 S100 M3");
        sim.submit_line("G92 X5");
        sim.realtime(FEED_COARSE_PLUS);
        assert_eq!(sim.realtime(SOFT_RESET), Some("\r\nGrbl 1.1h ['$' for help]\r\n".to_string()));
        assert_eq!(sim.modal(), &ModalState::default());
        assert!(sim.overrides().is_default());
        assert_eq!(sim.frame().g92, grbl_shared::Position::ORIGIN);
        assert_eq!(sim.state(), MachineState::Idle);
    }

    #[test]
    fn overrides_show_in_status() {
        let mut sim = simulator();
        sim.realtime(FEED_COARSE_PLUS);
        let status = sim.realtime(STATUS_QUERY).unwrap();
        assert!(status.ends_with("|Ov:110,100,100>\r\n"));
    }
}
