//! The `?` status report.

use crate::overrides::Overrides;
use crate::state::MachineState;
use grbl_shared::Position;
use serde::Serialize;

/// Everything a status line shows, captured at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub state: MachineState,
    pub machine_position: Position,
    pub work_position: Position,
    /// Report MPos rather than WPos (`$10` bit 0).
    pub report_machine: bool,
    pub feed_rate: f64,
    pub spindle_speed: f64,
    pub planner_available: usize,
    pub rx_available: usize,
    pub feed_override: u8,
    pub rapid_override: u8,
    pub spindle_override: u8,
    pub laser_power: f64,
}

impl StatusSnapshot {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            feed: self.feed_override,
            rapid: self.rapid_override,
            spindle: self.spindle_override,
        }
    }

    /// `<State|MPos:...|FS:...|Bf:...[|Ov:...]>\r\n`
    pub fn render(&self) -> String {
        let (label, position) = if self.report_machine {
            ("MPos", self.machine_position)
        } else {
            ("WPos", self.work_position)
        };
        let mut line = format!(
            "<{}|{}:{}|FS:{:.0},{:.0}|Bf:{},{}",
            self.state,
            label,
            position.format_report(),
            self.feed_rate,
            self.spindle_speed,
            self.planner_available,
            self.rx_available
        );
        let overrides = self.overrides();
        if !overrides.is_default() {
            line.push_str(&format!("|Ov:{}", overrides.report()));
        }
        line.push_str(">\r\n");
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle() -> StatusSnapshot {
        StatusSnapshot {
            state: MachineState::Idle,
            machine_position: Position::new(10.0, 0.0, 0.0),
            work_position: Position::new(5.0, 0.0, 0.0),
            report_machine: true,
            feed_rate: 0.0,
            spindle_speed: 0.0,
            planner_available: 15,
            rx_available: 128,
            feed_override: 100,
            rapid_override: 100,
            spindle_override: 100,
            laser_power: 0.0,
        }
    }

    #[test]
    fn machine_position_report() {
        assert_eq!(idle().render(), "<Idle|MPos:10.000,0.000,0.000|FS:0,0|Bf:15,128>\r\n");
    }

    #[test]
    fn work_position_and_overrides() {
        let snapshot = StatusSnapshot {
            state: MachineState::Run,
            report_machine: false,
            feed_rate: 600.0,
            spindle_speed: 1000.0,
            planner_available: 14,
            feed_override: 120,
            ..idle()
        };
        assert_eq!(
            snapshot.render(),
            "<Run|WPos:5.000,0.000,0.000|FS:600,1000|Bf:14,128|Ov:120,100,100>\r\n"
        );
    }
}
