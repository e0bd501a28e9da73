use serde::Serialize;
use std::fmt;

/// Controller operating mode, as reported in the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum MachineState {
    #[default]
    Idle,
    Run,
    Hold,
    Jog,
    Alarm,
    Door,
    Check,
    Home,
    Sleep,
}

impl MachineState {
    /// G-code lines are refused with `error:8` in these states.
    pub fn locks_gcode(self) -> bool {
        matches!(self, MachineState::Alarm | MachineState::Sleep | MachineState::Jog)
    }

    /// Motion is executing or suspended mid-cycle.
    pub fn in_cycle(self) -> bool {
        matches!(
            self,
            MachineState::Run | MachineState::Jog | MachineState::Home | MachineState::Hold | MachineState::Door
        )
    }

    /// The tick executor does not advance motion while suspended.
    pub fn is_suspended(self) -> bool {
        matches!(self, MachineState::Hold | MachineState::Door)
    }

    pub fn can_hold(self) -> bool {
        matches!(self, MachineState::Run | MachineState::Jog)
    }

    pub fn can_jog(self) -> bool {
        matches!(self, MachineState::Idle | MachineState::Jog)
    }

    pub fn can_toggle_check(self) -> bool {
        matches!(self, MachineState::Idle | MachineState::Check)
    }

    pub fn can_home(self) -> bool {
        matches!(self, MachineState::Idle | MachineState::Alarm)
    }

    pub fn can_open_door(self) -> bool {
        matches!(
            self,
            MachineState::Idle | MachineState::Run | MachineState::Jog | MachineState::Hold
        )
    }

    /// Laser output is only live while moving under program or jog control.
    pub fn fires_laser(self) -> bool {
        matches!(self, MachineState::Run | MachineState::Jog)
    }
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MachineState::Idle => "Idle",
            MachineState::Run => "Run",
            MachineState::Hold => "Hold",
            MachineState::Jog => "Jog",
            MachineState::Alarm => "Alarm",
            MachineState::Door => "Door",
            MachineState::Check => "Check",
            MachineState::Home => "Home",
            MachineState::Sleep => "Sleep",
        };
        f.write_str(name)
    }
}
