//! `$` system commands and jogging.

use super::{LineOutcome, OK, Simulator};
use crate::buffers::RX_BUFFER_SIZE;
use crate::coords::CoordinateFrame;
use crate::motion::{self, JogRequest};
use crate::planner::PLANNER_CAPACITY;
use crate::state::MachineState;
use grbl_shared::GrblError;

const HELP: &str = "[HLP:$$ $# $G $I $N $x=val $Nx=line $J=line $SLP $C $X $H ~ ! ? ctrl-x]\r\n";

impl Simulator {
    /// Runs a system command and returns its complete response.
    pub(crate) fn system_command(&mut self, line: &str) -> String {
        let command = line.to_ascii_uppercase();
        let result = match command.as_str() {
            "$" => Ok(format!("{}{}", HELP, OK)),
            "$$" => Ok(format!("{}{}", self.settings.report(), OK)),
            "$#" => Ok(self.parameters_report()),
            "$G" => Ok(format!("{}{}", self.modal.report(), OK)),
            "$I" => Ok(self.build_info()),
            "$N" => Ok(format!(
                "$N0={}\r\n$N1={}\r\n{}",
                self.startup_lines[0], self.startup_lines[1], OK
            )),
            "$C" => self.toggle_check_mode(),
            "$X" => Ok(self.unlock()),
            "$H" => self.start_homing(),
            "$SLP" => self.sleep(),
            "$RST=$" | "$RST=#" | "$RST=*" => self.restore(&command[5..]),
            _ if command.starts_with("$N") => self.store_startup_line(line),
            _ => self.assign_setting(&command),
        };
        result.unwrap_or_else(|e| {
            tracing::warn!("{:?}: {}", line, e);
            e.response()
        })
    }

    fn build_info(&self) -> String {
        format!(
            "[VER:{}.{}:Grbl Simulator]\r\n[OPT:V,{},{}]\r\n{}",
            self.config.version, self.config.build, PLANNER_CAPACITY, RX_BUFFER_SIZE, OK
        )
    }

    fn parameters_report(&self) -> String {
        format!(
            "{}[TLO:0.000]\r\n[PRB:{}:{}]\r\n{}",
            self.frame.report(),
            self.probe.position.format_report(),
            u8::from(self.probe.success),
            OK
        )
    }

    fn toggle_check_mode(&mut self) -> Result<String, GrblError> {
        if !self.state.can_toggle_check() {
            return Err(GrblError::NotIdle);
        }
        if self.state == MachineState::Check {
            self.set_machine_state(MachineState::Idle);
            return Ok(format!("[MSG:Disabled]\r\n{}", OK));
        }
        if !self.planner.is_idle() {
            return Err(GrblError::NotIdle);
        }
        self.set_machine_state(MachineState::Check);
        Ok(format!("[MSG:Enabled]\r\n{}", OK))
    }

    fn unlock(&mut self) -> String {
        if self.state != MachineState::Alarm {
            return OK.to_string();
        }
        self.alarm = None;
        self.set_machine_state(MachineState::Idle);
        format!("[MSG:Caution: Unlocked]\r\n{}", OK)
    }

    fn start_homing(&mut self) -> Result<String, GrblError> {
        if !self.settings.homing_enabled() {
            return Err(GrblError::SettingDisabled);
        }
        if !self.state.can_home() || !self.planner.is_idle() {
            return Err(GrblError::NotIdle);
        }
        let block = motion::home(self.machine_position, &self.motion_context())?;
        if let Err(e) = self.planner.admit(block) {
            tracing::error!("homing block rejected: {}", e);
            return Err(GrblError::NotIdle);
        }
        tracing::info!("homing cycle queued");
        Ok(OK.to_string())
    }

    fn sleep(&mut self) -> Result<String, GrblError> {
        if self.state.in_cycle() {
            return Err(GrblError::NotIdle);
        }
        self.set_machine_state(MachineState::Sleep);
        Ok(OK.to_string())
    }

    fn restore(&mut self, what: &str) -> Result<String, GrblError> {
        if self.state.in_cycle() {
            return Err(GrblError::NotIdle);
        }
        match what {
            "$" => self.settings.restore_defaults(),
            "#" => self.frame = CoordinateFrame::default(),
            _ => {
                self.settings.restore_defaults();
                self.frame = CoordinateFrame::default();
                self.startup_lines = Default::default();
            }
        }
        tracing::info!("restored defaults ($RST={})", what);
        self.refresh_work_position();
        self.recompute_laser_power();
        Ok(OK.to_string())
    }

    /// `$N0=line` / `$N1=line`. Stored and reported, never executed.
    fn store_startup_line(&mut self, line: &str) -> Result<String, GrblError> {
        let (key, value) = line.split_once('=').ok_or(GrblError::InvalidStatement)?;
        let slot = match key.to_ascii_uppercase().as_str() {
            "$N0" => 0,
            "$N1" => 1,
            _ => return Err(GrblError::InvalidStatement),
        };
        self.startup_lines[slot] = value.trim().to_string();
        Ok(OK.to_string())
    }

    fn assign_setting(&mut self, command: &str) -> Result<String, GrblError> {
        let (key, value) = command[1..].split_once('=').ok_or(GrblError::InvalidStatement)?;
        let index: u16 = key.trim().parse().map_err(|_| GrblError::InvalidStatement)?;
        let value: f64 = value.trim().parse().map_err(|_| GrblError::InvalidStatement)?;
        if self.state.in_cycle() {
            return Err(GrblError::NotIdle);
        }
        self.settings.set(index, value)?;
        self.recompute_laser_power();
        Ok(OK.to_string())
    }

    pub(crate) fn execute_jog(&mut self, body: &str) -> LineOutcome {
        if !self.state.can_jog() {
            return LineOutcome::Respond(GrblError::NotIdle.response());
        }
        let reference = self.planner.reference_position(self.machine_position);
        let result = JogRequest::parse(body).and_then(|request| {
            motion::jog(&request, &self.modal, &self.frame, reference, &self.motion_context())
        });
        match result {
            Ok(Some(_)) if self.planner.available() == 0 => LineOutcome::NeedsPlanner,
            Ok(Some(block)) => {
                if let Err(e) = self.planner.admit(block) {
                    tracing::error!("jog block dropped after capacity check: {}", e);
                }
                LineOutcome::Respond(OK.to_string())
            }
            Ok(None) => LineOutcome::Respond(OK.to_string()),
            Err(e) => {
                tracing::warn!("$J={}: {}", body, e);
                LineOutcome::Respond(e.response())
            }
        }
    }
}
