//! The simulated controller: line intake, real-time commands and the tick executor.

pub mod clock;
mod executor;
mod gcode;
pub mod realtime;
mod system;

pub use clock::SimClock;

use crate::buffers::{AdmissionQueue, LINE_BUFFER_SIZE, RxBuffer, Ticket};
use crate::coords::CoordinateFrame;
use crate::modal::ModalState;
use crate::motion::MotionContext;
use crate::overrides::Overrides;
use crate::planner::PlannerQueue;
use crate::state::MachineState;
use crate::status::StatusSnapshot;
use grbl_shared::{
    AlarmCode, ConfigError, GrblError, Position, SimConfig, SimulatorConfig, Settings, TimeInterface,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

pub const OK: &str = "ok\r\n";

/// Immediate result of handing a line to the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The full response, ready to send.
    Done(String),
    /// The response arrives later as a [`SimEvent::LineComplete`].
    Pending(Ticket),
}

/// Output produced by [`Simulator::tick`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SimEvent {
    LineComplete { ticket: Ticket, response: String },
    /// Unsolicited output such as `ALARM:2`.
    Push(String),
}

/// Result of the most recent probing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ProbeRecord {
    pub position: Position,
    pub success: bool,
}

/// How processing a line ended.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LineOutcome {
    Respond(String),
    /// Respond once the planner drains and the dwell elapses.
    Dwell(Duration),
    /// The line's blocks do not fit in the planner yet. Nothing was committed.
    NeedsPlanner,
}

#[derive(Debug, Clone)]
struct PendingDwell {
    ticket: Ticket,
    duration: Duration,
    started_at: Option<Duration>,
}

pub struct Simulator {
    config: SimulatorConfig,
    clock: Arc<dyn TimeInterface>,
    settings: Settings,
    state: MachineState,
    alarm: Option<AlarmCode>,
    laser_power: f64,
    modal: ModalState,
    frame: CoordinateFrame,
    machine_position: Position,
    work_position: Position,
    planner: PlannerQueue,
    rx: RxBuffer,
    admission: AdmissionQueue,
    dwell: Option<PendingDwell>,
    overrides: Overrides,
    probe: ProbeRecord,
    probe_pin: bool,
    startup_lines: [String; 2],
    next_ticket: u64,
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator").finish_non_exhaustive()
    }
}

pub(crate) fn is_jog(line: &str) -> bool {
    line.get(..3).is_some_and(|prefix| prefix.eq_ignore_ascii_case("$J="))
}

impl Simulator {
    /// Builds a simulator from configuration; fails on invalid setting overrides.
    pub fn new(config: &SimConfig, clock: Arc<dyn TimeInterface>) -> Result<Self, ConfigError> {
        let settings = config.settings()?;
        Ok(Self::from_parts(config.simulator.clone(), settings, clock))
    }

    /// Firmware defaults on the given clock.
    pub fn with_clock(clock: Arc<dyn TimeInterface>) -> Self {
        Self::from_parts(SimulatorConfig::default(), Settings::new(), clock)
    }

    fn from_parts(config: SimulatorConfig, settings: Settings, clock: Arc<dyn TimeInterface>) -> Self {
        tracing::info!("Simulator initialized: Grbl {}.{}", config.version, config.build);
        Self {
            config,
            clock,
            settings,
            state: MachineState::Idle,
            alarm: None,
            laser_power: 0.0,
            modal: ModalState::default(),
            frame: CoordinateFrame::default(),
            machine_position: Position::ORIGIN,
            work_position: Position::ORIGIN,
            planner: PlannerQueue::default(),
            rx: RxBuffer::default(),
            admission: AdmissionQueue::new(),
            dwell: None,
            overrides: Overrides::default(),
            probe: ProbeRecord::default(),
            probe_pin: false,
            startup_lines: Default::default(),
            next_ticket: 0,
        }
    }

    pub fn banner(&self) -> String {
        format!("\r\nGrbl {} ['$' for help]\r\n", self.config.version)
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn alarm(&self) -> Option<AlarmCode> {
        self.alarm
    }

    /// Assigns the machine state and recomputes everything derived from it.
    pub fn set_machine_state(&mut self, next: MachineState) {
        if next != self.state {
            tracing::info!("state {} -> {}", self.state, next);
        }
        self.state = next;
        self.recompute_laser_power();
    }

    pub fn laser_power(&self) -> f64 {
        self.laser_power
    }

    fn recompute_laser_power(&mut self) {
        self.laser_power = if self.settings.laser_mode() && self.modal.spindle_on() && self.state.fires_laser() {
            self.modal.spindle_speed.min(self.settings.max_spindle_speed())
        } else {
            0.0
        };
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn modal(&self) -> &ModalState {
        &self.modal
    }

    pub fn frame(&self) -> &CoordinateFrame {
        &self.frame
    }

    pub fn overrides(&self) -> Overrides {
        self.overrides
    }

    /// Last committed machine position.
    pub fn machine_position(&self) -> Position {
        self.machine_position
    }

    /// Work position matching [`Self::machine_position`].
    pub fn work_position(&self) -> Position {
        self.work_position
    }

    /// Interpolated position of the tool right now.
    pub fn sampled_position(&self) -> Position {
        let now = self.clock.now();
        self.planner
            .executing()
            .map(|m| m.position_at(now))
            .unwrap_or(self.machine_position)
    }

    pub fn planner(&self) -> &PlannerQueue {
        &self.planner
    }

    pub fn rx_used(&self) -> usize {
        self.rx.used()
    }

    pub fn rx_available(&self) -> usize {
        self.rx.available(self.admission.reserved_bytes())
    }

    pub fn admission_len(&self) -> usize {
        self.admission.len()
    }

    /// Bytes of lines waiting for planner space.
    pub fn admission_bytes(&self) -> usize {
        self.admission.reserved_bytes()
    }

    pub fn probe_record(&self) -> ProbeRecord {
        self.probe
    }

    pub fn probe_pin(&self) -> bool {
        self.probe_pin
    }

    /// Forces the probe input, as a touch plate would.
    pub fn set_probe_pin(&mut self, triggered: bool) {
        self.probe_pin = triggered;
    }

    pub fn dwell_pending(&self) -> bool {
        self.dwell.is_some()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let now = self.clock.now();
        let executing = self.planner.executing();
        let machine = executing.map(|m| m.position_at(now)).unwrap_or(self.machine_position);
        let spindle_speed = if self.modal.spindle_on() {
            self.modal.spindle_speed * f64::from(self.overrides.spindle) / 100.0
        } else {
            0.0
        };
        StatusSnapshot {
            state: self.state,
            machine_position: machine,
            work_position: self.frame.work_position(machine, self.modal.coord_system),
            report_machine: self.settings.report_machine_position(),
            feed_rate: executing.map(|m| m.block.feed_rate).unwrap_or(0.0),
            spindle_speed,
            planner_available: self.planner.available(),
            rx_available: self.rx_available(),
            feed_override: self.overrides.feed,
            rapid_override: self.overrides.rapid,
            spindle_override: self.overrides.spindle,
            laser_power: self.laser_power,
        }
    }

    pub fn status_report(&self) -> String {
        self.snapshot().render()
    }

    /// Accepts one line, without its terminator.
    pub fn submit_line(&mut self, line: &str) -> Submission {
        let line = line.trim();
        let submission = self.intake(line);
        if self.config.debug {
            tracing::info!("<< {:?} => {:?}", line, submission);
        } else {
            tracing::debug!("<< {:?} => {:?}", line, submission);
        }
        submission
    }

    fn intake(&mut self, line: &str) -> Submission {
        if line.len() > LINE_BUFFER_SIZE {
            tracing::warn!("rejected line of {} bytes", line.len());
            return Submission::Done(GrblError::LineTooLong.response());
        }
        if line.starts_with('$') && !is_jog(line) {
            return Submission::Done(self.system_command(line));
        }
        if let Err(e) = self.rx.reserve(line.len(), self.admission.reserved_bytes()) {
            tracing::warn!("rejected {:?}: {}", line, e);
            return Submission::Done(e.response());
        }

        // Later lines may not overtake one that is still waiting.
        if !self.admission.is_empty() || self.dwell.is_some() {
            self.rx.release();
            let ticket = self.issue_ticket();
            self.admission.push(line.to_string(), ticket);
            return Submission::Pending(ticket);
        }

        let outcome = self.process_line(line);
        self.rx.release();
        match outcome {
            LineOutcome::Respond(response) => Submission::Done(response),
            LineOutcome::Dwell(duration) => {
                let ticket = self.issue_ticket();
                self.dwell = Some(PendingDwell { ticket, duration, started_at: None });
                Submission::Pending(ticket)
            }
            LineOutcome::NeedsPlanner => {
                let ticket = self.issue_ticket();
                tracing::debug!("planner full, holding {:?} as {:?}", line, ticket);
                self.admission.push(line.to_string(), ticket);
                Submission::Pending(ticket)
            }
        }
    }

    fn issue_ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        Ticket(self.next_ticket)
    }

    pub(crate) fn process_line(&mut self, line: &str) -> LineOutcome {
        if is_jog(line) {
            self.execute_jog(&line[3..])
        } else {
            self.execute_gcode(line)
        }
    }

    pub(crate) fn motion_context(&self) -> MotionContext<'_> {
        MotionContext { settings: &self.settings, overrides: self.overrides }
    }

    pub(crate) fn refresh_work_position(&mut self) {
        self.work_position = self.frame.work_position(self.machine_position, self.modal.coord_system);
    }

    /// Stops all motion where it currently is. Returns whether anything was moving.
    pub(crate) fn abort_motion(&mut self) -> bool {
        let now = self.clock.now();
        match self.planner.clear() {
            Some(motion) => {
                self.machine_position = motion.position_at(now);
                self.refresh_work_position();
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulator() -> (Simulator, SimClock) {
        let clock = SimClock::new();
        (Simulator::with_clock(Arc::new(clock.clone())), clock)
    }

    #[test]
    fn starts_idle_at_origin() {
        let (sim, _) = simulator();
        assert_eq!(sim.state(), MachineState::Idle);
        assert_eq!(sim.banner(), "\r\nGrbl 1.1h ['$' for help]\r\n");
        assert_eq!(sim.status_report(), "<Idle|MPos:0.000,0.000,0.000|FS:0,0|Bf:15,128>\r\n");
    }

    #[test]
    fn long_lines_are_rejected() {
        let (mut sim, _) = simulator();
        let line = format!("G0 X1 ({})", "a".repeat(80));
        assert_eq!(sim.submit_line(&line), Submission::Done("error:14\r\n".into()));
        assert_eq!(sim.rx_used(), 0);
    }

    #[test]
    fn laser_power_follows_state() {
        let (mut sim, _) = simulator();
        sim.submit_line("$32=1");
        sim.submit_line("M3 S1500");
        assert_eq!(sim.laser_power(), 0.0);
        sim.set_machine_state(MachineState::Run);
        assert_eq!(sim.laser_power(), 1000.0);
        sim.set_machine_state(MachineState::Hold);
        assert_eq!(sim.laser_power(), 0.0);
    }

    #[test]
    fn jog_prefix_detection() {
        assert!(is_jog("$J=X1F10"));
        assert!(is_jog("$j=X1F10"));
        assert!(!is_jog("$J"));
        assert!(!is_jog("$$"));
    }

    #[test]
    fn configured_settings_are_applied() {
        let mut config = SimConfig::default();
        config.settings.insert("10".into(), 0.0);
        let sim = Simulator::new(&config, Arc::new(SimClock::new())).unwrap();
        assert!(sim.status_report().starts_with("<Idle|WPos:"));
    }
}
