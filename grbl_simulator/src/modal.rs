//! Parser modal state: one active selection per modal group.

use grbl_shared::gcode::Code;
use grbl_shared::Axis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeMode {
    /// G38.2/G38.3 move towards the workpiece, G38.4/G38.5 away from it.
    pub toward: bool,
    /// G38.2/G38.4 report failure; G38.3/G38.5 do not.
    pub signal_error: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionMode {
    Rapid,
    Linear,
    ArcCw,
    ArcCcw,
    Probe(ProbeMode),
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    Xy,
    Zx,
    Yz,
}

impl Plane {
    /// The two in-plane axes followed by the linear (helical) axis.
    pub fn axes(self) -> (Axis, Axis, Axis) {
        match self {
            Plane::Xy => (Axis::X, Axis::Y, Axis::Z),
            Plane::Zx => (Axis::Z, Axis::X, Axis::Y),
            Plane::Yz => (Axis::Y, Axis::Z, Axis::X),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMode {
    Absolute,
    Incremental,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedRateMode {
    UnitsPerMinute,
    InverseTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    Millimeters,
    Inches,
}

impl Units {
    pub fn to_mm(self, value: f64) -> f64 {
        match self {
            Units::Millimeters => value,
            Units::Inches => value * 25.4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolLengthMode {
    Cancel,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramFlow {
    Running,
    Paused,
    OptionalStop,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpindleState {
    Off,
    Cw,
    Ccw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Coolant {
    pub mist: bool,
    pub flood: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModalState {
    pub motion: MotionMode,
    /// Active work coordinate system, 0 for G54 through 5 for G59.
    pub coord_system: usize,
    pub plane: Plane,
    pub distance: DistanceMode,
    pub feed_mode: FeedRateMode,
    pub units: Units,
    /// G40 is the only supported cutter compensation mode.
    pub cutter_comp_off: bool,
    pub tool_length: ToolLengthMode,
    pub program: ProgramFlow,
    pub spindle: SpindleState,
    pub coolant: Coolant,
    /// Programmed feed rate, mm/min (or 1/min in inverse time mode).
    pub feed_rate: f64,
    pub spindle_speed: f64,
    pub tool: u32,
}

impl Default for ModalState {
    fn default() -> Self {
        Self {
            motion: MotionMode::Rapid,
            coord_system: 0,
            plane: Plane::Xy,
            distance: DistanceMode::Absolute,
            feed_mode: FeedRateMode::UnitsPerMinute,
            units: Units::Millimeters,
            cutter_comp_off: true,
            tool_length: ToolLengthMode::Cancel,
            program: ProgramFlow::Running,
            spindle: SpindleState::Off,
            coolant: Coolant::default(),
            feed_rate: 0.0,
            spindle_speed: 0.0,
            tool: 0,
        }
    }
}

impl ModalState {
    /// Applies a code to its modal group. Returns `false` for codes that
    /// belong to no modal group (G4, G10, G28, G92, ...).
    pub fn apply(&mut self, code: Code) -> bool {
        match (code.letter, code.number, code.sub) {
            ('G', 0, None) => self.motion = MotionMode::Rapid,
            ('G', 1, None) => self.motion = MotionMode::Linear,
            ('G', 2, None) => self.motion = MotionMode::ArcCw,
            ('G', 3, None) => self.motion = MotionMode::ArcCcw,
            ('G', 38, Some(sub @ 2..=5)) => {
                self.motion = MotionMode::Probe(ProbeMode {
                    toward: sub <= 3,
                    signal_error: sub % 2 == 0,
                })
            }
            ('G', 80, None) => self.motion = MotionMode::Cancel,
            ('G', 17, None) => self.plane = Plane::Xy,
            ('G', 18, None) => self.plane = Plane::Zx,
            ('G', 19, None) => self.plane = Plane::Yz,
            ('G', 20, None) => self.units = Units::Inches,
            ('G', 21, None) => self.units = Units::Millimeters,
            ('G', 40, None) => self.cutter_comp_off = true,
            ('G', 43, Some(1)) => self.tool_length = ToolLengthMode::Dynamic,
            ('G', 49, None) => self.tool_length = ToolLengthMode::Cancel,
            ('G', n @ 54..=59, None) => self.coord_system = (n - 54) as usize,
            ('G', 90, None) => self.distance = DistanceMode::Absolute,
            ('G', 91, None) => self.distance = DistanceMode::Incremental,
            ('G', 93, None) => self.feed_mode = FeedRateMode::InverseTime,
            ('G', 94, None) => self.feed_mode = FeedRateMode::UnitsPerMinute,
            ('M', 0, None) => self.program = ProgramFlow::Paused,
            ('M', 1, None) => self.program = ProgramFlow::OptionalStop,
            ('M', 2, None) | ('M', 30, None) => self.end_program(),
            ('M', 3, None) => self.spindle = SpindleState::Cw,
            ('M', 4, None) => self.spindle = SpindleState::Ccw,
            ('M', 5, None) => self.spindle = SpindleState::Off,
            ('M', 7, None) => self.coolant.mist = true,
            ('M', 8, None) => self.coolant.flood = true,
            ('M', 9, None) => self.coolant = Coolant::default(),
            _ => return false,
        }
        true
    }

    // M2/M30 restore the program-start subset of modal groups.
    fn end_program(&mut self) {
        self.program = ProgramFlow::Completed;
        self.motion = MotionMode::Linear;
        self.plane = Plane::Xy;
        self.distance = DistanceMode::Absolute;
        self.feed_mode = FeedRateMode::UnitsPerMinute;
        self.coord_system = 0;
        self.spindle = SpindleState::Off;
        self.coolant = Coolant::default();
    }

    pub fn spindle_on(&self) -> bool {
        self.spindle != SpindleState::Off
    }

    /// `[GC:...]` line reported by `$G`.
    pub fn report(&self) -> String {
        let motion = match self.motion {
            MotionMode::Rapid => "G0".to_string(),
            MotionMode::Linear => "G1".to_string(),
            MotionMode::ArcCw => "G2".to_string(),
            MotionMode::ArcCcw => "G3".to_string(),
            MotionMode::Probe(mode) => {
                let sub = match (mode.toward, mode.signal_error) {
                    (true, true) => 2,
                    (true, false) => 3,
                    (false, true) => 4,
                    (false, false) => 5,
                };
                format!("G38.{}", sub)
            }
            MotionMode::Cancel => "G80".to_string(),
        };
        let plane = match self.plane {
            Plane::Xy => "G17",
            Plane::Zx => "G18",
            Plane::Yz => "G19",
        };
        let units = match self.units {
            Units::Inches => "G20",
            Units::Millimeters => "G21",
        };
        let distance = match self.distance {
            DistanceMode::Absolute => "G90",
            DistanceMode::Incremental => "G91",
        };
        let feed_mode = match self.feed_mode {
            FeedRateMode::InverseTime => "G93",
            FeedRateMode::UnitsPerMinute => "G94",
        };
        let mut words = vec![
            motion,
            format!("G{}", 54 + self.coord_system),
            plane.to_string(),
            units.to_string(),
            distance.to_string(),
            feed_mode.to_string(),
        ];
        match self.program {
            ProgramFlow::Paused => words.push("M0".to_string()),
            ProgramFlow::OptionalStop => words.push("M1".to_string()),
            ProgramFlow::Completed => words.push("M2".to_string()),
            ProgramFlow::Running => {}
        }
        words.push(
            match self.spindle {
                SpindleState::Cw => "M3",
                SpindleState::Ccw => "M4",
                SpindleState::Off => "M5",
            }
            .to_string(),
        );
        match (self.coolant.mist, self.coolant.flood) {
            (false, false) => words.push("M9".to_string()),
            (mist, flood) => {
                if mist {
                    words.push("M7".to_string());
                }
                if flood {
                    words.push("M8".to_string());
                }
            }
        }
        words.push(format!("T{}", self.tool));
        format!(
            "[GC:{} F{:.0} S{:.0}]\r\n",
            words.join(" "),
            self.feed_rate,
            self.spindle_speed
        )
    }
}
