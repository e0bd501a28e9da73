//! G-code line execution.
//!
//! A line is planned against copies of the modal state and coordinate
//! frame. Nothing is committed until its blocks are known to fit in the
//! planner, so a line held for planner space can be replayed verbatim.

use super::{LineOutcome, OK, Simulator};
use crate::coords::CoordinateFrame;
use crate::modal::{FeedRateMode, ModalState, MotionMode};
use crate::motion::{self, ArcRequest, Feed};
use crate::planner::PlannerBlock;
use crate::state::MachineState;
use grbl_shared::gcode::{Code, ParsedLine, parse_line};
use grbl_shared::{GrblError, Position};
use std::time::Duration;

const DWELL: Code = Code::g(4);
const SET_OFFSET: Code = Code::g(10);
const GO_HOME: Code = Code::g(28);
const SET_HOME: Code = Code::g_sub(28, 1);
const GO_SECONDARY_HOME: Code = Code::g(30);
const SET_SECONDARY_HOME: Code = Code::g_sub(30, 1);
const MACHINE_COORDS: Code = Code::g(53);
const SET_G92: Code = Code::g(92);
const CLEAR_G92: Code = Code::g_sub(92, 1);

/// Codes outside every modal group.
const NON_MODAL: [Code; 9] = [
    DWELL,
    SET_OFFSET,
    GO_HOME,
    SET_HOME,
    GO_SECONDARY_HOME,
    SET_SECONDARY_HOME,
    MACHINE_COORDS,
    SET_G92,
    CLEAR_G92,
];

/// Non-modal codes that use the axis words themselves.
const AXIS_CONSUMERS: [Code; 6] = [SET_OFFSET, GO_HOME, SET_HOME, GO_SECONDARY_HOME, SET_SECONDARY_HOME, SET_G92];

/// Everything a line would change, computed without side effects.
struct LinePlan {
    modal: ModalState,
    frame: CoordinateFrame,
    blocks: Vec<PlannerBlock>,
    dwell: Option<Duration>,
}

fn non_negative(value: Option<f64>) -> Result<Option<f64>, GrblError> {
    match value {
        Some(v) if v < 0.0 => Err(GrblError::InvalidStatement),
        other => Ok(other),
    }
}

impl Simulator {
    pub(crate) fn execute_gcode(&mut self, line: &str) -> LineOutcome {
        if self.state.locks_gcode() {
            return LineOutcome::Respond(GrblError::NotIdle.response());
        }
        let plan = match parse_line(line).and_then(|parsed| self.plan_line(&parsed)) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!("{:?}: {}", line, e);
                return LineOutcome::Respond(e.response());
            }
        };

        if self.state == MachineState::Check {
            // Validated only: no motion, no persistent offsets.
            self.modal = plan.modal;
            self.recompute_laser_power();
            self.refresh_work_position();
            return LineOutcome::Respond(OK.to_string());
        }

        if plan.blocks.len() > self.planner.available() {
            return LineOutcome::NeedsPlanner;
        }

        self.modal = plan.modal;
        self.frame = plan.frame;
        for block in plan.blocks {
            if let Err(e) = self.planner.admit(block) {
                tracing::error!("block dropped after capacity check: {}", e);
            }
        }
        self.refresh_work_position();
        self.recompute_laser_power();

        match plan.dwell {
            Some(duration) => LineOutcome::Dwell(duration),
            None => LineOutcome::Respond(OK.to_string()),
        }
    }

    fn plan_line(&self, parsed: &ParsedLine) -> Result<LinePlan, GrblError> {
        let mut modal = self.modal.clone();
        let mut frame = self.frame.clone();

        for code in &parsed.codes {
            if !modal.apply(*code) && !NON_MODAL.contains(code) {
                return Err(GrblError::UnsupportedCommand);
            }
        }
        if let Some(f) = non_negative(parsed.f)? {
            if modal.feed_mode == FeedRateMode::UnitsPerMinute {
                modal.feed_rate = modal.units.to_mm(f);
            }
        }
        if let Some(s) = non_negative(parsed.s)? {
            modal.spindle_speed = s;
        }
        if let Some(t) = non_negative(parsed.t)? {
            modal.tool = t as u32;
        }

        let reference = self.planner.reference_position(self.machine_position);
        let machine_coords = parsed.has_code(MACHINE_COORDS);
        let ctx = self.motion_context();
        let mut blocks = Vec::new();
        let mut dwell = None;

        if parsed.has_code(DWELL) {
            let seconds = non_negative(parsed.p)?.ok_or(GrblError::DwellMissingP)?;
            dwell = Some(Duration::try_from_secs_f64(seconds).map_err(|_| GrblError::InvalidStatement)?);
        }

        if parsed.has_code(SET_OFFSET) {
            let index = match parsed.p {
                Some(p) if p.fract() == 0.0 && (0.0..=6.0).contains(&p) => {
                    if p == 0.0 { modal.coord_system } else { p as usize - 1 }
                }
                _ => return Err(GrblError::InvalidStatement),
            };
            if !parsed.has_axis_words() {
                return Err(GrblError::NoAxisWords);
            }
            match parsed.l {
                Some(l) if l == 2.0 => frame.set_wcs(index, parsed, &modal),
                Some(l) if l == 20.0 => frame.set_wcs_from_position(index, parsed, &modal, reference),
                _ => return Err(GrblError::InvalidStatement),
            }
        }

        if parsed.has_code(SET_G92) {
            if !parsed.has_axis_words() {
                return Err(GrblError::NoAxisWords);
            }
            frame.set_g92(parsed, &modal, reference);
        }
        if parsed.has_code(CLEAR_G92) {
            frame.clear_g92();
        }

        if parsed.has_code(GO_HOME) || parsed.has_code(GO_SECONDARY_HOME) {
            // The stored home positions are fixed at machine zero.
            let mut from = reference;
            if parsed.has_axis_words() {
                let via = frame.resolve_target(parsed, &modal, reference, machine_coords);
                blocks.extend(motion::linear(from, via, Feed::Rapid, &ctx)?);
                from = via;
            }
            blocks.extend(motion::linear(from, Position::ORIGIN, Feed::Rapid, &ctx)?);
        } else if parsed.has_axis_words() && !AXIS_CONSUMERS.iter().any(|c| parsed.has_code(*c)) {
            let target = frame.resolve_target(parsed, &modal, reference, machine_coords);
            let block = match modal.motion {
                MotionMode::Rapid => motion::linear(reference, target, Feed::Rapid, &ctx)?,
                MotionMode::Linear => motion::linear(reference, target, feed(&modal, parsed)?, &ctx)?,
                MotionMode::ArcCw | MotionMode::ArcCcw => {
                    let (first, second, _) = modal.plane.axes();
                    let to_mm = |v: Option<f64>| v.map(|v| modal.units.to_mm(v));
                    let request = ArcRequest {
                        plane: modal.plane,
                        clockwise: modal.motion == MotionMode::ArcCw,
                        radius: to_mm(parsed.r),
                        offsets: (to_mm(parsed.offset(first)), to_mm(parsed.offset(second))),
                    };
                    motion::arc(reference, target, request, feed(&modal, parsed)?, &ctx)?
                }
                MotionMode::Probe(mode) => {
                    motion::probe(reference, target, mode, self.probe_pin, feed(&modal, parsed)?, &ctx)?
                }
                MotionMode::Cancel => return Err(GrblError::InvalidStatement),
            };
            blocks.extend(block);
        } else if !parsed.has_axis_words() && explicit_motion(parsed) {
            return Err(GrblError::NoAxisWords);
        }

        Ok(LinePlan { modal, frame, blocks, dwell })
    }
}

/// The line names an arc or probe code, which cannot run without a target.
fn explicit_motion(parsed: &ParsedLine) -> bool {
    parsed.codes.iter().any(|c| {
        c.letter == 'G' && matches!((c.number, c.sub), (2, None) | (3, None) | (38, Some(_)))
    })
}

fn feed(modal: &ModalState, parsed: &ParsedLine) -> Result<Feed, GrblError> {
    match modal.feed_mode {
        FeedRateMode::UnitsPerMinute => Ok(Feed::UnitsPerMinute(modal.feed_rate)),
        // Inverse time needs F on every motion line.
        FeedRateMode::InverseTime => parsed.f.map(Feed::InverseTime).ok_or(GrblError::UndefinedFeedRate),
    }
}
