//! `$J=` jogging.

use super::{Feed, MIN_DISTANCE, MotionContext, timing};
use crate::coords::CoordinateFrame;
use crate::modal::ModalState;
use crate::planner::{BlockKind, PlannerBlock};
use grbl_shared::gcode::{Code, ParsedLine, parse_line};
use grbl_shared::{Axis, GrblError, Position};

const ALLOWED_CODES: [Code; 5] = [Code::g(20), Code::g(21), Code::g(53), Code::g(90), Code::g(91)];

/// A validated jog line.
#[derive(Debug, Clone, PartialEq)]
pub struct JogRequest {
    parsed: ParsedLine,
}

impl JogRequest {
    /// Parses the text after `$J=`.
    pub fn parse(body: &str) -> Result<Self, GrblError> {
        let parsed = parse_line(body)?;
        if parsed.codes.iter().any(|c| !ALLOWED_CODES.contains(c)) {
            return Err(GrblError::InvalidJog);
        }
        let stray_words = [parsed.s, parsed.i, parsed.j, parsed.k, parsed.r, parsed.p, parsed.l, parsed.t];
        if stray_words.iter().any(Option::is_some) || parsed.f.is_none() {
            return Err(GrblError::InvalidJog);
        }
        if !parsed.has_axis_words() {
            return Err(GrblError::NoAxisWords);
        }
        Ok(Self { parsed })
    }

    pub fn machine_coords(&self) -> bool {
        self.parsed.has_code(Code::g(53))
    }
}

/// Builds the jog block. Distance and unit words only affect this jog;
/// `modal` itself is never modified.
pub fn jog(
    request: &JogRequest,
    modal: &ModalState,
    frame: &CoordinateFrame,
    reference: Position,
    ctx: &MotionContext<'_>,
) -> Result<Option<PlannerBlock>, GrblError> {
    let mut overlay = modal.clone();
    for code in &request.parsed.codes {
        overlay.apply(*code);
    }
    let target = frame.resolve_target(&request.parsed, &overlay, reference, request.machine_coords());
    if ctx.settings.soft_limits_enabled()
        && Axis::ALL.iter().any(|a| target[*a].abs() > ctx.settings.max_travel(*a))
    {
        return Err(GrblError::TravelExceeded);
    }

    let feed = overlay.units.to_mm(request.parsed.f.unwrap_or(0.0));
    let distance = reference.distance(&target);
    let (feed_rate, duration) = timing(distance, Feed::UnitsPerMinute(feed), ctx, false)?;
    if distance < MIN_DISTANCE {
        return Ok(None);
    }
    Ok(Some(PlannerBlock {
        kind: BlockKind::Jog,
        start: reference,
        end: target,
        feed_rate,
        duration,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modal::{DistanceMode, Units};
    use crate::overrides::Overrides;
    use grbl_shared::Settings;
    use grbl_shared::settings::{MAX_TRAVEL, SOFT_LIMITS};
    use std::time::Duration;

    fn build(body: &str, settings: &Settings) -> Result<Option<PlannerBlock>, GrblError> {
        let ctx = MotionContext { settings, overrides: Overrides::default() };
        let request = JogRequest::parse(body)?;
        jog(&request, &ModalState::default(), &CoordinateFrame::default(), Position::new(1.0, 1.0, 0.0), &ctx)
    }

    #[test]
    fn validation_errors() {
        assert_eq!(JogRequest::parse("X10"), Err(GrblError::InvalidJog));
        assert_eq!(JogRequest::parse("G1 X10 F100"), Err(GrblError::InvalidJog));
        assert_eq!(JogRequest::parse("X10 S100 F100"), Err(GrblError::InvalidJog));
        assert_eq!(JogRequest::parse("G91 F100"), Err(GrblError::NoAxisWords));
        assert!(JogRequest::parse("G21 G91 X-5 F300").is_ok());
    }

    #[test]
    fn incremental_overlay_leaves_modal_untouched() {
        let settings = Settings::new();
        let modal = ModalState::default();
        let ctx = MotionContext { settings: &settings, overrides: Overrides::default() };
        let request = JogRequest::parse("G91 G20 X1 F10").unwrap();
        let block = jog(&request, &modal, &CoordinateFrame::default(), Position::ORIGIN, &ctx)
            .unwrap()
            .unwrap();
        assert!((block.end.x - 25.4).abs() < 1e-9);
        assert!((block.feed_rate - 254.0).abs() < 1e-9);
        assert_eq!(modal.distance, DistanceMode::Absolute);
        assert_eq!(modal.units, Units::Millimeters);
    }

    #[test]
    fn absolute_jog_block() {
        let block = build("X11 Y1 F600", &Settings::new()).unwrap().unwrap();
        assert_eq!(block.kind, BlockKind::Jog);
        assert_eq!(block.end, Position::new(11.0, 1.0, 0.0));
        assert_eq!(block.duration, Duration::from_secs(1));
    }

    #[test]
    fn soft_limits_reject_far_targets() {
        let mut settings = Settings::new();
        settings.set(SOFT_LIMITS, 1.0).unwrap();
        settings.set(MAX_TRAVEL, 50.0).unwrap();
        assert_eq!(build("X60 F600", &settings), Err(GrblError::TravelExceeded));
        assert!(build("X40 F600", &settings).unwrap().is_some());
    }
}
