//! G2/G3 arcs in the selected plane, optionally helical.

use super::{Feed, MIN_DISTANCE, MotionContext, timing};
use crate::modal::Plane;
use crate::planner::{ArcGeometry, BlockKind, PlannerBlock};
use grbl_shared::{GrblError, Position};
use std::f64::consts::TAU;

/// Tolerance used when deciding whether an arc's start and end angles coincide.
const ANGULAR_EPSILON: f64 = 5e-7;

/// Geometry words of an arc line, already converted to millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcRequest {
    pub plane: Plane,
    pub clockwise: bool,
    /// R word. Negative selects the long arc.
    pub radius: Option<f64>,
    /// Center offsets along the plane's first and second axis.
    pub offsets: (Option<f64>, Option<f64>),
}

pub fn arc(
    start: Position,
    end: Position,
    request: ArcRequest,
    feed: Feed,
    ctx: &MotionContext<'_>,
) -> Result<Option<PlannerBlock>, GrblError> {
    let (first, second, linear) = request.plane.axes();
    let dx = end[first] - start[first];
    let dy = end[second] - start[second];

    let (offset_x, offset_y) = match request.radius {
        Some(r) => radius_offsets(dx, dy, r, request.clockwise)?,
        None => {
            let (i, j) = (request.offsets.0.unwrap_or(0.0), request.offsets.1.unwrap_or(0.0));
            if i == 0.0 && j == 0.0 {
                return Err(GrblError::ArcNoOffsets);
            }
            (i, j)
        }
    };

    let center = (start[first] + offset_x, start[second] + offset_y);
    let radius = offset_x.hypot(offset_y);
    let start_angle = (start[second] - center.1).atan2(start[first] - center.0);
    let end_angle = (end[second] - center.1).atan2(end[first] - center.0);

    let mut travel = end_angle - start_angle;
    if request.clockwise {
        if travel >= -ANGULAR_EPSILON {
            travel -= TAU;
        }
    } else if travel <= ANGULAR_EPSILON {
        travel += TAU;
    }

    let helical = end[linear] - start[linear];
    let distance = (radius * travel).abs().hypot(helical);
    let (feed_rate, duration) = timing(distance, feed, ctx, true)?;
    if distance < MIN_DISTANCE {
        return Ok(None);
    }

    Ok(Some(PlannerBlock {
        kind: BlockKind::Arc(ArcGeometry {
            plane: request.plane,
            center,
            radius,
            start_angle,
            angular_travel: travel,
            clockwise: request.clockwise,
        }),
        start,
        end,
        feed_rate,
        duration,
    }))
}

/// Center offset for the radius form. The center lies on the chord's
/// perpendicular bisector, on the side picked by direction and the sign of `r`.
fn radius_offsets(dx: f64, dy: f64, r: f64, clockwise: bool) -> Result<(f64, f64), GrblError> {
    let chord = dx.hypot(dy);
    let h_x2_div_d = 4.0 * r * r - dx * dx - dy * dy;
    if h_x2_div_d < 0.0 || chord == 0.0 {
        return Err(GrblError::ArcRadius);
    }
    let mut h_x2_div_d = -h_x2_div_d.sqrt() / chord;
    if !clockwise {
        h_x2_div_d = -h_x2_div_d;
    }
    if r < 0.0 {
        h_x2_div_d = -h_x2_div_d;
    }
    Ok((0.5 * (dx - dy * h_x2_div_d), 0.5 * (dy + dx * h_x2_div_d)))
}
