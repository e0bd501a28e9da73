//! Motion generators. Each one turns a start and end position into zero or
//! one planner blocks without touching simulator state.

pub mod arc;
pub mod home;
pub mod jog;
pub mod linear;
pub mod probe;

pub use arc::{ArcRequest, arc};
pub use home::home;
pub use jog::{JogRequest, jog};
pub use linear::linear;
pub use probe::probe;

use crate::overrides::Overrides;
use grbl_shared::{GrblError, Settings};
use std::time::Duration;

/// Moves shorter than this are dropped.
pub const MIN_DISTANCE: f64 = 0.001;

/// How a block's feed rate is determined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Feed {
    /// Fastest configured axis rate.
    Rapid,
    /// mm/min.
    UnitsPerMinute(f64),
    /// G93: the move takes `1 / value` minutes.
    InverseTime(f64),
}

/// Read-only inputs shared by every generator.
#[derive(Debug, Clone, Copy)]
pub struct MotionContext<'a> {
    pub settings: &'a Settings,
    pub overrides: Overrides,
}

/// Effective feed rate and duration for a move of `distance` mm.
pub(crate) fn timing(
    distance: f64,
    feed: Feed,
    ctx: &MotionContext<'_>,
    apply_override: bool,
) -> Result<(f64, Duration), GrblError> {
    let (rate, percent) = match feed {
        Feed::Rapid => (ctx.settings.rapid_rate(), ctx.overrides.rapid),
        Feed::UnitsPerMinute(rate) => (rate, ctx.overrides.feed),
        Feed::InverseTime(per_minute) => (distance * per_minute, ctx.overrides.feed),
    };
    let raw = match feed {
        Feed::InverseTime(per_minute) => per_minute,
        _ => rate,
    };
    if !(raw > 0.0) {
        return Err(GrblError::UndefinedFeedRate);
    }
    let scale = if apply_override { f64::from(percent) / 100.0 } else { 1.0 };
    let rate = rate * scale;
    let minutes = match feed {
        Feed::InverseTime(per_minute) => 1.0 / (per_minute * scale),
        _ => distance / rate,
    };
    let duration = Duration::try_from_secs_f64(minutes * 60.0).map_err(|_| GrblError::InvalidStatement)?;
    Ok((rate, duration))
}
