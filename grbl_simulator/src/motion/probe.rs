use super::{Feed, MIN_DISTANCE, MotionContext, timing};
use crate::modal::ProbeMode;
use crate::planner::{BlockKind, PlannerBlock};
use grbl_shared::{GrblError, Position};

/// G38.x straight probing move. The pin must start in the opposite state
/// of the one the probe is looking for.
pub fn probe(
    start: Position,
    end: Position,
    mode: ProbeMode,
    pin_triggered: bool,
    feed: Feed,
    ctx: &MotionContext<'_>,
) -> Result<Option<PlannerBlock>, GrblError> {
    if pin_triggered == mode.toward {
        return Err(GrblError::ProbeFailInitial);
    }
    let distance = start.distance(&end);
    let (feed_rate, duration) = timing(distance, feed, ctx, true)?;
    if distance < MIN_DISTANCE {
        return Ok(None);
    }
    Ok(Some(PlannerBlock {
        kind: BlockKind::Probe { toward: mode.toward },
        start,
        end,
        feed_rate,
        duration,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::Overrides;
    use grbl_shared::Settings;

    const TOWARD: ProbeMode = ProbeMode { toward: true, signal_error: true };
    const AWAY: ProbeMode = ProbeMode { toward: false, signal_error: true };

    #[test]
    fn initial_pin_state_is_checked() {
        let settings = Settings::new();
        let ctx = MotionContext { settings: &settings, overrides: Overrides::default() };
        let end = Position::new(0.0, 0.0, -5.0);
        let feed = Feed::UnitsPerMinute(50.0);
        assert_eq!(probe(Position::ORIGIN, end, AWAY, false, feed, &ctx), Err(GrblError::ProbeFailInitial));
        assert_eq!(probe(Position::ORIGIN, end, TOWARD, true, feed, &ctx), Err(GrblError::ProbeFailInitial));
        let block = probe(Position::ORIGIN, end, TOWARD, false, feed, &ctx).unwrap().unwrap();
        assert_eq!(block.kind, BlockKind::Probe { toward: true });
        assert!(probe(Position::ORIGIN, end, AWAY, true, feed, &ctx).unwrap().is_some());
    }

    #[test]
    fn probe_needs_feed() {
        let settings = Settings::new();
        let ctx = MotionContext { settings: &settings, overrides: Overrides::default() };
        let end = Position::new(0.0, 0.0, -5.0);
        assert_eq!(
            probe(Position::ORIGIN, end, TOWARD, false, Feed::UnitsPerMinute(0.0), &ctx),
            Err(GrblError::UndefinedFeedRate)
        );
    }
}
