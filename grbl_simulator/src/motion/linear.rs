use super::{Feed, MIN_DISTANCE, MotionContext, timing};
use crate::planner::{BlockKind, PlannerBlock};
use grbl_shared::{GrblError, Position};

/// G0/G1 straight move.
pub fn linear(
    start: Position,
    end: Position,
    feed: Feed,
    ctx: &MotionContext<'_>,
) -> Result<Option<PlannerBlock>, GrblError> {
    let distance = start.distance(&end);
    let (feed_rate, duration) = timing(distance, feed, ctx, true)?;
    if distance < MIN_DISTANCE {
        return Ok(None);
    }
    Ok(Some(PlannerBlock {
        kind: BlockKind::Linear { rapid: feed == Feed::Rapid },
        start,
        end,
        feed_rate,
        duration,
    }))
}
