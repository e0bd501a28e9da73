use super::{Feed, MotionContext, timing};
use crate::planner::{BlockKind, PlannerBlock};
use grbl_shared::{GrblError, Position};

/// `$H`: one block to machine zero at the seek rate, sized by the longest
/// axis travel. Per-axis switch search is not modelled.
pub fn home(start: Position, ctx: &MotionContext<'_>) -> Result<PlannerBlock, GrblError> {
    if !ctx.settings.homing_enabled() {
        return Err(GrblError::SettingDisabled);
    }
    let distance = ctx.settings.largest_travel();
    let (feed_rate, duration) =
        timing(distance, Feed::UnitsPerMinute(ctx.settings.homing_seek_rate()), ctx, false)?;
    Ok(PlannerBlock {
        kind: BlockKind::Home,
        start,
        end: Position::ORIGIN,
        feed_rate,
        duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::Overrides;
    use grbl_shared::Settings;
    use grbl_shared::settings::HOMING_ENABLE;
    use std::time::Duration;

    #[test]
    fn disabled_homing_is_rejected() {
        let settings = Settings::new();
        let ctx = MotionContext { settings: &settings, overrides: Overrides::default() };
        assert_eq!(home(Position::ORIGIN, &ctx), Err(GrblError::SettingDisabled));
    }

    #[test]
    fn homing_block_uses_seek_rate() {
        let mut settings = Settings::new();
        settings.set(HOMING_ENABLE, 1.0).unwrap();
        let ctx = MotionContext { settings: &settings, overrides: Overrides { feed: 50, ..Overrides::default() } };
        let block = home(Position::new(3.0, 4.0, 0.0), &ctx).unwrap();
        assert_eq!(block.end, Position::ORIGIN);
        assert_eq!(block.feed_rate, 500.0);
        // 200 mm at 500 mm/min, overrides ignored.
        assert_eq!(block.duration, Duration::from_secs(24));
    }
}
