//! Planner queue and the motion state of the block that is executing.

use crate::modal::Plane;
use crate::state::MachineState;
use grbl_shared::Position;
use std::collections::VecDeque;
use std::f64::consts::TAU;
use std::time::Duration;
use thiserror::Error;

pub const PLANNER_CAPACITY: usize = 15;

/// Interpolation data for a circular or helical move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcGeometry {
    pub plane: Plane,
    /// Center in the plane's first and second axis.
    pub center: (f64, f64),
    pub radius: f64,
    pub start_angle: f64,
    /// Signed: negative for clockwise.
    pub angular_travel: f64,
    pub clockwise: bool,
}

impl ArcGeometry {
    pub fn sample(&self, start: &Position, end: &Position, progress: f64) -> Position {
        let t = progress.clamp(0.0, 1.0);
        if t >= 1.0 {
            return *end;
        }
        let (first, second, linear) = self.plane.axes();
        let angle = self.start_angle + self.angular_travel * t;
        let mut p = *start;
        p[first] = self.center.0 + self.radius * angle.cos();
        p[second] = self.center.1 + self.radius * angle.sin();
        p[linear] = start[linear] + (end[linear] - start[linear]) * t;
        p
    }

    pub fn is_full_circle(&self) -> bool {
        (self.angular_travel.abs() - TAU).abs() < 1e-9
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockKind {
    Linear { rapid: bool },
    Arc(ArcGeometry),
    Probe { toward: bool },
    Jog,
    Home,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannerBlock {
    pub kind: BlockKind,
    pub start: Position,
    pub end: Position,
    /// Effective feed in mm/min, overrides included.
    pub feed_rate: f64,
    pub duration: Duration,
}

impl PlannerBlock {
    /// Machine state entered when this block starts executing.
    pub fn running_state(&self) -> MachineState {
        match self.kind {
            BlockKind::Jog => MachineState::Jog,
            BlockKind::Home => MachineState::Home,
            _ => MachineState::Run,
        }
    }

    pub fn position_at(&self, progress: f64) -> Position {
        match &self.kind {
            BlockKind::Arc(arc) => arc.sample(&self.start, &self.end, progress),
            _ => self.start.lerp(&self.end, progress),
        }
    }
}

/// The executing block with the timestamps it was scheduled against.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionState {
    pub block: PlannerBlock,
    pub started_at: Duration,
    pub ends_at: Duration,
}

impl MotionState {
    pub fn begin(block: PlannerBlock, now: Duration) -> Self {
        let ends_at = now.saturating_add(block.duration);
        Self { block, started_at: now, ends_at }
    }

    pub fn progress(&self, now: Duration) -> f64 {
        if self.block.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.started_at).as_secs_f64();
        (elapsed / self.block.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    pub fn position_at(&self, now: Duration) -> Position {
        self.block.position_at(self.progress(now))
    }

    pub fn is_finished(&self, now: Duration) -> bool {
        now >= self.ends_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("planner queue is full ({0} blocks)")]
pub struct PlannerFull(pub usize);

#[derive(Debug, Clone)]
pub struct PlannerQueue {
    blocks: VecDeque<PlannerBlock>,
    executing: Option<MotionState>,
    capacity: usize,
}

impl PlannerQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            blocks: VecDeque::with_capacity(capacity),
            executing: None,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queued blocks plus the executing one.
    pub fn occupied(&self) -> usize {
        self.blocks.len() + usize::from(self.executing.is_some())
    }

    pub fn available(&self) -> usize {
        self.capacity.saturating_sub(self.occupied())
    }

    pub fn queued(&self) -> usize {
        self.blocks.len()
    }

    /// Nothing queued and nothing executing.
    pub fn is_idle(&self) -> bool {
        self.occupied() == 0
    }

    pub fn admit(&mut self, block: PlannerBlock) -> Result<(), PlannerFull> {
        if self.occupied() >= self.capacity {
            return Err(PlannerFull(self.capacity));
        }
        tracing::debug!(
            "planner admit {:?} -> [{}] in {:?}",
            block.kind,
            block.end.format_report(),
            block.duration
        );
        self.blocks.push_back(block);
        Ok(())
    }

    /// Where the next generated block starts: the end of the last queued
    /// block, else the end of the executing one, else `machine`.
    pub fn reference_position(&self, machine: Position) -> Position {
        self.blocks
            .back()
            .or(self.executing.as_ref().map(|m| &m.block))
            .map(|b| b.end)
            .unwrap_or(machine)
    }

    pub fn executing(&self) -> Option<&MotionState> {
        self.executing.as_ref()
    }

    /// Promotes the head block if nothing is executing.
    pub fn start_next(&mut self, now: Duration) -> Option<&MotionState> {
        if self.executing.is_some() {
            return None;
        }
        let block = self.blocks.pop_front()?;
        self.executing = Some(MotionState::begin(block, now));
        self.executing.as_ref()
    }

    /// Retires the executing block.
    pub fn finish(&mut self) -> Option<MotionState> {
        self.executing.take()
    }

    /// Drops every block; returns the one that was executing, if any.
    pub fn clear(&mut self) -> Option<MotionState> {
        self.blocks.clear();
        self.executing.take()
    }
}

impl Default for PlannerQueue {
    fn default() -> Self {
        Self::new(PLANNER_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn rapid(end: Position) -> PlannerBlock {
        PlannerBlock {
            kind: BlockKind::Linear { rapid: true },
            start: Position::ORIGIN,
            end,
            feed_rate: 500.0,
            duration: Duration::from_millis(100),
        }
    }

    #[test]
    fn occupancy_counts_executing_block() {
        let mut planner = PlannerQueue::default();
        planner.admit(rapid(Position::new(1.0, 0.0, 0.0))).unwrap();
        planner.admit(rapid(Position::new(2.0, 0.0, 0.0))).unwrap();
        assert_eq!(planner.occupied(), 2);
        planner.start_next(Duration::ZERO);
        assert_eq!(planner.occupied(), 2);
        assert_eq!(planner.queued(), 1);
        planner.finish();
        assert_eq!(planner.occupied(), 1);
    }

    #[test]
    fn admit_respects_capacity() {
        let mut planner = PlannerQueue::default();
        for i in 0..PLANNER_CAPACITY {
            planner.admit(rapid(Position::new(i as f64, 0.0, 0.0))).unwrap();
        }
        assert_eq!(planner.available(), 0);
        assert_eq!(planner.admit(rapid(Position::ORIGIN)), Err(PlannerFull(15)));
        planner.start_next(Duration::ZERO);
        assert_eq!(planner.admit(rapid(Position::ORIGIN)), Err(PlannerFull(15)));
    }

    #[test]
    fn reference_chains_through_queue() {
        let mut planner = PlannerQueue::default();
        let machine = Position::new(5.0, 5.0, 0.0);
        assert_eq!(planner.reference_position(machine), machine);
        planner.admit(rapid(Position::new(1.0, 0.0, 0.0))).unwrap();
        planner.start_next(Duration::ZERO);
        assert_eq!(planner.reference_position(machine), Position::new(1.0, 0.0, 0.0));
        planner.admit(rapid(Position::new(3.0, 0.0, 0.0))).unwrap();
        assert_eq!(planner.reference_position(machine), Position::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn motion_progress_is_time_based() {
        let motion = MotionState::begin(rapid(Position::new(10.0, 0.0, 0.0)), Duration::from_millis(50));
        assert_eq!(motion.progress(Duration::ZERO), 0.0);
        assert_eq!(motion.position_at(Duration::from_millis(100)), Position::new(5.0, 0.0, 0.0));
        assert!(!motion.is_finished(Duration::from_millis(149)));
        assert!(motion.is_finished(Duration::from_millis(150)));
    }

    #[test]
    fn end_time_saturates() {
        let mut block = rapid(Position::new(10.0, 0.0, 0.0));
        block.duration = Duration::MAX;
        let motion = MotionState::begin(block, Duration::from_secs(5000));
        assert_eq!(motion.ends_at, Duration::MAX);
        assert!(!motion.is_finished(Duration::from_secs(10_000)));
    }

    #[test]
    fn arc_sample_follows_circle() {
        let arc = ArcGeometry {
            plane: Plane::Xy,
            center: (0.0, 0.0),
            radius: 10.0,
            start_angle: 0.0,
            angular_travel: PI / 2.0,
            clockwise: false,
        };
        let start = Position::new(10.0, 0.0, 0.0);
        let end = Position::new(0.0, 10.0, 4.0);
        let mid = arc.sample(&start, &end, 0.5);
        assert!((mid.x - 10.0 * (PI / 4.0).cos()).abs() < 1e-9);
        assert!((mid.y - 10.0 * (PI / 4.0).sin()).abs() < 1e-9);
        assert!((mid.z - 2.0).abs() < 1e-9);
        assert_eq!(arc.sample(&start, &end, 1.0), end);
    }
}
