//! The periodic tick: advances motion, retires and promotes blocks, runs
//! dwells and drains the admission queue.

use super::{LineOutcome, OK, PendingDwell, ProbeRecord, SimEvent, Simulator};
use crate::planner::BlockKind;
use crate::state::MachineState;
use grbl_shared::{AlarmCode, Axis};
use std::time::Duration;

impl Simulator {
    /// Runs one executor step at the clock's current time.
    pub fn tick(&mut self) -> Vec<SimEvent> {
        let now = self.clock.now();
        let mut events = Vec::new();

        if !self.state.is_suspended() {
            if self.check_soft_limits(now) {
                events.push(SimEvent::Push(AlarmCode::SoftLimit.push()));
                return events;
            }
            self.retire_finished(now);
            self.promote_next(now);
        }
        self.advance_dwell(now, &mut events);
        self.drain_admission(&mut events);
        events
    }

    /// Trips the soft-limit alarm if the tool is outside its travel.
    fn check_soft_limits(&mut self, now: Duration) -> bool {
        if !self.settings.soft_limits_enabled() {
            return false;
        }
        let Some(motion) = self.planner.executing() else {
            return false;
        };
        let position = motion.position_at(now);
        tracing::trace!("sampled {}", position.format_report());
        let outside = Axis::ALL
            .iter()
            .any(|a| position[*a].abs() > self.settings.max_travel(*a));
        if !outside {
            return false;
        }

        tracing::warn!("soft limit tripped at {}", position.format_report());
        self.planner.clear();
        self.machine_position = position;
        self.refresh_work_position();
        self.alarm = Some(AlarmCode::SoftLimit);
        self.set_machine_state(MachineState::Alarm);
        true
    }

    fn retire_finished(&mut self, now: Duration) {
        if !self.planner.executing().is_some_and(|m| m.is_finished(now)) {
            return;
        }
        let Some(motion) = self.planner.finish() else {
            return;
        };
        let block = motion.block;
        tracing::debug!("block complete at {}", block.end.format_report());
        self.machine_position = block.end;
        match block.kind {
            BlockKind::Probe { toward } => {
                self.probe = ProbeRecord { position: block.end, success: true };
                self.probe_pin = toward;
            }
            BlockKind::Home => {
                tracing::info!("homing complete");
                self.alarm = None;
            }
            _ => {}
        }
        self.refresh_work_position();
        self.set_machine_state(MachineState::Idle);
    }

    fn promote_next(&mut self, now: Duration) {
        let next = self.planner.start_next(now).map(|m| m.block.running_state());
        if let Some(state) = next {
            tracing::debug!("block started, {} queued", self.planner.queued());
            self.set_machine_state(state);
        }
    }

    /// A dwell starts once the planner has drained and answers when it ends.
    fn advance_dwell(&mut self, now: Duration, events: &mut Vec<SimEvent>) {
        let planner_idle = self.planner.is_idle();
        let Some(dwell) = self.dwell.as_mut() else {
            return;
        };
        let started_at = match dwell.started_at {
            Some(at) => at,
            None if planner_idle => {
                dwell.started_at = Some(now);
                now
            }
            None => return,
        };
        if now >= started_at.saturating_add(dwell.duration) {
            let ticket = dwell.ticket;
            self.dwell = None;
            self.complete(ticket, OK.to_string(), events);
        }
    }

    fn drain_admission(&mut self, events: &mut Vec<SimEvent>) {
        if self.dwell.is_some() || self.planner.available() == 0 {
            return;
        }
        let Some(entry) = self.admission.pop() else {
            return;
        };
        match self.process_line(&entry.line) {
            LineOutcome::Respond(response) => self.complete(entry.ticket, response, events),
            LineOutcome::Dwell(duration) => {
                self.dwell = Some(PendingDwell { ticket: entry.ticket, duration, started_at: None });
            }
            LineOutcome::NeedsPlanner => self.admission.requeue(entry),
        }
    }

    fn complete(&self, ticket: crate::buffers::Ticket, response: String, events: &mut Vec<SimEvent>) {
        if self.config.debug {
            tracing::info!(">> {:?} {:?}", ticket, response);
        }
        events.push(SimEvent::LineComplete { ticket, response });
    }
}
