//! Host side of character-counting flow control, driven in simulated time.

use grbl_shared::gcode::strip_comments;
use grbl_simulator::{
    MachineState, RX_BUFFER_SIZE, SimClock, SimEvent, Simulator, StatusSnapshot, Submission, Ticket,
};
use serde::Serialize;
use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Simulated time limit of {0:?} reached with {1} lines unanswered")]
    TimeLimit(Duration, usize),
    #[error("Response for {got:?} arrived while waiting on {expected:?}")]
    OutOfOrder { expected: Option<Ticket>, got: Ticket },
}

/// One entry of the stream transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreamEvent {
    Response { line: String, response: String, at_ms: u128 },
    Push { message: String, at_ms: u128 },
    Status { status: StatusSnapshot, at_ms: u128 },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StreamSummary {
    pub lines: usize,
    pub errors: usize,
    pub alarms: usize,
    pub elapsed: Duration,
    pub events: Vec<StreamEvent>,
}

struct InFlight {
    line: String,
    bytes: usize,
    ticket: Ticket,
}

/// Streams lines into a [`Simulator`], never holding more unacknowledged
/// bytes than the controller's receive buffer.
pub struct Streamer {
    sim: Simulator,
    clock: SimClock,
    tick: Duration,
    window: usize,
    time_limit: Duration,
    status_every: Option<Duration>,
}

impl Streamer {
    /// `clock` must be the clock `sim` reads.
    pub fn new(sim: Simulator, clock: SimClock, tick: Duration) -> Self {
        Self {
            sim,
            clock,
            tick: tick.max(Duration::from_millis(1)),
            window: RX_BUFFER_SIZE,
            time_limit: Duration::from_secs(24 * 3600),
            status_every: None,
        }
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = limit;
        self
    }

    /// Records a status snapshot at this simulated interval.
    pub fn with_status_interval(mut self, every: Duration) -> Self {
        self.status_every = Some(every);
        self
    }

    pub fn simulator(&self) -> &Simulator {
        &self.sim
    }

    pub fn simulator_mut(&mut self) -> &mut Simulator {
        &mut self.sim
    }

    /// Streams every line and runs until all are answered and motion has stopped.
    pub fn run<I, S>(&mut self, lines: I) -> Result<StreamSummary, StreamError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut queue: VecDeque<String> = lines
            .into_iter()
            .map(|l| l.as_ref().trim().to_string())
            .filter(|l| !strip_comments(l).trim().is_empty())
            .collect();
        let start = self.clock.current_time();
        let mut in_flight: VecDeque<InFlight> = VecDeque::new();
        let mut summary = StreamSummary::default();
        let mut next_status = start;

        loop {
            while let Some(line) = queue.front() {
                let bytes = line.len() + 1;
                let system = line.starts_with('$') && !line.to_ascii_uppercase().starts_with("$J=");
                // System commands bypass the line queue; wait until it is empty.
                if system && !in_flight.is_empty() {
                    break;
                }
                let used: usize = in_flight.iter().map(|f| f.bytes).sum();
                if used + bytes > self.window {
                    break;
                }
                let Some(line) = queue.pop_front() else { break };
                summary.lines += 1;
                match self.sim.submit_line(&line) {
                    Submission::Done(response) => {
                        let at = self.clock.current_time() - start;
                        record(&mut summary, line, response, at);
                    }
                    Submission::Pending(ticket) => in_flight.push_back(InFlight { line, bytes, ticket }),
                }
            }

            let now = self.clock.current_time();
            if let Some(every) = self.status_every {
                if now >= next_status {
                    summary.events.push(StreamEvent::Status {
                        status: self.sim.snapshot(),
                        at_ms: (now - start).as_millis(),
                    });
                    next_status = now + every;
                }
            }

            if queue.is_empty() && in_flight.is_empty() && self.is_settled() {
                break;
            }
            if now - start >= self.time_limit {
                return Err(StreamError::TimeLimit(self.time_limit, in_flight.len() + queue.len()));
            }

            self.clock.advance(self.tick);
            for event in self.sim.tick() {
                match event {
                    SimEvent::LineComplete { ticket, response } => {
                        let expected = in_flight.front().map(|f| f.ticket);
                        if expected != Some(ticket) {
                            return Err(StreamError::OutOfOrder { expected, got: ticket });
                        }
                        if let Some(done) = in_flight.pop_front() {
                            let at = self.clock.current_time() - start;
                            record(&mut summary, done.line, response, at);
                        }
                    }
                    SimEvent::Push(message) => {
                        tracing::warn!("controller pushed {}", message.trim_end());
                        summary.alarms += 1;
                        summary.events.push(StreamEvent::Push {
                            message,
                            at_ms: (self.clock.current_time() - start).as_millis(),
                        });
                    }
                }
            }
        }

        summary.elapsed = self.clock.current_time() - start;
        tracing::info!(
            "streamed {} lines in {:?} ({} errors, {} alarms)",
            summary.lines,
            summary.elapsed,
            summary.errors,
            summary.alarms
        );
        Ok(summary)
    }

    fn is_settled(&self) -> bool {
        self.sim.planner().is_idle()
            && !self.sim.dwell_pending()
            && !matches!(self.sim.state(), MachineState::Hold | MachineState::Door)
    }
}

/// Reads a G-code program, one line per entry.
pub fn read_program(path: &Path) -> Result<Vec<String>, StreamError> {
    let text = std::fs::read_to_string(path)?;
    Ok(text.lines().map(str::to_string).collect())
}

fn record(summary: &mut StreamSummary, line: String, response: String, at: Duration) {
    if response.starts_with("error:") {
        summary.errors += 1;
    }
    summary.events.push(StreamEvent::Response { line, response, at_ms: at.as_millis() });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn streamer() -> Streamer {
        let clock = SimClock::new();
        let sim = Simulator::with_clock(Arc::new(clock.clone()));
        Streamer::new(sim, clock, Duration::from_millis(10))
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        let mut streamer = streamer();
        let summary = streamer.run(["", "(setup)", "G21", "  ; note"]).unwrap();
        assert_eq!(summary.lines, 1);
        assert_eq!(summary.errors, 0);
    }

    #[test]
    fn time_limit_is_enforced() {
        let mut streamer = streamer().with_time_limit(Duration::from_millis(100));
        let err = streamer.run(["G1 X10 F1"]).unwrap_err();
        assert!(matches!(err, StreamError::TimeLimit(_, 0)));
    }
}
