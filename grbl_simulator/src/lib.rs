//! Simulated Grbl 1.1 controller core. Pure state machine: callers feed it
//! lines and real-time bytes and call [`Simulator::tick`] periodically.

pub mod buffers;
pub mod coords;
pub mod modal;
pub mod motion;
pub mod overrides;
pub mod planner;
pub mod simulator;
pub mod state;
pub mod status;

pub use buffers::{LINE_BUFFER_SIZE, RX_BUFFER_SIZE, Ticket};
pub use planner::PLANNER_CAPACITY;
pub use simulator::realtime::{self, is_realtime};
pub use simulator::{OK, ProbeRecord, SimClock, SimEvent, Simulator, Submission};
pub use state::MachineState;
pub use status::StatusSnapshot;
