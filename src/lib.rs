// grbl-sim: streaming and interactive drivers for the simulated controller

pub mod interactive;
pub mod streamer;

pub use grbl_shared::{ConfigError, SimConfig, load_config};
pub use grbl_simulator::{SimClock, Simulator};
pub use streamer::{StreamError, StreamEvent, StreamSummary, Streamer};
