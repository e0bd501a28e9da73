//! Manually advanced clock for deterministic runs.

use grbl_shared::TimeInterface;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Simulation clock. Clones share the same time, so a test can hold one
/// copy and advance it while the simulator reads another.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    nanos: Arc<AtomicU64>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, dt: Duration) {
        let dt = u64::try_from(dt.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(dt, Ordering::SeqCst);
    }

    pub fn current_time(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

impl TimeInterface for SimClock {
    fn now(&self) -> Duration {
        self.current_time()
    }
}
