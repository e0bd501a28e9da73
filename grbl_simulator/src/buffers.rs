//! Flow-control buffers: the character-counting receive buffer and the
//! admission queue for lines waiting on planner space.

use grbl_shared::GrblError;
use serde::Serialize;
use std::collections::VecDeque;

pub const RX_BUFFER_SIZE: usize = 128;
pub const LINE_BUFFER_SIZE: usize = 80;

/// Identifies a line whose response is delivered later by the tick executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Ticket(pub u64);

/// Bytes received but not yet acknowledged.
#[derive(Debug, Clone)]
pub struct RxBuffer {
    lines: VecDeque<usize>,
    used: usize,
    capacity: usize,
}

impl RxBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            used: 0,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn used(&self) -> usize {
        self.used
    }

    /// Space left once `reserved` bytes held elsewhere are charged too.
    pub fn available(&self, reserved: usize) -> usize {
        self.capacity.saturating_sub(self.used + reserved)
    }

    /// Charges a line and its terminator against the buffer.
    pub fn reserve(&mut self, line_len: usize, reserved: usize) -> Result<(), GrblError> {
        if line_len > LINE_BUFFER_SIZE {
            return Err(GrblError::LineTooLong);
        }
        if line_len + 1 > self.available(reserved) {
            return Err(GrblError::Overflow);
        }
        self.lines.push_back(line_len + 1);
        self.used += line_len + 1;
        Ok(())
    }

    /// Frees the oldest line once it has been processed.
    pub fn release(&mut self) {
        if let Some(bytes) = self.lines.pop_front() {
            self.used -= bytes;
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.used = 0;
    }
}

impl Default for RxBuffer {
    fn default() -> Self {
        Self::new(RX_BUFFER_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionEntry {
    pub line: String,
    pub ticket: Ticket,
}

/// FIFO of lines that arrived while the planner had no room for them.
#[derive(Debug, Clone, Default)]
pub struct AdmissionQueue {
    entries: VecDeque<AdmissionEntry>,
}

impl AdmissionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: String, ticket: Ticket) {
        self.entries.push_back(AdmissionEntry { line, ticket });
    }

    /// Puts an entry back at the head after a failed retry.
    pub fn requeue(&mut self, entry: AdmissionEntry) {
        self.entries.push_front(entry);
    }

    pub fn pop(&mut self) -> Option<AdmissionEntry> {
        self.entries.pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unsent line bytes still charged to the receive buffer.
    pub fn reserved_bytes(&self) -> usize {
        self.entries.iter().map(|e| e.line.len()).sum()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_and_release_are_symmetric() {
        let mut rx = RxBuffer::default();
        rx.reserve(9, 0).unwrap();
        assert_eq!(rx.used(), 10);
        rx.release();
        assert_eq!(rx.used(), 0);
    }

    #[test]
    fn rejects_long_lines_before_capacity() {
        let mut rx = RxBuffer::default();
        assert_eq!(rx.reserve(81, 0), Err(GrblError::LineTooLong));
        assert_eq!(rx.reserve(80, 0), Ok(()));
    }

    #[test]
    fn overflow_counts_admission_bytes() {
        let mut rx = RxBuffer::default();
        rx.reserve(60, 0).unwrap();
        // 61 used, 60 reserved in the admission queue: 7 bytes left.
        assert_eq!(rx.available(60), 7);
        assert_eq!(rx.reserve(7, 60), Err(GrblError::Overflow));
        assert_eq!(rx.reserve(6, 60), Ok(()));
        assert!(rx.used() + 60 <= RX_BUFFER_SIZE);
    }

    #[test]
    fn admission_queue_is_fifo() {
        let mut q = AdmissionQueue::new();
        q.push("G0 X1".into(), Ticket(1));
        q.push("G0 X22".into(), Ticket(2));
        assert_eq!(q.reserved_bytes(), 11);
        let first = q.pop().unwrap();
        assert_eq!(first.ticket, Ticket(1));
        q.requeue(first);
        assert_eq!(q.pop().unwrap().ticket, Ticket(1));
        assert_eq!(q.pop().unwrap().ticket, Ticket(2));
        assert!(q.is_empty());
    }
}
