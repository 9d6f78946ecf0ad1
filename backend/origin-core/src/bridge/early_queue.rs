use std::collections::VecDeque;

/// Bounded FIFO of code issued before a port exists.
///
/// When full, the oldest entry is evicted to make room for the newest.
#[derive(Debug)]
pub struct EarlyQueue {
    entries: VecDeque<String>,
    capacity: usize,
}

impl EarlyQueue {
    /// `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `code`, returning the evicted entry when the queue was full.
    pub fn push(&mut self, code: String) -> Option<String> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(code);
        evicted
    }

    /// Remove and return everything in insertion order.
    pub fn drain(&mut self) -> Vec<String> {
        self.entries.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
