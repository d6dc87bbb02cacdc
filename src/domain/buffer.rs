// Telemetry buffer - bounded, deduplicated, append-ordered sample storage
use super::sample::{Reading, Sample};
use std::collections::{HashSet, VecDeque};

pub const DEFAULT_CAPACITY: usize = 3000;

/// Positions come from a counter that is never reused, so a zoom range picked
/// earlier still points at the same samples after older ones are evicted.
#[derive(Debug, Clone)]
pub struct TelemetryBuffer {
    capacity: usize,
    samples: VecDeque<Sample>,
    keys: HashSet<String>,
    next_position: u64,
}

impl Default for TelemetryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl TelemetryBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
            keys: HashSet::new(),
            next_position: 0,
        }
    }

    /// Append a reading, returning the assigned position.
    /// A reading whose key is already buffered is dropped and `None` returned.
    pub fn append(&mut self, reading: Reading) -> Option<u64> {
        if let Some(key) = &reading.source_key {
            if self.keys.contains(key) {
                return None;
            }
            self.keys.insert(key.clone());
        }

        let position = self.next_position;
        self.next_position += 1;
        self.samples.push_back(Sample::new(position, reading));

        while self.samples.len() > self.capacity {
            self.evict_front();
        }

        Some(position)
    }

    /// Replace the whole contents with a bulk snapshot.
    /// Positions are re-derived 0..n-1 in input order before truncation.
    pub fn replace_all(&mut self, readings: impl IntoIterator<Item = Reading>) {
        self.clear();
        for reading in readings {
            self.append(reading);
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.keys.clear();
        self.next_position = 0;
    }

    /// Copy of the current contents in append order
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Sample> + ExactSizeIterator {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// First and last buffered positions
    pub fn position_bounds(&self) -> Option<(u64, u64)> {
        match (self.samples.front(), self.samples.back()) {
            (Some(first), Some(last)) => Some((first.position, last.position)),
            _ => None,
        }
    }

    fn evict_front(&mut self) {
        if let Some(evicted) = self.samples.pop_front() {
            if let Some(key) = evicted.source_key {
                self.keys.remove(&key);
            }
        }
    }
}
