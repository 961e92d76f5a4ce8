//! Bounded session history and end-of-session summary

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::VecDeque;

use crate::models::HistorySnapshot;

/// Upper bound on retained snapshots, one hour of ticks
pub const MAX_HISTORY_CAPACITY: usize = 3600;

/// Fixed-capacity FIFO of history snapshots
///
/// Once full, every push evicts the oldest entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryBuffer {
    capacity: usize,
    entries: VecDeque<HistorySnapshot>,
}

impl HistoryBuffer {
    /// Create a buffer with capacity clamped to `1..=MAX_HISTORY_CAPACITY`
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_HISTORY_CAPACITY);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, snapshot: HistorySnapshot) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&HistorySnapshot> {
        self.entries.back()
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &HistorySnapshot> + '_ {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<HistorySnapshot> {
        self.entries.iter().copied().collect()
    }
}

/// Statistics over the snapshots currently held in the buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub samples: usize,
    pub first_time: u64,
    pub last_time: u64,
    pub avg_heart_rate: f64,
    /// Sample standard deviation; zero for a single sample
    pub heart_rate_std_dev: f64,
    pub max_heart_rate: u16,
    pub min_hydration: u8,
    pub min_glycogen: u8,
    pub peak_fatigue: u8,
}

impl SessionSummary {
    pub fn from_history(history: &HistoryBuffer) -> Option<Self> {
        let first = history.iter().next()?;
        let last = history.latest()?;

        let heart_rates: Vec<f64> = history.iter().map(|s| f64::from(s.heart_rate)).collect();
        let avg_heart_rate = Statistics::mean(&heart_rates);
        let heart_rate_std_dev = if heart_rates.len() > 1 {
            Statistics::std_dev(&heart_rates)
        } else {
            0.0
        };

        Some(Self {
            samples: history.len(),
            first_time: first.time,
            last_time: last.time,
            avg_heart_rate,
            heart_rate_std_dev,
            max_heart_rate: history.iter().map(|s| s.heart_rate).max().unwrap_or_default(),
            min_hydration: history.iter().map(|s| s.hydration).min().unwrap_or_default(),
            min_glycogen: history.iter().map(|s| s.glycogen).min().unwrap_or_default(),
            peak_fatigue: history.iter().map(|s| s.fatigue).max().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(time: u64, heart_rate: u16) -> HistorySnapshot {
        HistorySnapshot {
            time,
            heart_rate,
            hydration: 100 - time as u8,
            glycogen: 100 - (time as u8) * 2,
            fatigue: time as u8,
        }
    }

    #[test]
    fn test_buffer_evicts_oldest_first() {
        let mut history = HistoryBuffer::new(3);
        for t in 0..5 {
            history.push(snapshot(t, 100));
        }

        assert_eq!(history.len(), 3);
        let times: Vec<u64> = history.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![2, 3, 4]);
        assert_eq!(history.latest().unwrap().time, 4);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let mut history = HistoryBuffer::new(0);
        history.push(snapshot(0, 90));
        history.push(snapshot(1, 91));
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.to_vec(), vec![snapshot(1, 91)]);
    }

    #[test]
    fn test_oversized_capacity_is_clamped() {
        let mut history = HistoryBuffer::new(100_000_000_000_000);
        assert_eq!(history.capacity(), MAX_HISTORY_CAPACITY);

        for t in 0..(MAX_HISTORY_CAPACITY as u64 + 5) {
            history.push(snapshot(t % 50, 100));
        }
        assert_eq!(history.len(), MAX_HISTORY_CAPACITY);
    }

    #[test]
    fn test_clear() {
        let mut history = HistoryBuffer::new(5);
        history.push(snapshot(0, 90));
        history.clear();
        assert!(history.is_empty());
        assert!(SessionSummary::from_history(&history).is_none());
    }

    #[test]
    fn test_summary_statistics() {
        let mut history = HistoryBuffer::new(10);
        for (t, hr) in [(0, 100), (1, 110), (2, 120), (3, 130)] {
            history.push(snapshot(t, hr));
        }

        let summary = SessionSummary::from_history(&history).unwrap();
        assert_eq!(summary.samples, 4);
        assert_eq!(summary.first_time, 0);
        assert_eq!(summary.last_time, 3);
        assert!((summary.avg_heart_rate - 115.0).abs() < 1e-9);
        // sample std dev of 100, 110, 120, 130
        assert!((summary.heart_rate_std_dev - 12.909944487358056).abs() < 1e-9);
        assert_eq!(summary.max_heart_rate, 130);
        assert_eq!(summary.min_hydration, 97);
        assert_eq!(summary.min_glycogen, 94);
        assert_eq!(summary.peak_fatigue, 3);
    }

    #[test]
    fn test_single_sample_summary() {
        let mut history = HistoryBuffer::new(10);
        history.push(snapshot(7, 88));

        let summary = SessionSummary::from_history(&history).unwrap();
        assert_eq!(summary.heart_rate_std_dev, 0.0);
        assert_eq!(summary.avg_heart_rate, 88.0);
    }
}
