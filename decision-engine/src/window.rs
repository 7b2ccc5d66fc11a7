// Snapshot Window
// Per-instrument sliding history feeding the factor providers

use common::MarketSnapshot;
use std::collections::VecDeque;
use tracing::warn;

/// Time-ordered, gap-free snapshot history for one instrument.
///
/// Monotonically increasing timestamps are a collector contract; a
/// violation is rejected. A snapshot flagged `gap_before` clears the
/// accumulated history: providers are owed a gap-free window, so warm-up
/// restarts rather than interpolating across the hole.
#[derive(Debug)]
pub struct SnapshotWindow {
    snapshots: VecDeque<MarketSnapshot>,
    capacity: usize,
}

impl SnapshotWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            snapshots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append one snapshot, trimming the front to capacity.
    pub fn push(&mut self, snapshot: MarketSnapshot) -> anyhow::Result<()> {
        if let Some(last) = self.snapshots.back() {
            if snapshot.timestamp <= last.timestamp {
                anyhow::bail!(
                    "snapshot timestamp {} is not after {}",
                    snapshot.timestamp,
                    last.timestamp
                );
            }
        }

        if snapshot.gap_before && !self.snapshots.is_empty() {
            warn!(
                instrument = %snapshot.instrument,
                dropped = self.snapshots.len(),
                "Gap flagged by collector; restarting warm-up"
            );
            self.snapshots.clear();
        }

        self.snapshots.push_back(snapshot);
        while self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Contiguous copy for the factor engine.
    pub fn to_vec(&self) -> Vec<MarketSnapshot> {
        self.snapshots.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn at(offset_secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + offset_secs, 0).unwrap()
    }

    fn snapshot(offset_secs: i64) -> MarketSnapshot {
        MarketSnapshot::new("BTC-USDT", at(offset_secs), 100.0, 1.0)
    }

    #[test]
    fn test_push_keeps_order_and_capacity() {
        let mut window = SnapshotWindow::new(3);
        for i in 0..5 {
            window.push(snapshot(i)).unwrap();
        }
        assert_eq!(window.len(), 3);
        let copied = window.to_vec();
        assert_eq!(copied[0].timestamp, at(2));
        assert_eq!(copied[2].timestamp, at(4));
    }

    #[test]
    fn test_rejects_non_monotonic_timestamp() {
        let mut window = SnapshotWindow::new(10);
        window.push(snapshot(10)).unwrap();
        assert!(window.push(snapshot(5)).is_err());
        assert!(window.push(snapshot(10)).is_err()); // equal is also rejected
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_gap_restarts_window() {
        let mut window = SnapshotWindow::new(10);
        for i in 0..4 {
            window.push(snapshot(i)).unwrap();
        }

        window.push(snapshot(60).with_gap()).unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window.to_vec()[0].timestamp, at(60));
    }

    #[test]
    fn test_gap_on_empty_window_is_noop() {
        let mut window = SnapshotWindow::new(10);
        window.push(snapshot(0).with_gap()).unwrap();
        assert_eq!(window.len(), 1);
    }
}
