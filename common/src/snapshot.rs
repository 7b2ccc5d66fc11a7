// Market Snapshot
// Immutable bundle of raw observations for one evaluation tick

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw observations for one instrument at one tick.
///
/// Created by the collector layer, consumed read-only by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub instrument: String,
    pub timestamp: DateTime<Utc>,
    /// Last traded price
    pub price: f64,
    /// Volume traded over the tick interval
    pub volume: f64,
    /// Resting bid-side depth near the touch
    pub bid_depth: f64,
    /// Resting ask-side depth near the touch
    pub ask_depth: f64,
    /// Fear/greed index reading in [0, 100]. The sentiment collector runs
    /// on its own cadence, so a tick may arrive without one.
    pub sentiment: Option<f64>,
    /// Set by the collector when ticks before this one were dropped.
    /// Gaps are flagged, never interpolated.
    pub gap_before: bool,
}

impl MarketSnapshot {
    pub fn new(
        instrument: impl Into<String>,
        timestamp: DateTime<Utc>,
        price: f64,
        volume: f64,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            timestamp,
            price,
            volume,
            bid_depth: 0.0,
            ask_depth: 0.0,
            sentiment: None,
            gap_before: false,
        }
    }

    pub fn with_depth(mut self, bid_depth: f64, ask_depth: f64) -> Self {
        self.bid_depth = bid_depth;
        self.ask_depth = ask_depth;
        self
    }

    pub fn with_sentiment(mut self, value: f64) -> Self {
        self.sentiment = Some(value);
        self
    }

    pub fn with_gap(mut self) -> Self {
        self.gap_before = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let snapshot = MarketSnapshot::new("BTC-USDT", Utc::now(), 30_000.0, 1.5);
        assert!(snapshot.sentiment.is_none());
        assert!(!snapshot.gap_before);
        assert_eq!(snapshot.bid_depth, 0.0);
    }

    #[test]
    fn test_builder_setters() {
        let snapshot = MarketSnapshot::new("BTC-USDT", Utc::now(), 30_000.0, 1.5)
            .with_depth(10_000.0, 9_500.0)
            .with_sentiment(62.0)
            .with_gap();
        assert_eq!(snapshot.sentiment, Some(62.0));
        assert!(snapshot.gap_before);
        assert_eq!(snapshot.ask_depth, 9_500.0);
    }
}
