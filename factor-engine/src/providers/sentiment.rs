// Fear & Greed
// Mean of the sentiment index readings present in the window

use crate::provider::{warming_up, FactorProvider};
use common::{FactorScore, MarketSnapshot};

/// Smoothed fear/greed index in [0, 100].
///
/// The sentiment collector runs on its own cadence, so only some
/// snapshots carry a reading; the factor averages whatever readings the
/// window holds and goes invalid when there are none.
#[derive(Debug, Clone)]
pub struct FearGreed {
    smoothing: usize,
}

impl FearGreed {
    pub fn new(smoothing: usize) -> Self {
        Self { smoothing }
    }
}

impl Default for FearGreed {
    fn default() -> Self {
        Self::new(6)
    }
}

impl FactorProvider for FearGreed {
    fn name(&self) -> &str {
        "fear-greed"
    }

    fn lookback(&self) -> usize {
        self.smoothing
    }

    fn compute(&self, window: &[MarketSnapshot]) -> FactorScore {
        if let Some(score) = warming_up(self.name(), window, self.smoothing) {
            return score;
        }

        let readings: Vec<f64> = window
            .iter()
            .filter_map(|snapshot| snapshot.sentiment)
            .collect();
        if readings.is_empty() {
            return FactorScore::invalid(self.name(), "no sentiment readings in window");
        }

        let mean = readings.iter().sum::<f64>() / readings.len() as f64;
        FactorScore::valid(self.name(), mean)
    }
}
