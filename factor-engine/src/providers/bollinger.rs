// Bollinger %B
// Position of the latest close inside the Bollinger band

use crate::provider::{warming_up, FactorProvider};
use common::{FactorScore, MarketSnapshot};

/// %B factor: `(close - lower) / (upper - lower)`.
///
/// Roughly [0, 1] inside the band; below 0 or above 1 when price breaks
/// out of it. A zero-width band (all closes identical) is a degenerate
/// input and yields an invalid score.
#[derive(Debug, Clone)]
pub struct BollingerPctB {
    period: usize,
    num_std: f64,
}

impl BollingerPctB {
    pub fn new(period: usize, num_std: f64) -> Self {
        Self { period, num_std }
    }
}

impl Default for BollingerPctB {
    fn default() -> Self {
        Self::new(20, 2.0)
    }
}

impl FactorProvider for BollingerPctB {
    fn name(&self) -> &str {
        "bollinger-pctb"
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, window: &[MarketSnapshot]) -> FactorScore {
        if let Some(score) = warming_up(self.name(), window, self.period) {
            return score;
        }

        let tail = &window[window.len() - self.period..];
        let middle =
            tail.iter().map(|snapshot| snapshot.price).sum::<f64>() / self.period as f64;
        let variance = tail
            .iter()
            .map(|snapshot| (snapshot.price - middle).powi(2))
            .sum::<f64>()
            / self.period as f64;
        let std_dev = variance.sqrt();

        let upper = middle + self.num_std * std_dev;
        let lower = middle - self.num_std * std_dev;
        let width = upper - lower;
        if width == 0.0 {
            return FactorScore::invalid(self.name(), "zero-width band");
        }

        let close = tail[tail.len() - 1].price;
        FactorScore::valid(self.name(), (close - lower) / width)
    }
}
