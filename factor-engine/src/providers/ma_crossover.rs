// Moving-Average Crossover
// Relative spread between a fast and a slow simple moving average

use crate::provider::{warming_up, FactorProvider};
use common::{FactorScore, MarketSnapshot};

/// Fast/slow SMA crossover factor.
///
/// The value is the relative spread `(fast - slow) / slow`: positive while
/// the fast average rides above the slow one, negative below it.
#[derive(Debug, Clone)]
pub struct MaCrossover {
    fast: usize,
    slow: usize,
}

impl MaCrossover {
    /// `fast` must be shorter than `slow`.
    pub fn new(fast: usize, slow: usize) -> Self {
        Self { fast, slow }
    }
}

impl Default for MaCrossover {
    fn default() -> Self {
        Self::new(12, 26)
    }
}

fn sma(window: &[MarketSnapshot], period: usize) -> f64 {
    let tail = &window[window.len() - period..];
    tail.iter().map(|snapshot| snapshot.price).sum::<f64>() / period as f64
}

impl FactorProvider for MaCrossover {
    fn name(&self) -> &str {
        "ma-crossover"
    }

    fn lookback(&self) -> usize {
        self.slow
    }

    fn compute(&self, window: &[MarketSnapshot]) -> FactorScore {
        if let Some(score) = warming_up(self.name(), window, self.slow) {
            return score;
        }

        let fast = sma(window, self.fast);
        let slow = sma(window, self.slow);
        if slow == 0.0 {
            return FactorScore::invalid(self.name(), "zero slow average");
        }

        FactorScore::valid(self.name(), (fast - slow) / slow)
    }
}
