// Relative Strength Index
// Wilder's smoothing: SMA seed over the first `period` deltas, then
// exponential smoothing across the rest of the window

use crate::provider::{warming_up, FactorProvider};
use common::{FactorScore, MarketSnapshot};

/// RSI factor in [0, 100].
///
/// A perfectly flat window yields the neutral 50; a window with only
/// gains yields 100, only losses 0.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Default for Rsi {
    fn default() -> Self {
        Self::new(14)
    }
}

impl FactorProvider for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    // Seed on the first `period` deltas, smooth across the second.
    fn lookback(&self) -> usize {
        self.period * 2 + 1
    }

    fn compute(&self, window: &[MarketSnapshot]) -> FactorScore {
        if let Some(score) = warming_up(self.name(), window, self.lookback()) {
            return score;
        }

        let deltas: Vec<f64> = window
            .windows(2)
            .map(|pair| pair[1].price - pair[0].price)
            .collect();

        let period = self.period as f64;
        let mut gains = 0.0;
        let mut losses = 0.0;
        for delta in &deltas[..self.period] {
            if *delta > 0.0 {
                gains += delta;
            } else {
                losses += -delta;
            }
        }

        let mut avg_gain = gains / period;
        let mut avg_loss = losses / period;

        for delta in &deltas[self.period..] {
            let (gain, loss) = if *delta > 0.0 {
                (*delta, 0.0)
            } else {
                (0.0, -delta)
            };
            avg_gain = (avg_gain * (period - 1.0) + gain) / period;
            avg_loss = (avg_loss * (period - 1.0) + loss) / period;
        }

        let value = if avg_loss == 0.0 && avg_gain == 0.0 {
            50.0 // no movement at all
        } else if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        };

        FactorScore::valid(self.name(), value)
    }
}
