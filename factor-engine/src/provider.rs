// Factor Provider Interface
// The capability contract every factor source implements

use common::{FactorScore, MarketSnapshot};

/// A single named factor computed over a sliding snapshot window.
///
/// Implementations are pure functions of the window and their constructor
/// parameters: no I/O, no mutation of the window. A window shorter than
/// `lookback()` is normal during warm-up and yields an invalid score, not
/// an error.
pub trait FactorProvider: Send + Sync {
    /// Stable factor name; keys weights and normalization in the config.
    fn name(&self) -> &str;

    /// Number of snapshots this factor needs in its window.
    fn lookback(&self) -> usize;

    /// Compute the factor score for a time-ordered, gap-free window.
    fn compute(&self, window: &[MarketSnapshot]) -> FactorScore;
}

/// Warm-up guard shared by the built-in providers.
pub(crate) fn warming_up(
    name: &str,
    window: &[MarketSnapshot],
    required: usize,
) -> Option<FactorScore> {
    if window.len() < required {
        Some(FactorScore::invalid(
            name,
            format!("warming up: {} of {} snapshots", window.len(), required),
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_warming_up_guard() {
        let window: Vec<MarketSnapshot> = (0..3)
            .map(|i| MarketSnapshot::new("BTC-USDT", Utc::now(), 100.0 + i as f64, 1.0))
            .collect();

        let short = warming_up("rsi", &window, 5).unwrap();
        assert!(!short.valid);
        assert!(short.reason.unwrap().contains("3 of 5"));

        assert!(warming_up("rsi", &window, 3).is_none());
    }
}
