// Signal Aggregator
// Folds per-factor scores into one composite signal

use crate::normalize;
use chrono::{DateTime, Utc};
use common::{CompositeSignal, EngineConfig, EngineError, FactorScore};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Combines the tick's valid factor scores into a CompositeSignal using
/// the configured weights and normalization rules.
pub struct SignalAggregator {
    config: Arc<EngineConfig>,
}

impl SignalAggregator {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }

    /// Aggregate one tick's factor scores.
    ///
    /// Invalid factors are discarded; the weight mass of absent factors is
    /// redistributed proportionally over the factors present this tick
    /// (weighted sum over renormalized weights). Confidence is the share
    /// of total configured weight that contributed. Zero valid factors is
    /// a refusal (`InsufficientData`), never a fabricated zero signal.
    pub fn aggregate(
        &self,
        instrument: &str,
        timestamp: DateTime<Utc>,
        scores: &HashMap<String, FactorScore>,
    ) -> Result<CompositeSignal, EngineError> {
        let mut contributing = BTreeSet::new();
        let mut present_weight = 0.0;
        let mut weighted_sum = 0.0;

        // Deterministic fold: configured (sorted) weight order, not map
        // order. Scores for unweighted factors are ignored.
        for (name, weight) in &self.config.factor_weights {
            let Some(score) = scores.get(name) else {
                debug!(factor = %name, "No score for weighted factor this tick");
                continue;
            };
            if !score.valid {
                debug!(
                    factor = %name,
                    reason = score.reason.as_deref().unwrap_or(""),
                    "Discarding invalid factor"
                );
                continue;
            }
            if *weight == 0.0 {
                continue;
            }

            let Some(rule) = self.config.normalization.get(name) else {
                // Unreachable after config validation.
                warn!(factor = %name, "No normalization rule; discarding factor");
                continue;
            };

            let normalized = normalize::apply(rule, score.value);
            weighted_sum += normalized * weight;
            present_weight += weight;
            contributing.insert(name.clone());
        }

        if contributing.is_empty() || present_weight <= 0.0 {
            return Err(EngineError::InsufficientData {
                instrument: instrument.to_string(),
                timestamp,
            });
        }

        let score = weighted_sum / present_weight;
        let confidence = present_weight / self.config.total_weight();

        debug!(
            instrument,
            score,
            confidence,
            factors = contributing.len(),
            "Aggregated composite signal"
        );

        Ok(CompositeSignal {
            score,
            confidence,
            contributing_factors: contributing,
        })
    }
}
