// Composite Signal
// Weighted fusion of all valid factors for one tick

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The unified decision signal produced by the aggregator.
///
/// A CompositeSignal only exists when at least one valid factor
/// contributed; the aggregator refuses to fabricate one otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeSignal {
    /// Directional score in [-1, 1]
    pub score: f64,
    /// Share of configured weight mass that contributed, in [0, 1]
    pub confidence: f64,
    /// Names of the factors that contributed
    pub contributing_factors: BTreeSet<String>,
}
