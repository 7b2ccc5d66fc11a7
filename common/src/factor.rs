// Factor Score
// Output of one factor provider for one tick

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single named factor value computed from a snapshot window.
///
/// `valid == false` is a normal, expected state (warm-up, provider timeout,
/// degenerate input), not an error. A score is never valid with a
/// non-finite value: the only constructor that produces `valid == true`
/// demotes NaN/inf to an invalid score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorScore {
    pub name: String,
    pub value: f64,
    pub valid: bool,
    /// Cause recorded when `valid == false`
    pub reason: Option<String>,
    pub computed_at: DateTime<Utc>,
}

impl FactorScore {
    /// A usable score. Non-finite values are demoted to invalid.
    pub fn valid(name: impl Into<String>, value: f64) -> Self {
        let name = name.into();
        if !value.is_finite() {
            return Self::invalid(name, "non-finite value");
        }
        Self {
            name,
            value,
            valid: true,
            reason: None,
            computed_at: Utc::now(),
        }
    }

    /// A score that must not contribute to aggregation.
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: 0.0,
            valid: false,
            reason: Some(reason.into()),
            computed_at: Utc::now(),
        }
    }
}
