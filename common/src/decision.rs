// Decision
// Terminal output of one pipeline run

use crate::signal::CompositeSignal;
use crate::verdict::RiskVerdict;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable record handed to the execution layer and appended to storage,
/// keyed by `(instrument, timestamp)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub id: Uuid,
    pub instrument: String,
    /// Evaluation tick this decision belongs to
    pub timestamp: DateTime<Utc>,
    pub composite: CompositeSignal,
    pub verdict: RiskVerdict,
    pub created_at: DateTime<Utc>,
}

impl Decision {
    pub fn new(
        instrument: impl Into<String>,
        timestamp: DateTime<Utc>,
        composite: CompositeSignal,
        verdict: RiskVerdict,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            instrument: instrument.into(),
            timestamp,
            composite,
            verdict,
            created_at: Utc::now(),
        }
    }
}
