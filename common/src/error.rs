// Engine error taxonomy
//
// Per-factor provider failures are deliberately absent: they become
// invalid FactorScores with a recorded reason and never escalate.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Tick-level and startup-time failures of the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Zero valid factors this tick. Recoverable: the tick fails, no
    /// Decision is emitted, the next tick is unaffected.
    #[error("insufficient data for {instrument} at {timestamp}: no valid factors")]
    InsufficientData {
        instrument: String,
        timestamp: DateTime<Utc>,
    },

    /// Malformed configuration. Fatal: the engine refuses to start.
    #[error("configuration error: {0}")]
    Config(String),

    /// A collaborator (collector, position provider, decision store)
    /// failed. Recoverable: the tick fails and the work is retried only on
    /// the next natural tick, never within the same tick.
    #[error("collaborator unavailable ({collaborator}): {source}")]
    Collaborator {
        collaborator: &'static str,
        source: anyhow::Error,
    },
}

impl EngineError {
    pub fn collaborator(collaborator: &'static str, source: anyhow::Error) -> Self {
        Self::Collaborator {
            collaborator,
            source,
        }
    }

    /// Only configuration errors abort startup; everything else is
    /// confined to the tick that raised it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_config_errors_are_fatal() {
        assert!(EngineError::Config("weights sum to zero".into()).is_fatal());
        assert!(!EngineError::InsufficientData {
            instrument: "BTC-USDT".into(),
            timestamp: Utc::now(),
        }
        .is_fatal());
        assert!(!EngineError::collaborator("decision-store", anyhow::anyhow!("down")).is_fatal());
    }

    #[test]
    fn test_display_names_the_collaborator() {
        let err = EngineError::collaborator("position-provider", anyhow::anyhow!("timeout"));
        assert!(err.to_string().contains("position-provider"));
    }
}
