//! Shared data model for the Signal Fusion & Risk Gating Engine
//!
//! Every record that crosses a pipeline stage boundary lives here, together
//! with the engine configuration and the error taxonomy. Records are tagged
//! and carry explicit validity flags; "missing data" is a first-class,
//! checkable state rather than a sentinel value.

pub mod config;
pub mod decision;
pub mod error;
pub mod factor;
pub mod position;
pub mod signal;
pub mod snapshot;
pub mod verdict;

pub use config::{BreachAction, EngineConfig, NormalizationRule, RiskRuleSpec};
pub use decision::Decision;
pub use error::EngineError;
pub use factor::FactorScore;
pub use position::PositionState;
pub use signal::CompositeSignal;
pub use snapshot::MarketSnapshot;
pub use verdict::RiskVerdict;

pub use uuid::Uuid;
