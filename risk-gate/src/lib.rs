//! Risk Gate (Layer 3)
//!
//! Ordered risk rule chain gating composite signals before they become
//! actionable decisions. Rules can pass, block, or scale; the chain is
//! deterministic and fully auditable through the verdict's reasons.

pub mod gate;
pub mod rules;

pub use gate::RiskGate;
pub use rules::{RiskRule, RuleContext, RuleOutcome};
