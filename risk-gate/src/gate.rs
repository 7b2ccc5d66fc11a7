// Risk Gate
// Ordered rule chain producing the verdict for one composite signal

use crate::rules::{build_rules, RiskRule, RuleContext, RuleOutcome};
use common::{CompositeSignal, PositionState, RiskRuleSpec, RiskVerdict};
use tracing::{debug, info};

/// Applies the configured rules in order.
///
/// The first Block short-circuits the remaining rules; Scale outcomes are
/// cumulative (multiplicative) and never short-circuit. Evaluation is
/// deterministic: the same rule list and inputs produce the same reasons
/// sequence on every run.
pub struct RiskGate {
    rules: Vec<Box<dyn RiskRule>>,
}

impl RiskGate {
    pub fn from_specs(specs: &[RiskRuleSpec]) -> Self {
        Self {
            rules: build_rules(specs),
        }
    }

    /// Chain built from already-constructed rules (test seam).
    pub fn from_rules(rules: Vec<Box<dyn RiskRule>>) -> Self {
        Self { rules }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Evaluate the chain against one signal and the current position
    /// snapshot.
    pub fn evaluate(&self, signal: &CompositeSignal, position: &PositionState) -> RiskVerdict {
        let mut scaled_size = 1.0;
        let mut reasons = Vec::new();
        let mut approved = true;

        for rule in &self.rules {
            let ctx = RuleContext {
                signal,
                position,
                scale_so_far: scaled_size,
            };
            match rule.evaluate(&ctx) {
                RuleOutcome::Pass => {}
                RuleOutcome::Scale { factor, detail } => {
                    debug!(
                        rule = rule.name(),
                        factor,
                        %detail,
                        instrument = %position.instrument,
                        "Risk rule scaled the signal"
                    );
                    scaled_size *= factor;
                    reasons.push(rule.name().to_string());
                }
                RuleOutcome::Block { detail } => {
                    info!(
                        rule = rule.name(),
                        %detail,
                        instrument = %position.instrument,
                        "Risk rule blocked the signal"
                    );
                    reasons.push(rule.name().to_string());
                    approved = false;
                    break; // fail-fast: later rules never fire
                }
            }
        }

        RiskVerdict {
            approved,
            scaled_size,
            reasons,
        }
    }
}
