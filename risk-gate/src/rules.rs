// Risk Rules
// Each rule inspects (CompositeSignal, PositionState) and either passes,
// blocks, or scales the eventual order size

use common::{BreachAction, CompositeSignal, PositionState, RiskRuleSpec};
use rust_decimal::prelude::ToPrimitive;

/// Inputs a rule sees. `scale_so_far` is the cumulative product of scale
/// factors applied by earlier rules in the chain.
pub struct RuleContext<'a> {
    pub signal: &'a CompositeSignal,
    pub position: &'a PositionState,
    pub scale_so_far: f64,
}

impl RuleContext<'_> {
    /// Notional the execution layer would deploy at full conviction,
    /// scaled by the chain so far.
    pub fn proposed_notional(&self) -> f64 {
        let capital = self.position.capital.to_f64().unwrap_or(0.0);
        self.signal.score.abs() * self.scale_so_far * capital
    }
}

/// Outcome of one rule evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    Pass,
    /// Veto the tick; rules after this one are not evaluated.
    Block { detail: String },
    /// Multiply the final size by `factor` (in (0, 1]) and keep going.
    Scale { factor: f64, detail: String },
}

/// One link of the risk chain. Implementations must be deterministic:
/// same context in, same outcome out.
pub trait RiskRule: Send + Sync {
    /// Stable name recorded in verdict reasons.
    fn name(&self) -> &'static str;

    fn evaluate(&self, ctx: &RuleContext) -> RuleOutcome;
}

/// Block when composite confidence is below the configured floor.
pub struct ConfidenceFloor {
    pub min_confidence: f64,
}

impl RiskRule for ConfidenceFloor {
    fn name(&self) -> &'static str {
        "confidence-floor"
    }

    fn evaluate(&self, ctx: &RuleContext) -> RuleOutcome {
        if ctx.signal.confidence < self.min_confidence {
            RuleOutcome::Block {
                detail: format!(
                    "confidence {:.3} below floor {:.3}",
                    ctx.signal.confidence, self.min_confidence
                ),
            }
        } else {
            RuleOutcome::Pass
        }
    }
}

/// Block when the resulting exposure would exceed the configured fraction
/// of capital.
pub struct PositionConcentration {
    pub max_fraction: f64,
}

impl RiskRule for PositionConcentration {
    fn name(&self) -> &'static str {
        "position-concentration"
    }

    fn evaluate(&self, ctx: &RuleContext) -> RuleOutcome {
        let capital = ctx.position.capital.to_f64().unwrap_or(0.0);
        if capital <= 0.0 {
            return RuleOutcome::Block {
                detail: "no capital allocated".into(),
            };
        }

        let open = ctx.position.open_exposure.to_f64().unwrap_or(0.0);
        let resulting = open + ctx.proposed_notional();
        let limit = self.max_fraction * capital;
        if resulting > limit {
            RuleOutcome::Block {
                detail: format!(
                    "resulting exposure {resulting:.2} exceeds {:.1}% of capital {capital:.2}",
                    self.max_fraction * 100.0
                ),
            }
        } else {
            RuleOutcome::Pass
        }
    }
}

/// Scale down (or block) when order-book depth at the proposed size is
/// below the configured multiple of it.
pub struct LiquidityDepth {
    pub min_depth_ratio: f64,
    pub on_breach: BreachAction,
}

impl RiskRule for LiquidityDepth {
    fn name(&self) -> &'static str {
        "liquidity-depth"
    }

    fn evaluate(&self, ctx: &RuleContext) -> RuleOutcome {
        let notional = ctx.proposed_notional();
        if notional <= 0.0 {
            return RuleOutcome::Pass; // nothing to size
        }

        let depth = ctx.position.available_liquidity.to_f64().unwrap_or(0.0);
        let ratio = depth / notional;
        if ratio >= self.min_depth_ratio {
            return RuleOutcome::Pass;
        }

        let factor = ratio / self.min_depth_ratio;
        match self.on_breach {
            BreachAction::Block => RuleOutcome::Block {
                detail: format!(
                    "depth ratio {ratio:.2} below minimum {:.2}",
                    self.min_depth_ratio
                ),
            },
            // Scale factors live in (0, 1]; a depth of zero blocks.
            BreachAction::Scale if factor > 0.0 => RuleOutcome::Scale {
                factor,
                detail: format!(
                    "depth ratio {ratio:.2} below minimum {:.2}, scaling by {factor:.2}",
                    self.min_depth_ratio
                ),
            },
            BreachAction::Scale => RuleOutcome::Block {
                detail: "no order-book depth available".into(),
            },
        }
    }
}

/// Block once realized daily loss reaches the configured fraction of
/// capital.
pub struct DrawdownHalt {
    pub max_daily_loss: f64,
}

impl RiskRule for DrawdownHalt {
    fn name(&self) -> &'static str {
        "drawdown-halt"
    }

    fn evaluate(&self, ctx: &RuleContext) -> RuleOutcome {
        let capital = ctx.position.capital.to_f64().unwrap_or(0.0);
        if capital <= 0.0 {
            return RuleOutcome::Block {
                detail: "no capital allocated".into(),
            };
        }

        let daily_pnl = ctx.position.daily_pnl.to_f64().unwrap_or(0.0);
        let loss_fraction = (-daily_pnl / capital).max(0.0);
        if loss_fraction >= self.max_daily_loss {
            RuleOutcome::Block {
                detail: format!(
                    "daily loss {:.1}% at halt threshold {:.1}%",
                    loss_fraction * 100.0,
                    self.max_daily_loss * 100.0
                ),
            }
        } else {
            RuleOutcome::Pass
        }
    }
}

/// Build the rule chain from declarative config specs, preserving order.
pub fn build_rules(specs: &[RiskRuleSpec]) -> Vec<Box<dyn RiskRule>> {
    specs
        .iter()
        .map(|spec| -> Box<dyn RiskRule> {
            match spec {
                RiskRuleSpec::ConfidenceFloor { min_confidence } => Box::new(ConfidenceFloor {
                    min_confidence: *min_confidence,
                }),
                RiskRuleSpec::PositionConcentration { max_fraction } => {
                    Box::new(PositionConcentration {
                        max_fraction: *max_fraction,
                    })
                }
                RiskRuleSpec::LiquidityDepth {
                    min_depth_ratio,
                    on_breach,
                } => Box::new(LiquidityDepth {
                    min_depth_ratio: *min_depth_ratio,
                    on_breach: *on_breach,
                }),
                RiskRuleSpec::DrawdownHalt { max_daily_loss } => Box::new(DrawdownHalt {
                    max_daily_loss: *max_daily_loss,
                }),
            }
        })
        .collect()
}
