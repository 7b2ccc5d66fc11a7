//! Engine configuration
//!
//! One immutable value constructed at startup and passed by reference into
//! every component; there is no process-wide mutable config. Validation is
//! fail-fast: a malformed configuration refuses to start the engine.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-factor rule mapping a raw factor value onto [-1, 1].
///
/// Pure and stateless: a function of the raw value and the configured
/// parameters only. It never looks at other factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum NormalizationRule {
    /// Affine map of [min, max] onto [-1, 1]; values outside the range
    /// clamp to the nearest bound.
    MinMax { min: f64, max: f64 },
    /// (x - mean) / std_dev, clamped to [-clamp, clamp], rescaled onto
    /// [-1, 1].
    ZScore {
        mean: f64,
        std_dev: f64,
        #[serde(default = "default_zscore_clamp")]
        clamp: f64,
    },
}

fn default_zscore_clamp() -> f64 {
    3.0
}

/// What the liquidity-depth rule does when the depth ratio falls below its
/// configured minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BreachAction {
    Block,
    Scale,
}

/// Declarative risk rule entry. Position in the config list is evaluation
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "kebab-case")]
pub enum RiskRuleSpec {
    /// Block when composite confidence is below the floor.
    ConfidenceFloor { min_confidence: f64 },
    /// Block when the resulting exposure would exceed this fraction of
    /// capital.
    PositionConcentration { max_fraction: f64 },
    /// Scale down (or block) when order-book depth at the desired size is
    /// below `min_depth_ratio` times the trade size.
    LiquidityDepth {
        min_depth_ratio: f64,
        #[serde(default = "default_breach_action")]
        on_breach: BreachAction,
    },
    /// Block once the daily loss reaches this fraction of capital.
    DrawdownHalt { max_daily_loss: f64 },
}

fn default_breach_action() -> BreachAction {
    BreachAction::Scale
}

impl RiskRuleSpec {
    fn validate(&self) -> Result<(), EngineError> {
        match self {
            RiskRuleSpec::ConfidenceFloor { min_confidence } => {
                if !(0.0..=1.0).contains(min_confidence) {
                    return Err(EngineError::Config(format!(
                        "confidence-floor min_confidence must be in [0, 1], got {min_confidence}"
                    )));
                }
            }
            RiskRuleSpec::PositionConcentration { max_fraction } => {
                if !(*max_fraction > 0.0 && max_fraction.is_finite()) {
                    return Err(EngineError::Config(format!(
                        "position-concentration max_fraction must be positive, got {max_fraction}"
                    )));
                }
            }
            RiskRuleSpec::LiquidityDepth {
                min_depth_ratio, ..
            } => {
                if !(*min_depth_ratio > 0.0 && min_depth_ratio.is_finite()) {
                    return Err(EngineError::Config(format!(
                        "liquidity-depth min_depth_ratio must be positive, got {min_depth_ratio}"
                    )));
                }
            }
            RiskRuleSpec::DrawdownHalt { max_daily_loss } => {
                if !(*max_daily_loss > 0.0 && *max_daily_loss <= 1.0) {
                    return Err(EngineError::Config(format!(
                        "drawdown-halt max_daily_loss must be in (0, 1], got {max_daily_loss}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Engine configuration.
///
/// BTreeMaps keep iteration order deterministic so aggregation folds
/// factors in the same order on every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Non-negative weight per factor; must not sum to zero
    pub factor_weights: BTreeMap<String, f64>,
    /// Normalization rule per weighted factor
    pub normalization: BTreeMap<String, NormalizationRule>,
    /// Risk rules in evaluation order
    #[serde(default)]
    pub risk_rules: Vec<RiskRuleSpec>,
    /// Per-provider computation budget
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: u64,
}

fn default_provider_timeout_ms() -> u64 {
    250
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Sum of all configured weights.
    pub fn total_weight(&self) -> f64 {
        self.factor_weights.values().sum()
    }

    /// Fail-fast startup validation. `registered` lists the factor names
    /// the provider registry knows.
    pub fn validate(&self, registered: &[&str]) -> Result<(), EngineError> {
        if self.factor_weights.is_empty() {
            return Err(EngineError::Config("no factor weights configured".into()));
        }

        for (name, weight) in &self.factor_weights {
            if !(*weight >= 0.0 && weight.is_finite()) {
                return Err(EngineError::Config(format!(
                    "weight for factor '{name}' must be non-negative and finite, got {weight}"
                )));
            }
        }

        if self.total_weight() <= 0.0 {
            return Err(EngineError::Config("factor weights sum to zero".into()));
        }

        for name in self.factor_weights.keys() {
            if !registered.contains(&name.as_str()) {
                return Err(EngineError::Config(format!(
                    "factor '{name}' has no registered provider"
                )));
            }
            if !self.normalization.contains_key(name) {
                return Err(EngineError::Config(format!(
                    "factor '{name}' has no normalization rule"
                )));
            }
        }

        for (name, rule) in &self.normalization {
            match rule {
                NormalizationRule::MinMax { min, max } => {
                    if !(max > min) || !min.is_finite() || !max.is_finite() {
                        return Err(EngineError::Config(format!(
                            "normalization range for '{name}' must satisfy min < max"
                        )));
                    }
                }
                NormalizationRule::ZScore {
                    std_dev, clamp, ..
                } => {
                    if !(*std_dev > 0.0 && *clamp > 0.0) {
                        return Err(EngineError::Config(format!(
                            "z-score normalization for '{name}' needs std_dev > 0 and clamp > 0"
                        )));
                    }
                }
            }
        }

        for spec in &self.risk_rules {
            spec.validate()?;
        }

        if self.provider_timeout_ms == 0 {
            return Err(EngineError::Config(
                "provider_timeout_ms must be positive".into(),
            ));
        }

        Ok(())
    }
}
