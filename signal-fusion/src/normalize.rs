// Factor Normalization
// Pure, stateless mapping of raw factor values onto [-1, 1]

use common::NormalizationRule;

/// Apply a configured rule to one raw value.
///
/// The result is always finite and inside [-1, 1]; values outside the
/// configured range clamp to the nearest bound. Degenerate parameters
/// (rejected by config validation) fall back to 0.0.
pub fn apply(rule: &NormalizationRule, raw: f64) -> f64 {
    match rule {
        NormalizationRule::MinMax { min, max } => {
            let span = max - min;
            if span <= 0.0 {
                return 0.0;
            }
            let unit = ((raw - min) / span).clamp(0.0, 1.0);
            unit * 2.0 - 1.0
        }
        NormalizationRule::ZScore {
            mean,
            std_dev,
            clamp,
        } => {
            if *std_dev <= 0.0 || *clamp <= 0.0 {
                return 0.0;
            }
            let z = (raw - mean) / std_dev;
            z.clamp(-clamp, *clamp) / clamp
        }
    }
}
