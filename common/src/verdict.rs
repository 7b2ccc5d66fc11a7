// Risk Verdict
// Outcome of the risk rule chain for one composite signal

use serde::{Deserialize, Serialize};

/// What the risk gate decided.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskVerdict {
    /// False as soon as any rule blocked
    pub approved: bool,
    /// Product of all applied scale factors, in [0, 1]; 1.0 when none fired
    pub scaled_size: f64,
    /// Names of the rules that fired (block or scale), in evaluation order
    pub reasons: Vec<String>,
}
