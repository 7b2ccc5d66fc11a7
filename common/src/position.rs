// Position State
// Read-only snapshot of execution-layer state, supplied once per run

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Execution-layer state the risk gate reads.
///
/// Owned and mutated exclusively by the external execution layer; the
/// engine holds one immutable snapshot for the duration of a pipeline run
/// and never writes it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionState {
    pub instrument: String,
    /// Total capital allocated to this instrument
    pub capital: Decimal,
    /// Currently deployed exposure
    pub open_exposure: Decimal,
    /// Order-book depth available near the desired size
    pub available_liquidity: Decimal,
    /// Realized + unrealized PnL since the daily roll
    pub daily_pnl: Decimal,
    pub as_of: DateTime<Utc>,
}
