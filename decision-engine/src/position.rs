// Position Provider Interface
// Read-only bridge to the execution layer's position state

use anyhow::Result;
use async_trait::async_trait;
use common::PositionState;

/// Supplies the externally-owned PositionState.
///
/// The engine takes one read-only snapshot per pipeline run and never
/// mutates it; ownership stays with the execution layer.
#[async_trait]
pub trait PositionProvider: Send + Sync {
    async fn position(&self, instrument: &str) -> Result<PositionState>;
}

/// Fixed-state provider for tests and examples.
pub struct StaticPositionProvider {
    state: PositionState,
}

impl StaticPositionProvider {
    pub fn new(state: PositionState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl PositionProvider for StaticPositionProvider {
    async fn position(&self, instrument: &str) -> Result<PositionState> {
        anyhow::ensure!(
            instrument == self.state.instrument,
            "no position state for instrument {instrument}"
        );
        Ok(self.state.clone())
    }
}
