// Decision Engine (Layer 4)
// Sequences factor computation, signal fusion and risk gating into one
// atomic per-tick pipeline and emits immutable Decision records

pub mod orchestrator;
pub mod position;
pub mod storage;
pub mod window;

pub use orchestrator::{Orchestrator, TickInput, TickStage};
pub use position::{PositionProvider, StaticPositionProvider};
pub use storage::{DecisionStore, InMemoryDecisionStore, StoreStats};
pub use window::SnapshotWindow;
