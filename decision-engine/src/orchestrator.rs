// Decision Orchestrator
// Sequences collecting -> computing -> aggregating -> risk gating into
// one atomic pipeline run per tick

use crate::position::PositionProvider;
use crate::storage::DecisionStore;
use crate::window::SnapshotWindow;
use common::{Decision, EngineConfig, EngineError, MarketSnapshot};
use dashmap::DashMap;
use factor_engine::{FactorEngine, ProviderRegistry};
use risk_gate::RiskGate;
use signal_fusion::SignalAggregator;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Pipeline stage of one tick run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TickStage {
    Idle = 0,
    Collecting = 1,
    Computing = 2,
    Aggregating = 3,
    RiskGating = 4,
    Done = 5,
    Failed = 6,
}

impl TickStage {
    fn from_u8(value: u8) -> TickStage {
        match value {
            0 => TickStage::Idle,
            1 => TickStage::Collecting,
            2 => TickStage::Computing,
            3 => TickStage::Aggregating,
            4 => TickStage::RiskGating,
            5 => TickStage::Done,
            _ => TickStage::Failed,
        }
    }
}

/// Input for one tick: a completed snapshot, or a partial one plus the
/// names of the sources that failed to report (collection incomplete).
#[derive(Debug, Clone)]
pub struct TickInput {
    pub snapshot: MarketSnapshot,
    pub missing_sources: Vec<String>,
}

impl TickInput {
    pub fn complete(snapshot: MarketSnapshot) -> Self {
        Self {
            snapshot,
            missing_sources: Vec::new(),
        }
    }

    pub fn incomplete(snapshot: MarketSnapshot, missing_sources: Vec<String>) -> Self {
        Self {
            snapshot,
            missing_sources,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.missing_sources.is_empty()
    }
}

struct Inflight {
    cancel: Arc<AtomicBool>,
    stage: Arc<AtomicU8>,
}

/// Orchestrates the per-tick pipeline with at-most-one in-flight run per
/// instrument.
///
/// A newly arriving tick supersedes a run that is still collecting or
/// computing for the same instrument; once aggregation has started a run
/// completes or fails but is never cancelled mid-flight, so no partially
/// computed Decision can ever be emitted.
pub struct Orchestrator {
    config: Arc<EngineConfig>,
    engine: FactorEngine,
    aggregator: SignalAggregator,
    gate: RiskGate,
    positions: Arc<dyn PositionProvider>,
    store: Arc<dyn DecisionStore>,
    windows: DashMap<String, SnapshotWindow>,
    lanes: DashMap<String, Arc<Mutex<()>>>,
    inflight: DashMap<String, Inflight>,
    window_capacity: usize,
}

impl Orchestrator {
    /// Build the full pipeline. Fails fast with a configuration error
    /// when the config and the provider registry disagree.
    pub fn new(
        config: EngineConfig,
        registry: ProviderRegistry,
        positions: Arc<dyn PositionProvider>,
        store: Arc<dyn DecisionStore>,
    ) -> Result<Self, EngineError> {
        config.validate(&registry.names())?;

        let registry = Arc::new(registry);
        let config = Arc::new(config);
        let engine = FactorEngine::new(Arc::clone(&registry), &config);
        let window_capacity = engine.max_lookback().max(1);

        info!(
            providers = registry.len(),
            rules = config.risk_rules.len(),
            window_capacity,
            "Decision orchestrator ready"
        );

        Ok(Self {
            aggregator: SignalAggregator::new(Arc::clone(&config)),
            gate: RiskGate::from_specs(&config.risk_rules),
            config,
            engine,
            positions,
            store,
            windows: DashMap::new(),
            lanes: DashMap::new(),
            inflight: DashMap::new(),
            window_capacity,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one tick for the snapshot's instrument.
    ///
    /// Returns the emitted Decision, or `None` when the run was superseded
    /// by a newer tick before aggregation started. Failures are tick-local:
    /// the caller logs them and simply feeds the next tick.
    pub async fn run_tick(&self, input: TickInput) -> Result<Option<Decision>, EngineError> {
        let instrument = input.snapshot.instrument.clone();
        let timestamp = input.snapshot.timestamp;

        // Supersede: a run still collecting/computing this instrument is
        // stale now; tell it to stand down. Runs past that point finish.
        if let Some(current) = self.inflight.get(&instrument) {
            let current_stage = TickStage::from_u8(current.stage.load(Ordering::Acquire));
            if current_stage <= TickStage::Computing {
                info!(instrument = %instrument, stage = ?current_stage, "Superseding in-flight tick");
                current.cancel.store(true, Ordering::Release);
            }
        }

        // At-most-one run per instrument.
        let lane = {
            let entry = self
                .lanes
                .entry(instrument.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())));
            Arc::clone(entry.value())
        };
        let _guard = lane.lock().await;

        let cancel = Arc::new(AtomicBool::new(false));
        let stage = Arc::new(AtomicU8::new(TickStage::Collecting as u8));
        self.inflight.insert(
            instrument.clone(),
            Inflight {
                cancel: Arc::clone(&cancel),
                stage: Arc::clone(&stage),
            },
        );

        let result = self.pipeline(&input, &cancel, &stage).await;
        self.inflight.remove(&instrument);

        match &result {
            Ok(Some(_)) => {}
            Ok(None) => debug!(instrument = %instrument, "Tick superseded; no decision emitted"),
            Err(err) => {
                stage.store(TickStage::Failed as u8, Ordering::Release);
                warn!(
                    instrument = %instrument,
                    %timestamp,
                    error = %err,
                    "Tick failed; awaiting next tick"
                );
            }
        }
        result
    }

    async fn pipeline(
        &self,
        input: &TickInput,
        cancel: &AtomicBool,
        stage: &AtomicU8,
    ) -> Result<Option<Decision>, EngineError> {
        let instrument = input.snapshot.instrument.clone();
        let timestamp = input.snapshot.timestamp;

        // Collecting: fold the snapshot into this instrument's window. An
        // incomplete collection proceeds with whatever factors remain
        // computable rather than blocking the tick.
        if !input.is_complete() {
            warn!(
                instrument = %instrument,
                missing = ?input.missing_sources,
                "Collection incomplete; proceeding with remaining factors"
            );
        }
        let window_copy = {
            let mut entry = self
                .windows
                .entry(instrument.clone())
                .or_insert_with(|| SnapshotWindow::new(self.window_capacity));
            entry
                .push(input.snapshot.clone())
                .map_err(|err| EngineError::collaborator("collector", err))?;
            entry.to_vec()
        };

        if cancel.load(Ordering::Acquire) {
            return Ok(None);
        }
        stage.store(TickStage::Computing as u8, Ordering::Release);

        let scores = self.engine.evaluate(Arc::new(window_copy)).await;

        // Last cancellation point: once aggregation starts, the run
        // completes or fails.
        if cancel.load(Ordering::Acquire) {
            return Ok(None);
        }
        stage.store(TickStage::Aggregating as u8, Ordering::Release);

        let composite = self.aggregator.aggregate(&instrument, timestamp, &scores)?;

        stage.store(TickStage::RiskGating as u8, Ordering::Release);
        let position = self
            .positions
            .position(&instrument)
            .await
            .map_err(|err| EngineError::collaborator("position-provider", err))?;
        let verdict = self.gate.evaluate(&composite, &position);

        let decision = Decision::new(instrument.as_str(), timestamp, composite, verdict);
        self.store
            .append(&decision)
            .await
            .map_err(|err| EngineError::collaborator("decision-store", err))?;

        stage.store(TickStage::Done as u8, Ordering::Release);
        info!(
            instrument = %instrument,
            %timestamp,
            score = decision.composite.score,
            confidence = decision.composite.confidence,
            approved = decision.verdict.approved,
            scaled_size = decision.verdict.scaled_size,
            "Decision emitted"
        );
        Ok(Some(decision))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::StaticPositionProvider;
    use crate::storage::InMemoryDecisionStore;
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use common::{FactorScore, NormalizationRule, PositionState, RiskRuleSpec};
    use factor_engine::FactorProvider;
    use rust_decimal::Decimal;
    use std::collections::BTreeMap;
    use std::time::Duration;

    struct Const {
        name: &'static str,
        value: f64,
        lookback: usize,
    }

    impl FactorProvider for Const {
        fn name(&self) -> &str {
            self.name
        }

        fn lookback(&self) -> usize {
            self.lookback
        }

        fn compute(&self, window: &[MarketSnapshot]) -> FactorScore {
            if window.len() < self.lookback {
                return FactorScore::invalid(self.name, "warming up");
            }
            FactorScore::valid(self.name, self.value)
        }
    }

    struct Slow {
        value: f64,
    }

    impl FactorProvider for Slow {
        fn name(&self) -> &str {
            "slow"
        }

        fn lookback(&self) -> usize {
            1
        }

        fn compute(&self, _window: &[MarketSnapshot]) -> FactorScore {
            std::thread::sleep(Duration::from_millis(300));
            FactorScore::valid("slow", self.value)
        }
    }

    struct FailingPositions;

    #[async_trait]
    impl PositionProvider for FailingPositions {
        async fn position(&self, _instrument: &str) -> Result<PositionState> {
            anyhow::bail!("execution layer unreachable")
        }
    }

    fn at(offset_secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + offset_secs, 0).unwrap()
    }

    fn snapshot(offset_secs: i64) -> MarketSnapshot {
        MarketSnapshot::new("BTC-USDT", at(offset_secs), 100.0 + offset_secs as f64, 1.0)
    }

    fn test_position() -> PositionState {
        PositionState {
            instrument: "BTC-USDT".into(),
            capital: Decimal::from(10_000),
            open_exposure: Decimal::ZERO,
            available_liquidity: Decimal::from(50_000),
            daily_pnl: Decimal::ZERO,
            as_of: Utc::now(),
        }
    }

    fn identity_normalization(names: &[&str]) -> BTreeMap<String, NormalizationRule> {
        names
            .iter()
            .map(|name| {
                (
                    name.to_string(),
                    NormalizationRule::MinMax {
                        min: -1.0,
                        max: 1.0,
                    },
                )
            })
            .collect()
    }

    fn test_config(names: &[&str], timeout_ms: u64) -> EngineConfig {
        EngineConfig {
            factor_weights: names.iter().map(|name| (name.to_string(), 1.0)).collect(),
            normalization: identity_normalization(names),
            risk_rules: vec![RiskRuleSpec::ConfidenceFloor {
                min_confidence: 0.2,
            }],
            provider_timeout_ms: timeout_ms,
        }
    }

    fn build_orchestrator(
        names_values: &[(&'static str, f64, usize)],
        timeout_ms: u64,
    ) -> (Arc<Orchestrator>, Arc<InMemoryDecisionStore>) {
        let mut registry = ProviderRegistry::new();
        for &(name, value, lookback) in names_values {
            registry
                .register(Arc::new(Const {
                    name,
                    value,
                    lookback,
                }))
                .unwrap();
        }

        let names: Vec<&str> = names_values.iter().map(|(name, _, _)| *name).collect();
        let store = Arc::new(InMemoryDecisionStore::new());
        let orchestrator = Orchestrator::new(
            test_config(&names, timeout_ms),
            registry,
            Arc::new(StaticPositionProvider::new(test_position())),
            store.clone(),
        )
        .unwrap();
        (Arc::new(orchestrator), store)
    }

    #[tokio::test]
    async fn test_happy_path_emits_and_stores_decision() {
        let (orchestrator, store) =
            build_orchestrator(&[("const-a", 0.6, 1), ("const-b", -0.2, 1)], 200);

        let decision = orchestrator
            .run_tick(TickInput::complete(snapshot(0)))
            .await
            .unwrap()
            .expect("decision expected");

        assert!((decision.composite.score - 0.2).abs() < 1e-12);
        assert_eq!(decision.composite.confidence, 1.0);
        assert!(decision.verdict.approved);

        let stored = store.get("BTC-USDT", at(0)).await.unwrap().unwrap();
        assert_eq!(stored.id, decision.id);
    }

    #[tokio::test]
    async fn test_warm_up_is_insufficient_data_without_decision() {
        let (orchestrator, store) = build_orchestrator(&[("const-a", 0.6, 5)], 200);

        let err = orchestrator
            .run_tick(TickInput::complete(snapshot(0)))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientData { .. }));

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_decisions, 0);
    }

    #[tokio::test]
    async fn test_window_fills_across_ticks() {
        let (orchestrator, _store) = build_orchestrator(&[("const-a", 0.6, 3)], 200);

        for i in 0..2 {
            let result = orchestrator
                .run_tick(TickInput::complete(snapshot(i)))
                .await;
            assert!(result.is_err(), "tick {i} should still be warming up");
        }

        let decision = orchestrator
            .run_tick(TickInput::complete(snapshot(2)))
            .await
            .unwrap();
        assert!(decision.is_some());
    }

    #[tokio::test]
    async fn test_gap_restarts_warm_up() {
        let (orchestrator, _store) = build_orchestrator(&[("const-a", 0.6, 3)], 200);

        for i in 0..3 {
            let _ = orchestrator
                .run_tick(TickInput::complete(snapshot(i)))
                .await;
        }

        // Collector drops some ticks, then resumes with the gap flagged.
        let err = orchestrator
            .run_tick(TickInput::complete(snapshot(60).with_gap()))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientData { .. }));
    }

    #[tokio::test]
    async fn test_out_of_order_snapshot_is_collaborator_failure() {
        let (orchestrator, _store) = build_orchestrator(&[("const-a", 0.6, 1)], 200);

        orchestrator
            .run_tick(TickInput::complete(snapshot(10)))
            .await
            .unwrap();

        let err = orchestrator
            .run_tick(TickInput::complete(snapshot(5)))
            .await
            .unwrap_err();
        match err {
            EngineError::Collaborator { collaborator, .. } => {
                assert_eq!(collaborator, "collector")
            }
            other => panic!("expected collaborator error, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_position_provider_failure_fails_tick() {
        let mut registry = ProviderRegistry::new();
        registry
            .register(Arc::new(Const {
                name: "const-a",
                value: 0.6,
                lookback: 1,
            }))
            .unwrap();

        let store = Arc::new(InMemoryDecisionStore::new());
        let orchestrator = Orchestrator::new(
            test_config(&["const-a"], 200),
            registry,
            Arc::new(FailingPositions),
            store.clone(),
        )
        .unwrap();

        let err = orchestrator
            .run_tick(TickInput::complete(snapshot(0)))
            .await
            .unwrap_err();
        match err {
            EngineError::Collaborator { collaborator, .. } => {
                assert_eq!(collaborator, "position-provider")
            }
            other => panic!("expected collaborator error, got {other}"),
        }

        assert_eq!(store.stats().await.unwrap().total_decisions, 0);
    }

    #[tokio::test]
    async fn test_incomplete_collection_still_produces_decision() {
        let (orchestrator, _store) = build_orchestrator(&[("const-a", 0.6, 1)], 200);

        let input = TickInput::incomplete(snapshot(0), vec!["sentiment-api".into()]);
        let decision = orchestrator.run_tick(input).await.unwrap();
        assert!(decision.is_some());
    }

    #[tokio::test]
    async fn test_startup_rejects_unregistered_weighted_factor() {
        let registry = ProviderRegistry::new();
        let store = Arc::new(InMemoryDecisionStore::new());
        let result = Orchestrator::new(
            test_config(&["ghost"], 200),
            registry,
            Arc::new(StaticPositionProvider::new(test_position())),
            store,
        );

        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_new_tick_supersedes_computing_run() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(Slow { value: 0.6 })).unwrap();

        let store = Arc::new(InMemoryDecisionStore::new());
        let orchestrator = Arc::new(
            Orchestrator::new(
                test_config(&["slow"], 2_000),
                registry,
                Arc::new(StaticPositionProvider::new(test_position())),
                store.clone(),
            )
            .unwrap(),
        );

        let first = {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(
                async move { orchestrator.run_tick(TickInput::complete(snapshot(0))).await },
            )
        };

        // Let the first run reach the computing stage, then supersede it.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = orchestrator
            .run_tick(TickInput::complete(snapshot(1)))
            .await
            .unwrap();

        let first = first.await.unwrap().unwrap();
        assert!(first.is_none(), "superseded run must not emit");
        let second = second.expect("superseding run emits the decision");
        assert_eq!(second.timestamp, at(1));

        // Only the second tick's decision reached storage.
        assert_eq!(store.stats().await.unwrap().total_decisions, 1);
    }
}
