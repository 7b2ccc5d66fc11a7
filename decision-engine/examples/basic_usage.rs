//! End-to-end example: synthetic snapshots through the full pipeline

use chrono::{Duration, Utc};
use common::{
    BreachAction, EngineConfig, MarketSnapshot, NormalizationRule, PositionState, RiskRuleSpec,
};
use decision_engine::{InMemoryDecisionStore, Orchestrator, StaticPositionProvider, TickInput};
use factor_engine::{BollingerPctB, FearGreed, MaCrossover, ProviderRegistry, Rsi};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::Level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::WARN).init();

    println!("=== Signal Fusion & Risk Gating Example ===\n");

    // Register the built-in factor providers.
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(MaCrossover::default()))?;
    registry.register(Arc::new(Rsi::default()))?;
    registry.register(Arc::new(BollingerPctB::default()))?;
    registry.register(Arc::new(FearGreed::default()))?;

    // One immutable config: weights, per-factor normalization, ordered
    // risk rules.
    let mut factor_weights = BTreeMap::new();
    factor_weights.insert("ma-crossover".to_string(), 2.0);
    factor_weights.insert("rsi".to_string(), 1.0);
    factor_weights.insert("bollinger-pctb".to_string(), 1.0);
    factor_weights.insert("fear-greed".to_string(), 1.0);

    let mut normalization = BTreeMap::new();
    normalization.insert(
        "ma-crossover".to_string(),
        NormalizationRule::MinMax {
            min: -0.02,
            max: 0.02,
        },
    );
    normalization.insert(
        "rsi".to_string(),
        NormalizationRule::MinMax {
            min: 0.0,
            max: 100.0,
        },
    );
    normalization.insert(
        "bollinger-pctb".to_string(),
        NormalizationRule::MinMax { min: 0.0, max: 1.0 },
    );
    normalization.insert(
        "fear-greed".to_string(),
        NormalizationRule::MinMax {
            min: 0.0,
            max: 100.0,
        },
    );

    let config = EngineConfig {
        factor_weights,
        normalization,
        risk_rules: vec![
            RiskRuleSpec::ConfidenceFloor {
                min_confidence: 0.4,
            },
            RiskRuleSpec::DrawdownHalt {
                max_daily_loss: 0.05,
            },
            RiskRuleSpec::PositionConcentration { max_fraction: 0.5 },
            RiskRuleSpec::LiquidityDepth {
                min_depth_ratio: 2.0,
                on_breach: BreachAction::Scale,
            },
        ],
        provider_timeout_ms: 250,
    };

    // Collaborators: a fixed execution-layer position snapshot and an
    // in-memory decision store.
    let positions = StaticPositionProvider::new(PositionState {
        instrument: "BTC-USDT".into(),
        capital: Decimal::from(100_000),
        open_exposure: Decimal::from(10_000),
        available_liquidity: Decimal::from(60_000),
        daily_pnl: Decimal::from(-1_500),
        as_of: Utc::now(),
    });
    let store = Arc::new(InMemoryDecisionStore::new());

    let orchestrator = Orchestrator::new(config, registry, Arc::new(positions), store.clone())?;

    // Feed synthetic snapshots: a gentle uptrend with a wobble, sentiment
    // reported every third tick.
    let base = Utc::now();
    let mut warm_up_ticks = 0usize;
    let mut emitted = 0usize;

    for i in 0..60i64 {
        let timestamp = base + Duration::seconds(i);
        let price = 30_000.0 + 40.0 * i as f64 + 120.0 * (i as f64 * 0.35).sin();
        let mut snapshot = MarketSnapshot::new("BTC-USDT", timestamp, price, 12.5)
            .with_depth(55_000.0, 48_000.0);
        if i % 3 == 0 {
            snapshot = snapshot.with_sentiment(35.0 + i as f64);
        }

        match orchestrator.run_tick(TickInput::complete(snapshot)).await {
            Ok(Some(decision)) => {
                emitted += 1;
                println!(
                    "tick {i:>2}: score {:+.3}  confidence {:.2}  approved {}  size {:.2}  reasons {:?}",
                    decision.composite.score,
                    decision.composite.confidence,
                    decision.verdict.approved,
                    decision.verdict.scaled_size,
                    decision.verdict.reasons,
                );
            }
            Ok(None) => {}
            Err(_) => warm_up_ticks += 1,
        }
    }

    let stats = store.stats().await?;
    println!("\nWarm-up ticks without a decision: {warm_up_ticks}");
    println!("Decisions emitted and stored:     {}", stats.total_decisions);
    assert_eq!(emitted, stats.total_decisions);

    println!("\n=== Example Complete ===");
    Ok(())
}
