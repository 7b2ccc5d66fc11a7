// Decision Storage Interface
// Append-only persistence for emitted decisions

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::Decision;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Storage backend for Decision records, keyed `(instrument, timestamp)`.
///
/// Write-only from the engine's perspective: the pipeline appends and
/// never reads back mid-run. The read methods exist for audit and tests.
#[async_trait]
pub trait DecisionStore: Send + Sync {
    /// Append one immutable decision. Appending an existing key is an
    /// error: decisions are never overwritten.
    async fn append(&self, decision: &Decision) -> Result<()>;

    /// Fetch a decision by key.
    async fn get(&self, instrument: &str, timestamp: DateTime<Utc>) -> Result<Option<Decision>>;

    /// Storage statistics.
    async fn stats(&self) -> Result<StoreStats>;
}

/// Storage statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_decisions: usize,
    pub decisions_by_instrument: HashMap<String, usize>,
}

/// In-memory store for tests and development.
pub struct InMemoryDecisionStore {
    decisions: RwLock<HashMap<(String, DateTime<Utc>), Decision>>,
}

impl InMemoryDecisionStore {
    pub fn new() -> Self {
        Self {
            decisions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryDecisionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DecisionStore for InMemoryDecisionStore {
    async fn append(&self, decision: &Decision) -> Result<()> {
        let mut decisions = self.decisions.write().await;
        let key = (decision.instrument.clone(), decision.timestamp);
        if decisions.contains_key(&key) {
            anyhow::bail!(
                "decision already recorded for {} at {}",
                decision.instrument,
                decision.timestamp
            );
        }
        decisions.insert(key, decision.clone());
        Ok(())
    }

    async fn get(&self, instrument: &str, timestamp: DateTime<Utc>) -> Result<Option<Decision>> {
        let decisions = self.decisions.read().await;
        Ok(decisions.get(&(instrument.to_string(), timestamp)).cloned())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let decisions = self.decisions.read().await;
        let mut by_instrument: HashMap<String, usize> = HashMap::new();
        for (instrument, _) in decisions.keys() {
            *by_instrument.entry(instrument.clone()).or_insert(0) += 1;
        }
        Ok(StoreStats {
            total_decisions: decisions.len(),
            decisions_by_instrument: by_instrument,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{CompositeSignal, RiskVerdict};
    use std::collections::BTreeSet;

    fn decision(instrument: &str, offset_secs: i64) -> Decision {
        Decision::new(
            instrument,
            DateTime::from_timestamp(1_700_000_000 + offset_secs, 0).unwrap(),
            CompositeSignal {
                score: 0.1,
                confidence: 1.0,
                contributing_factors: BTreeSet::new(),
            },
            RiskVerdict {
                approved: true,
                scaled_size: 1.0,
                reasons: Vec::new(),
            },
        )
    }

    #[tokio::test]
    async fn test_append_and_get() {
        let store = InMemoryDecisionStore::new();
        let decision = decision("BTC-USDT", 0);
        store.append(&decision).await.unwrap();

        let fetched = store
            .get("BTC-USDT", decision.timestamp)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.id, decision.id);

        assert!(store
            .get("ETH-USDT", decision.timestamp)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_key_is_rejected() {
        let store = InMemoryDecisionStore::new();
        let first = decision("BTC-USDT", 0);
        store.append(&first).await.unwrap();

        let duplicate = decision("BTC-USDT", 0);
        assert!(store.append(&duplicate).await.is_err());

        // The original is untouched.
        let fetched = store
            .get("BTC-USDT", first.timestamp)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.id, first.id);
    }

    #[tokio::test]
    async fn test_stats_count_per_instrument() {
        let store = InMemoryDecisionStore::new();
        store.append(&decision("BTC-USDT", 0)).await.unwrap();
        store.append(&decision("BTC-USDT", 1)).await.unwrap();
        store.append(&decision("ETH-USDT", 0)).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_decisions, 3);
        assert_eq!(stats.decisions_by_instrument["BTC-USDT"], 2);
        assert_eq!(stats.decisions_by_instrument["ETH-USDT"], 1);
    }
}
