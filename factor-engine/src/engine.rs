// Factor Computation Engine
// Runs every registered provider against the current snapshot window

use crate::registry::ProviderRegistry;
use common::{EngineConfig, FactorScore, MarketSnapshot};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Evaluates all registered providers concurrently for one tick.
///
/// Providers are independent pure computations over the same read-only
/// window, so each runs on its own blocking task under a per-provider
/// timeout. A timeout or a panic inside `compute` demotes that factor to
/// an invalid score with the reason recorded; one bad factor never aborts
/// the tick.
pub struct FactorEngine {
    registry: Arc<ProviderRegistry>,
    timeout: Duration,
}

impl FactorEngine {
    pub fn new(registry: Arc<ProviderRegistry>, config: &EngineConfig) -> Self {
        Self {
            registry,
            timeout: Duration::from_millis(config.provider_timeout_ms),
        }
    }

    /// Largest window any provider needs; the orchestrator sizes its ring
    /// buffers with this.
    pub fn max_lookback(&self) -> usize {
        self.registry.max_lookback()
    }

    /// Evaluate every provider over the tail of `window` sized to its own
    /// lookback. Returns one score per registered provider, always.
    pub async fn evaluate(
        &self,
        window: Arc<Vec<MarketSnapshot>>,
    ) -> HashMap<String, FactorScore> {
        let mut handles = Vec::with_capacity(self.registry.len());

        for (name, provider) in self.registry.iter() {
            let name = name.to_string();
            let provider = Arc::clone(provider);
            let window = Arc::clone(&window);
            let budget = self.timeout;

            let handle = tokio::spawn({
                let name = name.clone();
                async move {
                    let compute = tokio::task::spawn_blocking(move || {
                        let lookback = provider.lookback();
                        let tail = if window.len() > lookback {
                            &window[window.len() - lookback..]
                        } else {
                            &window[..]
                        };
                        provider.compute(tail)
                    });

                    // A timed-out blocking task keeps running past its
                    // budget; its result is dropped.
                    match tokio::time::timeout(budget, compute).await {
                        Ok(Ok(score)) => score,
                        Ok(Err(join_err)) => {
                            warn!(factor = %name, error = %join_err, "Factor provider panicked");
                            FactorScore::invalid(&name, "provider panicked")
                        }
                        Err(_) => {
                            warn!(
                                factor = %name,
                                timeout_ms = budget.as_millis() as u64,
                                "Factor provider timed out"
                            );
                            FactorScore::invalid(
                                &name,
                                format!("timed out after {}ms", budget.as_millis()),
                            )
                        }
                    }
                }
            });
            handles.push((name, handle));
        }

        let mut scores = HashMap::with_capacity(handles.len());
        for (name, handle) in handles {
            let score = match handle.await {
                Ok(score) => score,
                Err(join_err) => {
                    warn!(factor = %name, error = %join_err, "Factor evaluation task aborted");
                    FactorScore::invalid(&name, "evaluation task aborted")
                }
            };

            if !score.valid {
                debug!(
                    factor = %name,
                    reason = score.reason.as_deref().unwrap_or(""),
                    "Factor invalid this tick"
                );
            }
            scores.insert(name, score);
        }
        scores
    }
}
