// Provider Registry
// Explicit name -> provider mapping; factors are added by registering,
// never by reflection

use crate::provider::FactorProvider;
use common::EngineError;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Registry of factor providers keyed by their stable names.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn FactorProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: BTreeMap::new(),
        }
    }

    /// Register a provider under its own name. A duplicate name is a
    /// startup configuration error.
    pub fn register(&mut self, provider: Arc<dyn FactorProvider>) -> Result<(), EngineError> {
        let name = provider.name().to_string();
        if self.providers.contains_key(&name) {
            return Err(EngineError::Config(format!(
                "factor provider '{name}' registered twice"
            )));
        }

        info!(
            factor = %name,
            lookback = provider.lookback(),
            "Registered factor provider"
        );
        self.providers.insert(name, provider);
        Ok(())
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(|name| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Largest window any registered provider needs.
    pub fn max_lookback(&self) -> usize {
        self.providers
            .values()
            .map(|provider| provider.lookback())
            .max()
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn FactorProvider>)> {
        self.providers
            .iter()
            .map(|(name, provider)| (name.as_str(), provider))
    }
}
