//! Named breakers, one per upstream call class.

use dashmap::DashMap;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::CircuitBreakerConfig;
use crate::resilience::circuit_breaker::{BreakerSnapshot, CircuitBreaker};

/// Independently tracked classes of upstream calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallClass {
    /// Similar-ids lookup of the root product.
    SimilarIds,
    /// Detail lookup of a single similar product.
    ProductById,
}

impl CallClass {
    pub const ALL: [CallClass; 2] = [CallClass::SimilarIds, CallClass::ProductById];

    pub fn as_str(&self) -> &'static str {
        match self {
            CallClass::SimilarIds => "similar-ids",
            CallClass::ProductById => "product-by-id",
        }
    }
}

impl fmt::Display for CallClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CallClass::ALL
            .into_iter()
            .find(|class| class.as_str() == s)
            .ok_or_else(|| format!("unknown call class '{}'", s))
    }
}

/// Process-wide set of breakers. Cheap to clone.
#[derive(Debug, Clone)]
pub struct BreakerRegistry {
    breakers: Arc<DashMap<CallClass, Arc<CircuitBreaker>>>,
    config: CircuitBreakerConfig,
}

impl BreakerRegistry {
    /// Create a registry with a closed breaker for every call class.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        let breakers = DashMap::new();
        for class in CallClass::ALL {
            breakers.insert(class, Arc::new(CircuitBreaker::new(class.as_str(), config.clone())));
        }
        Self {
            breakers: Arc::new(breakers),
            config,
        }
    }

    /// Breaker guarding `class`.
    pub fn get(&self, class: CallClass) -> Arc<CircuitBreaker> {
        if let Some(breaker) = self.breakers.get(&class) {
            return breaker.value().clone();
        }
        self.breakers
            .entry(class)
            .or_insert_with(|| Arc::new(CircuitBreaker::new(class.as_str(), self.config.clone())))
            .clone()
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Snapshots in a stable order.
    pub fn snapshot(&self) -> Vec<BreakerSnapshot> {
        CallClass::ALL
            .into_iter()
            .map(|class| self.get(class).snapshot())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::circuit_breaker::CircuitState;

    #[test]
    fn test_classes_are_isolated() {
        let registry = BreakerRegistry::new(CircuitBreakerConfig::default());
        registry.get(CallClass::SimilarIds).force_open();

        assert_eq!(registry.get(CallClass::SimilarIds).state(), CircuitState::Open);
        assert_eq!(registry.get(CallClass::ProductById).state(), CircuitState::Closed);

        let names: Vec<_> = registry.snapshot().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["similar-ids", "product-by-id"]);
    }

    #[test]
    fn test_clones_share_state() {
        let registry = BreakerRegistry::new(CircuitBreakerConfig::default());
        let clone = registry.clone();
        clone.get(CallClass::ProductById).force_open();
        assert_eq!(registry.get(CallClass::ProductById).state(), CircuitState::Open);
    }

    #[test]
    fn test_call_class_parsing() {
        assert_eq!("similar-ids".parse::<CallClass>(), Ok(CallClass::SimilarIds));
        assert_eq!("product-by-id".parse::<CallClass>(), Ok(CallClass::ProductById));
        assert!("client".parse::<CallClass>().is_err());
    }
}
