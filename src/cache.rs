//! Memoization of yield results
//!
//! Optional layer for callers that recompute the same configuration
//! repeatedly (a dashboard redrawing with unchanged inputs). Keys are the bit
//! patterns of every configuration field, so changing any field is a miss and
//! no explicit invalidation is needed.

use crate::error::ConfigurationError;
use crate::loan::LoanConfiguration;
use crate::pricing::{YieldCalculator, YieldResult};
use std::collections::HashMap;

/// Structural key over every field of a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigKey([u64; 16]);

impl From<&LoanConfiguration> for ConfigKey {
    fn from(config: &LoanConfiguration) -> Self {
        ConfigKey([
            config.principal.to_bits(),
            u64::from(config.installment_count),
            u64::from(config.installment_frequency.days()),
            config.apr.to_bits(),
            config.fixed_fee_pct.to_bits(),
            config.late_fee_amount.to_bits(),
            config.late_installment_pct.to_bits(),
            config.merchant_commission_pct.to_bits(),
            u64::from(config.settlement_delay_days),
            config.default_rate.to_bits(),
            config.recovery_rate.to_bits(),
            config.funding_cost_apr.to_bits(),
            config.target_yield.to_bits(),
            u64::from(config.first_installment_upfront),
            config.early_repayment_rate.to_bits(),
            u64::from(config.early_repayment_installment),
        ])
    }
}

/// Yield results memoized by configuration
#[derive(Debug, Default)]
pub struct YieldCache {
    calculator: YieldCalculator,
    entries: HashMap<ConfigKey, YieldResult>,

    /// Statistics
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl YieldCache {
    /// Create an empty cache with a default calculator
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache around a configured calculator
    pub fn with_calculator(calculator: YieldCalculator) -> Self {
        Self {
            calculator,
            ..Default::default()
        }
    }

    /// Cached result for `config`, computing and storing it on a miss
    ///
    /// Invalid configurations return the error and are never stored.
    pub fn get_or_compute(
        &mut self,
        config: &LoanConfiguration,
    ) -> Result<YieldResult, ConfigurationError> {
        let key = ConfigKey::from(config);
        if let Some(result) = self.entries.get(&key) {
            self.cache_hits += 1;
            return Ok(*result);
        }

        self.cache_misses += 1;
        let result = self.calculator.compute(config)?;
        self.entries.insert(key, result);
        Ok(result)
    }

    /// Clear all cached data
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cache_hits = 0;
        self.cache_misses = 0;
    }

    /// Number of cached results
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_after_miss() {
        let mut cache = YieldCache::new();
        let config = LoanConfiguration::default();

        let first = cache.get_or_compute(&config).unwrap();
        let second = cache.get_or_compute(&config).unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.cache_misses, 1);
        assert_eq!(cache.cache_hits, 1);
        assert_eq!(cache.hit_rate(), 0.5);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_any_field_change_misses() {
        let mut cache = YieldCache::new();
        let base = LoanConfiguration::default();
        cache.get_or_compute(&base).unwrap();

        // target_yield does not affect the result but is still part of the key
        cache.get_or_compute(&base.with_target_yield(0.5)).unwrap();
        cache.get_or_compute(&base.with_settlement_delay_days(2)).unwrap();
        cache.get_or_compute(&base.with_first_installment_upfront(true)).unwrap();
        cache.get_or_compute(&base.with_early_repayment(0.2, 3)).unwrap();
        // Inert segment, same result, still a distinct key
        cache.get_or_compute(&base.with_early_repayment(0.0, 5)).unwrap();
        assert_eq!(cache.cache_misses, 6);
        assert_eq!(cache.len(), 6);
    }

    #[test]
    fn test_invalid_configuration_not_cached() {
        let mut cache = YieldCache::new();
        let invalid = LoanConfiguration::default().with_default_rate(0.8);
        assert!(cache.get_or_compute(&invalid).is_err());
        assert!(cache.get_or_compute(&invalid).is_err());
        assert!(cache.is_empty());
        assert_eq!(cache.cache_misses, 2);
    }

    #[test]
    fn test_clear() {
        let mut cache = YieldCache::new();
        cache.get_or_compute(&LoanConfiguration::default()).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.hit_rate(), 0.0);
    }
}
