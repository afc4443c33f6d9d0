//! Side-by-side comparison of two plans
//!
//! Typically an interest-bearing plan against its interest-free counterpart,
//! so the dashboard can show what the interest actually earns.

use crate::error::ConfigurationError;
use crate::loan::LoanConfiguration;
use crate::pricing::{YieldCalculator, YieldResult};
use serde::{Deserialize, Serialize};

/// Both results plus their deltas (bearing minus free)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Interest-bearing plan
    pub bearing: YieldResult,
    /// Interest-free plan
    pub free: YieldResult,
    pub yield_difference: f64,
    pub profit_difference: f64,
}

/// Prices two plans with one calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct ComparisonEngine {
    calculator: YieldCalculator,
}

impl ComparisonEngine {
    /// Create an engine around a configured calculator
    pub fn new(calculator: YieldCalculator) -> Self {
        Self { calculator }
    }

    /// Compute both configurations and package the results
    ///
    /// Fails if either configuration is invalid.
    pub fn compare(
        &self,
        interest_bearing: &LoanConfiguration,
        interest_free: &LoanConfiguration,
    ) -> Result<Comparison, ConfigurationError> {
        let bearing = self.calculator.compute(interest_bearing)?;
        let free = self.calculator.compute(interest_free)?;

        Ok(Comparison {
            bearing,
            free,
            yield_difference: bearing.effective_yield - free.effective_yield,
            profit_difference: bearing.net_profit - free.net_profit,
        })
    }

    /// Compare `config` against the same plan at zero APR
    pub fn compare_interest_models(
        &self,
        config: &LoanConfiguration,
    ) -> Result<Comparison, ConfigurationError> {
        self.compare(config, &config.with_apr(0.0))
    }
}
