//! Interest-free installment cap
//!
//! Finds the longest zero-APR plan that fees, merchant commission and late
//! fees can carry on their own.

use crate::error::ConfigurationError;
use crate::loan::{LoanConfiguration, MAX_INSTALLMENTS, MIN_INSTALLMENTS};
use super::engine::YieldCalculator;
use super::result::YieldResult;

/// Scans installment counts from the longest plan down at zero APR
#[derive(Debug, Clone, Copy, Default)]
pub struct InterestFreeCapEstimator {
    calculator: YieldCalculator,
}

impl InterestFreeCapEstimator {
    /// Create an estimator around a configured calculator
    pub fn new(calculator: YieldCalculator) -> Self {
        Self { calculator }
    }

    /// Largest installment count with non-negative net profit at zero APR
    ///
    /// Returns `None` when even the shortest plan loses money.
    pub fn max_interest_free_installments(
        &self,
        config: &LoanConfiguration,
    ) -> Result<Option<u32>, ConfigurationError> {
        self.scan(config, |result| result.net_profit >= 0.0)
    }

    /// Largest installment count whose zero-APR effective yield reaches `target_yield`
    pub fn max_interest_free_installments_for_target(
        &self,
        config: &LoanConfiguration,
        target_yield: f64,
    ) -> Result<Option<u32>, ConfigurationError> {
        if !target_yield.is_finite() {
            return Err(ConfigurationError::NotFinite { field: "target_yield" });
        }
        self.scan(config, |result| result.effective_yield >= target_yield)
    }

    fn scan<F>(
        &self,
        config: &LoanConfiguration,
        qualifies: F,
    ) -> Result<Option<u32>, ConfigurationError>
    where
        F: Fn(&YieldResult) -> bool,
    {
        let interest_free = config.with_apr(0.0);
        interest_free.validate()?;

        for installment_count in (MIN_INSTALLMENTS..=MAX_INSTALLMENTS).rev() {
            let variant = interest_free.with_installment_count(installment_count);
            let result = self.calculator.evaluate(&variant);
            if qualifies(&result) {
                log::debug!(
                    "Interest-free cap: {} installments (net profit {:.4}, yield {:.4})",
                    installment_count,
                    result.net_profit,
                    result.effective_yield
                );
                return Ok(Some(installment_count));
            }
        }

        log::debug!(
            "No interest-free plan between {} and {} installments qualifies",
            MIN_INSTALLMENTS,
            MAX_INSTALLMENTS
        );
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::InstallmentFrequency;

    fn config() -> LoanConfiguration {
        LoanConfiguration {
            principal: 100.0,
            installment_count: 4,
            installment_frequency: InstallmentFrequency::Monthly,
            apr: 0.45,
            fixed_fee_pct: 0.0,
            late_fee_amount: 0.0,
            late_installment_pct: 0.0,
            merchant_commission_pct: 0.05,
            settlement_delay_days: 0,
            default_rate: 0.0,
            recovery_rate: 0.0,
            funding_cost_apr: 0.10,
            target_yield: 0.30,
            ..LoanConfiguration::default()
        }
    }

    #[test]
    fn test_all_counts_profitable() {
        // 5.00 commission against at most 100 * 4% * 360/365 funding
        let estimator = InterestFreeCapEstimator::default();
        let cheap = config().with_funding_cost_apr(0.04);
        assert_eq!(estimator.max_interest_free_installments(&cheap).unwrap(), Some(12));
    }

    #[test]
    fn test_funding_cost_limits_cap() {
        // 5.00 commission covers 10% funding for 182.5 days, just over 6 months
        let estimator = InterestFreeCapEstimator::default();
        assert_eq!(estimator.max_interest_free_installments(&config()).unwrap(), Some(6));

        let thin = config().with_merchant_commission_pct(0.03);
        assert_eq!(estimator.max_interest_free_installments(&thin).unwrap(), Some(3));
    }

    #[test]
    fn test_none_when_unprofitable() {
        let estimator = InterestFreeCapEstimator::default();
        let lossy = config().with_default_rate(0.20).with_recovery_rate(0.0);
        assert_eq!(estimator.max_interest_free_installments(&lossy).unwrap(), None);
    }

    #[test]
    fn test_late_fees_extend_cap() {
        let estimator = InterestFreeCapEstimator::default();
        let base = config()
            .with_merchant_commission_pct(0.01)
            .with_funding_cost_apr(0.20);
        assert_eq!(estimator.max_interest_free_installments(&base).unwrap(), None);
        let with = estimator
            .max_interest_free_installments(&base.with_late_fees(5.0, 0.5))
            .unwrap();
        assert_eq!(with, Some(12));
    }

    #[test]
    fn test_target_yield_cap() {
        let estimator = InterestFreeCapEstimator::default();
        // Yield at n months is (5 - 10 * n * 30 / 365) / 100 * 365 / (30 n)
        let cap = estimator
            .max_interest_free_installments_for_target(&config(), 0.10)
            .unwrap();
        assert_eq!(cap, Some(3));

        let unreachable = estimator
            .max_interest_free_installments_for_target(&config(), 0.60)
            .unwrap();
        assert_eq!(unreachable, None);
    }

    #[test]
    fn test_ignores_configured_apr_but_validates_rest() {
        let estimator = InterestFreeCapEstimator::default();
        assert!(estimator
            .max_interest_free_installments(&config().with_apr(5.0))
            .is_ok());
        assert!(estimator
            .max_interest_free_installments(&config().with_default_rate(0.9))
            .is_err());
    }
}
