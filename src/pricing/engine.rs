//! Core yield calculation for a single BNPL loan
//!
//! Timeline of a loan:
//! - Day 0: customer purchases, first installment clock starts
//! - Day `settlement_delay_days`: lender pays the merchant (capital deployed)
//! - Day `loan_duration_days`: last customer installment collected
//!
//! Capital is therefore at risk for `loan_duration_days - settlement_delay_days`.
//! When the first installment is paid at purchase, only the remaining
//! installments are financed and the loan runs one period shorter.
//! When the merchant is paid on or after the last installment the deployment
//! window is empty and the true yield is unbounded; that float scenario is
//! flagged and priced against a proxy window instead.

use crate::error::ConfigurationError;
use crate::loan::{LoanConfiguration, DAYS_PER_YEAR};
use super::result::YieldResult;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Default proxy deployment window in a float scenario, as a share of loan duration
pub const DEFAULT_FLOAT_PROXY_FRACTION: f64 = 0.25;

/// How customer interest income is approximated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestMethod {
    /// Interest on the outstanding balance before each equal principal installment
    #[default]
    DecliningBalance,
    /// Half the simple interest on full principal over the loan duration
    ///
    /// Earlier dashboard approximation, kept to reproduce its published figures.
    HalfRateSimple,
}

/// Heuristic constants of the yield calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Share of loan duration used as the deployment window in a float scenario
    pub float_proxy_fraction: f64,

    /// Interest income approximation
    pub interest_method: InterestMethod,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            float_proxy_fraction: DEFAULT_FLOAT_PROXY_FRACTION,
            interest_method: InterestMethod::DecliningBalance,
        }
    }
}

impl EngineSettings {
    /// Reject a proxy fraction outside (0, 1]
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.float_proxy_fraction.is_finite() {
            return Err(ConfigurationError::NotFinite {
                field: "float_proxy_fraction",
            });
        }
        if self.float_proxy_fraction <= 0.0 || self.float_proxy_fraction > 1.0 {
            return Err(ConfigurationError::OutOfRange {
                field: "float_proxy_fraction",
                value: self.float_proxy_fraction,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(())
    }
}

/// Capital deployment window for a loan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeploymentWindow {
    /// Days the lender's capital is outstanding (the proxy window when floating)
    pub capital_deployment_days: f64,
    /// Merchant paid on or after the last customer installment
    pub is_float_scenario: bool,
    /// Days between the last installment and merchant settlement, 0 if not floating
    pub float_period_days: u32,
}

/// Stateless yield calculator
///
/// Holds only its settings; every call is a pure function of the configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct YieldCalculator {
    settings: EngineSettings,
}

impl YieldCalculator {
    /// Create a calculator with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a calculator with custom settings
    pub fn with_settings(settings: EngineSettings) -> Result<Self, ConfigurationError> {
        settings.validate()?;
        Ok(Self { settings })
    }

    /// Settings this calculator was built with
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Compute the yield result for a configuration
    ///
    /// Rejects the configuration before any arithmetic if a field is out of range.
    pub fn compute(
        &self,
        config: &LoanConfiguration,
    ) -> Result<YieldResult, ConfigurationError> {
        config.validate()?;
        Ok(self.evaluate(config))
    }

    /// Compute many configurations in parallel, preserving input order
    pub fn compute_batch(
        &self,
        configs: &[LoanConfiguration],
    ) -> Vec<Result<YieldResult, ConfigurationError>> {
        configs.par_iter().map(|config| self.compute(config)).collect()
    }

    /// Evaluate a configuration that has already been validated
    ///
    /// Callers inside the crate use this to vary a field beyond its
    /// customer-facing range (the APR solver) without re-validating.
    pub(crate) fn evaluate(&self, config: &LoanConfiguration) -> YieldResult {
        let mut result = self.evaluate_at_delay(config, config.settlement_delay_days);

        let baseline_yield = if config.settlement_delay_days == 0 {
            result.effective_yield
        } else {
            self.evaluate_at_delay(config, 0).effective_yield
        };
        result.settlement_delay_benefit = result.effective_yield - baseline_yield;

        if result.is_float_scenario {
            log::debug!(
                "Float scenario: settlement {}d >= duration {}d, using {:.1}d proxy deployment",
                config.settlement_delay_days,
                result.loan_duration_days,
                result.capital_deployment_days
            );
        }

        result
    }

    /// Deployment window for a loan settled after `settlement_delay_days`
    ///
    /// In the float scenario the window is the proxy share of
    /// `loan_duration_days` rather than the empty true window.
    pub fn deployment_window(
        &self,
        loan_duration_days: u32,
        settlement_delay_days: u32,
    ) -> DeploymentWindow {
        if settlement_delay_days >= loan_duration_days {
            DeploymentWindow {
                capital_deployment_days: loan_duration_days as f64
                    * self.settings.float_proxy_fraction,
                is_float_scenario: true,
                float_period_days: settlement_delay_days - loan_duration_days,
            }
        } else {
            DeploymentWindow {
                capital_deployment_days: (loan_duration_days - settlement_delay_days).max(1)
                    as f64,
                is_float_scenario: false,
                float_period_days: 0,
            }
        }
    }

    /// Interest earned from the customer over the life of the loan
    ///
    /// With an early-repayment segment this is the portfolio blend of
    /// full-term and early repayers.
    pub fn interest_income(&self, config: &LoanConfiguration) -> f64 {
        let full_term = self.interest_over(config, config.financed_installments());
        match config.early_repayment() {
            Some(early) => {
                (1.0 - early.share) * full_term
                    + early.share * self.interest_over(config, early.installments_paid)
            }
            None => full_term,
        }
    }

    /// Interest accrued on the financed capital during the first `periods` installments
    fn interest_over(&self, config: &LoanConfiguration, periods: u32) -> f64 {
        let capital = config.capital_at_risk();
        let frequency_days = config.installment_frequency.days();
        match self.settings.interest_method {
            InterestMethod::DecliningBalance => {
                let m = config.financed_installments();
                let periodic_rate = config.apr * (frequency_days as f64 / DAYS_PER_YEAR);
                (1..=periods)
                    .map(|k| {
                        let outstanding = capital * (m - k + 1) as f64 / m as f64;
                        outstanding * periodic_rate
                    })
                    .sum()
            }
            InterestMethod::HalfRateSimple => {
                let duration_years = (periods * frequency_days) as f64 / DAYS_PER_YEAR;
                capital * config.apr * duration_years * 0.5
            }
        }
    }

    /// Deployment window, blended by segment share when some loans repay early
    fn blended_window(
        &self,
        config: &LoanConfiguration,
        settlement_delay_days: u32,
    ) -> DeploymentWindow {
        let full_term = self.deployment_window(config.loan_duration_days(), settlement_delay_days);
        let Some(early) = config.early_repayment() else {
            return full_term;
        };

        let early_duration = early.installments_paid * config.installment_frequency.days();
        let early_window = self.deployment_window(early_duration, settlement_delay_days);
        DeploymentWindow {
            capital_deployment_days: (1.0 - early.share) * full_term.capital_deployment_days
                + early.share * early_window.capital_deployment_days,
            is_float_scenario: full_term.is_float_scenario || early_window.is_float_scenario,
            float_period_days: full_term.float_period_days,
        }
    }

    /// Full calculation with the settlement delay overridden, benefit left at zero
    fn evaluate_at_delay(
        &self,
        config: &LoanConfiguration,
        settlement_delay_days: u32,
    ) -> YieldResult {
        let principal = config.principal;
        let capital_at_risk = config.capital_at_risk();
        let financed_installments = config.financed_installments() as f64;
        let loan_duration_days = config.loan_duration_days();
        let early = config.early_repayment();
        let window = self.blended_window(config, settlement_delay_days);
        let deployment_years = window.capital_deployment_days / DAYS_PER_YEAR;

        let interest_income = self.interest_income(config);
        // Fee and commission are charged on the full purchase, whatever is paid upfront
        let fixed_fee_income = principal * config.fixed_fee_pct;
        let merchant_commission_income = principal * config.merchant_commission_pct;

        // Defaulted loans never reach a late-fee-triggering payment
        let full_term_late_fees = financed_installments
            * (1.0 - config.default_rate)
            * config.late_installment_pct
            * config.late_fee_amount;

        let funding_cost = capital_at_risk * config.funding_cost_apr * deployment_years;
        let full_term_loss = capital_at_risk * config.default_rate * (1.0 - config.recovery_rate);

        // Early repayers do not default
        let (late_fee_income, expected_credit_loss) = match early {
            Some(early) => (
                (1.0 - early.share) * full_term_late_fees
                    + early.share
                        * early.installments_paid as f64
                        * config.late_installment_pct
                        * config.late_fee_amount,
                (1.0 - early.share) * full_term_loss,
            ),
            None => (full_term_late_fees, full_term_loss),
        };

        let net_profit = interest_income
            + fixed_fee_income
            + merchant_commission_income
            + late_fee_income
            - funding_cost
            - expected_credit_loss;

        let effective_yield = (net_profit / capital_at_risk) / deployment_years;

        log::trace!(
            "apr={:.6} delay={}d deployment={:.2}d net_profit={:.6} yield={:.6}",
            config.apr,
            settlement_delay_days,
            window.capital_deployment_days,
            net_profit,
            effective_yield
        );

        YieldResult {
            principal,
            apr: config.apr,
            settlement_delay_days,
            capital_at_risk,
            upfront_payment: config.upfront_payment(),
            has_early_repayment: early.is_some(),
            loan_duration_days,
            capital_deployment_days: window.capital_deployment_days,
            is_float_scenario: window.is_float_scenario,
            float_period_days: window.float_period_days,
            interest_income,
            fixed_fee_income,
            merchant_commission_income,
            late_fee_income,
            funding_cost,
            expected_credit_loss,
            net_profit,
            effective_yield,
            settlement_delay_benefit: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::InstallmentFrequency;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    /// 6 monthly installments on 100 at 60% APR, documented dashboard fixture
    fn documented_config() -> LoanConfiguration {
        LoanConfiguration {
            principal: 100.0,
            installment_count: 6,
            installment_frequency: InstallmentFrequency::Monthly,
            apr: 0.60,
            fixed_fee_pct: 0.02,
            late_fee_amount: 0.0,
            late_installment_pct: 0.0,
            merchant_commission_pct: 0.025,
            settlement_delay_days: 0,
            default_rate: 0.05,
            recovery_rate: 0.20,
            funding_cost_apr: 0.0,
            target_yield: 0.60,
            ..LoanConfiguration::default()
        }
    }

    fn legacy_calculator() -> YieldCalculator {
        YieldCalculator::with_settings(EngineSettings {
            interest_method: InterestMethod::HalfRateSimple,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_declining_balance_interest() {
        let calc = YieldCalculator::new();
        let config = documented_config();

        // Balances 100, 83.3, ..., 16.7 sum to 350 at a 30/365 * 60% periodic rate
        let expected = 350.0 * 0.60 * 30.0 / 365.0;
        assert_relative_eq!(calc.interest_income(&config), expected, max_relative = 1e-12);
    }

    #[test]
    fn test_line_items() {
        let calc = YieldCalculator::new();
        let config = documented_config().with_late_fees(5.0, 0.20).with_funding_cost_apr(0.10);
        let result = calc.compute(&config).unwrap();

        assert_eq!(result.loan_duration_days, 180);
        assert_relative_eq!(result.fixed_fee_income, 2.0, max_relative = 1e-12);
        assert_relative_eq!(result.merchant_commission_income, 2.5, max_relative = 1e-12);
        assert_relative_eq!(result.late_fee_income, 5.7, max_relative = 1e-12);
        assert_relative_eq!(result.expected_credit_loss, 4.0, max_relative = 1e-12);
        // Funding accrues over the deployment window only
        assert_relative_eq!(
            result.funding_cost,
            100.0 * 0.10 * 180.0 / 365.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_net_profit_is_sum_of_line_items() {
        let calc = YieldCalculator::new();
        let config = documented_config()
            .with_late_fees(3.0, 0.3)
            .with_funding_cost_apr(0.08)
            .with_settlement_delay_days(12);
        let result = calc.compute(&config).unwrap();

        let total: f64 = result.breakdown().iter().map(|item| item.amount).sum();
        assert_eq!(total, result.net_profit);
        assert_relative_eq!(
            result.total_revenue() - result.total_cost(),
            result.net_profit,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_documented_baseline_yields() {
        let calc = legacy_calculator();

        let no_delay = calc.compute(&documented_config()).unwrap();
        assert_abs_diff_eq!(no_delay.effective_yield, 0.3101, epsilon = 1e-4);
        assert_eq!(no_delay.settlement_delay_benefit, 0.0);

        let delayed = calc
            .compute(&documented_config().with_settlement_delay_days(30))
            .unwrap();
        assert_eq!(delayed.capital_deployment_days, 150.0);
        assert_abs_diff_eq!(delayed.effective_yield, 0.3722, epsilon = 1e-4);
        assert_abs_diff_eq!(delayed.settlement_delay_benefit, 0.0620, epsilon = 1e-4);
    }

    #[test]
    fn test_documented_late_fee_uplift() {
        let calc = legacy_calculator();
        let base = documented_config().with_settlement_delay_days(7);

        let without = calc.compute(&base).unwrap();
        assert_abs_diff_eq!(without.effective_yield, 0.3227, epsilon = 1e-4);

        let with = calc.compute(&base.with_late_fees(5.0, 0.20)).unwrap();
        // 6 installments * 95% non-default * 20% late * 5.00
        assert_relative_eq!(with.late_fee_income, 5.70, max_relative = 1e-12);
        assert_abs_diff_eq!(with.effective_yield, 0.4429, epsilon = 1e-4);
    }

    #[test]
    fn test_declining_balance_yields() {
        let calc = YieldCalculator::new();
        let no_delay = calc.compute(&documented_config()).unwrap();
        // (17.2603 + 2.0 + 2.5 - 4.0) / 100 annualised over 180 days
        assert_abs_diff_eq!(no_delay.effective_yield, 0.360139, epsilon = 1e-6);

        let delayed = calc
            .compute(&documented_config().with_settlement_delay_days(30))
            .unwrap();
        assert_abs_diff_eq!(delayed.effective_yield, 0.432167, epsilon = 1e-6);
        assert_abs_diff_eq!(delayed.settlement_delay_benefit, 0.072028, epsilon = 1e-6);
    }

    #[test]
    fn test_float_scenario() {
        let calc = YieldCalculator::new();
        let config = documented_config()
            .with_installment_count(2)
            .with_frequency(InstallmentFrequency::Biweekly)
            .with_settlement_delay_days(30);
        let result = calc.compute(&config).unwrap();

        assert_eq!(result.loan_duration_days, 28);
        assert!(result.is_float_scenario);
        assert_eq!(result.float_period_days, 2);
        assert_eq!(result.capital_deployment_days, 7.0);
        assert!(result.effective_yield.is_finite());
    }

    #[test]
    fn test_float_boundary() {
        let calc = YieldCalculator::new();
        let base = documented_config()
            .with_installment_count(2)
            .with_frequency(InstallmentFrequency::Biweekly);

        let at_duration = calc.compute(&base.with_settlement_delay_days(28)).unwrap();
        assert!(at_duration.is_float_scenario);
        assert_eq!(at_duration.float_period_days, 0);

        let just_before = calc.compute(&base.with_settlement_delay_days(27)).unwrap();
        assert!(!just_before.is_float_scenario);
        assert_eq!(just_before.capital_deployment_days, 1.0);
    }

    #[test]
    fn test_yield_increases_with_settlement_delay() {
        let calc = YieldCalculator::new();
        let base = documented_config()
            .with_installment_count(4)
            .with_frequency(InstallmentFrequency::Biweekly);

        let mut previous = f64::NEG_INFINITY;
        for delay in 0..base.loan_duration_days() {
            let result = calc.compute(&base.with_settlement_delay_days(delay)).unwrap();
            assert!(
                result.effective_yield > previous,
                "yield did not increase at delay {}",
                delay
            );
            previous = result.effective_yield;
        }
    }

    #[test]
    fn test_all_valid_grid_is_finite() {
        let calc = YieldCalculator::new();
        for frequency in [InstallmentFrequency::Monthly, InstallmentFrequency::Biweekly] {
            for count in 2..=12 {
                for delay in (0..=60).step_by(4) {
                    for default_rate in [0.0, 0.15, 0.30] {
                        let config = documented_config()
                            .with_frequency(frequency)
                            .with_installment_count(count)
                            .with_settlement_delay_days(delay)
                            .with_default_rate(default_rate)
                            .with_funding_cost_apr(0.2);
                        let result = calc.compute(&config).unwrap();
                        assert!(result.capital_deployment_days > 0.0);
                        assert!(result.effective_yield.is_finite());
                        assert!(result.settlement_delay_benefit.is_finite());
                    }
                }
            }
        }
    }

    #[test]
    fn test_rejects_invalid_configuration() {
        let calc = YieldCalculator::new();
        let err = calc
            .compute(&documented_config().with_installment_count(1))
            .unwrap_err();
        assert_eq!(err.field(), "installment_count");
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let settings = EngineSettings {
            float_proxy_fraction: 0.0,
            ..Default::default()
        };
        assert!(YieldCalculator::with_settings(settings).is_err());
    }

    #[test]
    fn test_custom_float_proxy() {
        let calc = YieldCalculator::with_settings(EngineSettings {
            float_proxy_fraction: 0.5,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(calc.settings().float_proxy_fraction, 0.5);
        let window = calc.deployment_window(28, 40);
        assert!(window.is_float_scenario);
        assert_eq!(window.capital_deployment_days, 14.0);
        assert_eq!(window.float_period_days, 12);
    }

    #[test]
    fn test_compute_batch_preserves_order() {
        let calc = YieldCalculator::new();
        let configs: Vec<_> = (2..=12)
            .map(|n| documented_config().with_installment_count(n))
            .collect();
        let mut invalid = configs.clone();
        invalid.push(documented_config().with_apr(3.0));

        let results = calc.compute_batch(&invalid);
        assert_eq!(results.len(), 12);
        for (n, result) in (2..=12).zip(&results) {
            assert_eq!(result.as_ref().unwrap().loan_duration_days, n * 30);
        }
        assert!(results[11].is_err());
    }

    #[test]
    fn test_neutral_options_reproduce_baseline() {
        let calc = YieldCalculator::new();
        let base = documented_config().with_late_fees(5.0, 0.20).with_settlement_delay_days(7);
        let baseline = calc.compute(&base).unwrap();

        let explicit = base
            .with_first_installment_upfront(false)
            .with_early_repayment(0.0, 2);
        assert_eq!(calc.compute(&explicit).unwrap(), baseline);

        // Repaying at the last installment is no different from the full term
        let inert = base.with_early_repayment(0.30, 6);
        let result = calc.compute(&inert).unwrap();
        assert!(!result.has_early_repayment);
        assert_eq!(result, baseline);
        assert_eq!(result.capital_at_risk, 100.0);
        assert_eq!(result.upfront_payment, 0.0);

        let legacy = legacy_calculator().compute(&explicit).unwrap();
        assert_abs_diff_eq!(legacy.effective_yield, 0.4429, epsilon = 1e-4);
    }

    #[test]
    fn test_first_installment_upfront() {
        let calc = YieldCalculator::new();
        let result = calc
            .compute(&documented_config().with_first_installment_upfront(true))
            .unwrap();

        assert_relative_eq!(result.upfront_payment, 100.0 / 6.0, max_relative = 1e-12);
        assert_relative_eq!(result.capital_at_risk, 500.0 / 6.0, max_relative = 1e-12);
        assert_eq!(result.loan_duration_days, 150);
        assert_eq!(result.capital_deployment_days, 150.0);
        // Charged on the full purchase
        assert_relative_eq!(result.merchant_commission_income, 2.5, max_relative = 1e-12);
        assert_relative_eq!(result.fixed_fee_income, 2.0, max_relative = 1e-12);
        // Balances 83.3, 66.7, ..., 16.7 at a 30/365 * 60% periodic rate
        assert_relative_eq!(result.interest_income, 12.328767, max_relative = 1e-6);
        assert_relative_eq!(result.expected_credit_loss, 10.0 / 3.0, max_relative = 1e-12);
        assert_abs_diff_eq!(result.effective_yield, 0.394067, epsilon = 1e-6);

        let legacy = legacy_calculator()
            .compute(&documented_config().with_first_installment_upfront(true))
            .unwrap();
        assert_abs_diff_eq!(legacy.effective_yield, 0.334067, epsilon = 1e-6);
    }

    #[test]
    fn test_upfront_shortens_float_boundary() {
        let calc = YieldCalculator::new();
        let config = documented_config()
            .with_installment_count(2)
            .with_frequency(InstallmentFrequency::Biweekly)
            .with_first_installment_upfront(true)
            .with_settlement_delay_days(14);
        let result = calc.compute(&config).unwrap();

        assert_eq!(result.loan_duration_days, 14);
        assert!(result.is_float_scenario);
        assert!(result.effective_yield.is_finite());
    }

    #[test]
    fn test_early_repayment_blend() {
        let calc = YieldCalculator::new();
        let base = documented_config().with_late_fees(5.0, 0.20);
        let full_term = calc.compute(&base).unwrap();
        let result = calc.compute(&base.with_early_repayment(0.20, 2)).unwrap();

        assert!(result.has_early_repayment);
        // 80% full term, 20% repaying after the first two months
        assert_relative_eq!(result.interest_income, 15.616438, max_relative = 1e-6);
        assert_relative_eq!(result.expected_credit_loss, 3.2, max_relative = 1e-12);
        assert_relative_eq!(result.late_fee_income, 0.8 * 5.7 + 0.2 * 2.0, max_relative = 1e-12);
        assert_relative_eq!(result.capital_deployment_days, 156.0, max_relative = 1e-12);
        assert_eq!(result.loan_duration_days, full_term.loan_duration_days);
        assert_eq!(result.fixed_fee_income, full_term.fixed_fee_income);
        assert_eq!(
            result.merchant_commission_income,
            full_term.merchant_commission_income
        );

        let total: f64 = result.breakdown().iter().map(|item| item.amount).sum();
        assert_eq!(total, result.net_profit);
    }

    #[test]
    fn test_early_repayment_yield() {
        let calc = YieldCalculator::new();
        let result = calc
            .compute(&documented_config().with_early_repayment(0.20, 2))
            .unwrap();
        assert_abs_diff_eq!(result.effective_yield, 0.395801, epsilon = 1e-6);
    }

    #[test]
    fn test_early_repayment_can_float_alone() {
        let calc = YieldCalculator::new();
        // Early repayers finish at day 30, before the merchant is paid
        let config = documented_config()
            .with_settlement_delay_days(45)
            .with_early_repayment(0.10, 1);
        let result = calc.compute(&config).unwrap();

        assert!(result.is_float_scenario);
        assert_eq!(result.float_period_days, 0);
        assert_relative_eq!(
            result.capital_deployment_days,
            0.9 * 135.0 + 0.1 * 7.5,
            max_relative = 1e-12
        );
    }
}
