//! Swept parameters, sweep metrics and the standard dashboard ranges

use crate::error::ConfigurationError;
use crate::loan::{
    check_range, LoanConfiguration, MAX_EARLY_REPAYMENT_RATE, MAX_INSTALLMENTS,
    MAX_SETTLEMENT_DELAY_DAYS, MIN_INSTALLMENTS,
};
use serde::{Deserialize, Serialize};

/// A single configuration field varied by a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepParameter {
    DefaultRate,
    InstallmentCount,
    MerchantCommission,
    SettlementDelayDays,
    Apr,
    FixedFee,
    LateFeeAmount,
    RecoveryRate,
    FundingCost,
    EarlyRepaymentRate,
}

impl SweepParameter {
    /// Every parameter, in dashboard order
    pub const ALL: [SweepParameter; 10] = [
        SweepParameter::DefaultRate,
        SweepParameter::InstallmentCount,
        SweepParameter::MerchantCommission,
        SweepParameter::SettlementDelayDays,
        SweepParameter::Apr,
        SweepParameter::FixedFee,
        SweepParameter::LateFeeAmount,
        SweepParameter::RecoveryRate,
        SweepParameter::FundingCost,
        SweepParameter::EarlyRepaymentRate,
    ];

    /// Name of the configuration field this parameter substitutes
    pub fn field(&self) -> &'static str {
        match self {
            SweepParameter::DefaultRate => "default_rate",
            SweepParameter::InstallmentCount => "installment_count",
            SweepParameter::MerchantCommission => "merchant_commission_pct",
            SweepParameter::SettlementDelayDays => "settlement_delay_days",
            SweepParameter::Apr => "apr",
            SweepParameter::FixedFee => "fixed_fee_pct",
            SweepParameter::LateFeeAmount => "late_fee_amount",
            SweepParameter::RecoveryRate => "recovery_rate",
            SweepParameter::FundingCost => "funding_cost_apr",
            SweepParameter::EarlyRepaymentRate => "early_repayment_rate",
        }
    }

    /// Axis label for charts and report headers
    pub fn label(&self) -> &'static str {
        match self {
            SweepParameter::DefaultRate => "Default rate",
            SweepParameter::InstallmentCount => "Number of installments",
            SweepParameter::MerchantCommission => "Merchant commission",
            SweepParameter::SettlementDelayDays => "Settlement delay (days)",
            SweepParameter::Apr => "APR",
            SweepParameter::FixedFee => "Fixed fee",
            SweepParameter::LateFeeAmount => "Late fee amount",
            SweepParameter::RecoveryRate => "Recovery rate",
            SweepParameter::FundingCost => "Funding cost",
            SweepParameter::EarlyRepaymentRate => "Early repayment rate",
        }
    }

    /// Whether the parameter only takes whole-number values
    pub fn is_integer(&self) -> bool {
        matches!(self, SweepParameter::InstallmentCount | SweepParameter::SettlementDelayDays)
    }

    /// Copy of `config` with this parameter set to `value`
    ///
    /// Integer parameters reject fractional values. The rest of the constraint
    /// table is left to the caller's validation.
    pub fn apply(
        &self,
        config: &LoanConfiguration,
        value: f64,
    ) -> Result<LoanConfiguration, ConfigurationError> {
        let config = *config;
        let updated = match self {
            SweepParameter::DefaultRate => config.with_default_rate(value),
            SweepParameter::InstallmentCount => {
                config.with_installment_count(whole_number(self.field(), value)?)
            }
            SweepParameter::MerchantCommission => config.with_merchant_commission_pct(value),
            SweepParameter::SettlementDelayDays => {
                config.with_settlement_delay_days(whole_number(self.field(), value)?)
            }
            SweepParameter::Apr => config.with_apr(value),
            SweepParameter::FixedFee => config.with_fixed_fee_pct(value),
            SweepParameter::LateFeeAmount => {
                config.with_late_fees(value, config.late_installment_pct)
            }
            SweepParameter::RecoveryRate => config.with_recovery_rate(value),
            SweepParameter::FundingCost => config.with_funding_cost_apr(value),
            SweepParameter::EarlyRepaymentRate => {
                config.with_early_repayment(value, config.early_repayment_installment)
            }
        };
        Ok(updated)
    }

    /// Dashboard range for this parameter, limited to valid values
    pub fn standard_range(&self) -> Vec<f64> {
        match self {
            SweepParameter::DefaultRate => linspace(0.0, 0.30, 30),
            SweepParameter::InstallmentCount => int_range(MIN_INSTALLMENTS, MAX_INSTALLMENTS, 1),
            SweepParameter::MerchantCommission => linspace(0.01, 0.10, 20),
            SweepParameter::SettlementDelayDays => int_range(0, MAX_SETTLEMENT_DELAY_DAYS, 5),
            SweepParameter::Apr => linspace(0.0, 1.0, 30),
            SweepParameter::FixedFee => linspace(0.0, 0.10, 20),
            SweepParameter::LateFeeAmount => linspace(0.0, 10.0, 20),
            SweepParameter::RecoveryRate => linspace(0.0, 1.0, 20),
            SweepParameter::FundingCost => linspace(0.0, 0.20, 20),
            SweepParameter::EarlyRepaymentRate => linspace(0.0, MAX_EARLY_REPAYMENT_RATE, 20),
        }
    }
}

fn whole_number(field: &'static str, value: f64) -> Result<u32, ConfigurationError> {
    check_range(field, value, 0.0, u32::MAX as f64)?;
    if value.fract() != 0.0 {
        return Err(ConfigurationError::NotWholeNumber { field, value });
    }
    Ok(value as u32)
}

/// What each sweep point reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepMetric {
    /// Effective yield at the configured APR
    #[default]
    EffectiveYield,
    /// APR needed to reach the configuration's target yield
    RequiredApr,
}

impl SweepMetric {
    /// Snake-case name used in file names and CSV output
    pub fn as_str(&self) -> &'static str {
        match self {
            SweepMetric::EffectiveYield => "effective_yield",
            SweepMetric::RequiredApr => "required_apr",
        }
    }
}

/// `count` evenly spaced values from `start` to `end` inclusive
///
/// The last value is `end` exactly, so a range ending on a field's upper
/// bound stays valid.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let last = count - 1;
            (0..count)
                .map(|i| {
                    if i == last {
                        end
                    } else {
                        start + (end - start) * i as f64 / last as f64
                    }
                })
                .collect()
        }
    }
}

/// Whole numbers from `start` to `end` inclusive in steps of `step`
///
/// A zero step is treated as 1.
pub fn int_range(start: u32, end: u32, step: u32) -> Vec<f64> {
    (start..=end).step_by(step.max(1) as usize).map(f64::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace_endpoints() {
        let values = linspace(0.0, 0.30, 30);
        assert_eq!(values.len(), 30);
        assert_eq!(values[0], 0.0);
        assert_eq!(values[29], 0.30);
        assert!(values.windows(2).all(|w| w[0] < w[1]));

        assert!(linspace(1.0, 2.0, 0).is_empty());
        assert_eq!(linspace(1.0, 2.0, 1), vec![1.0]);
    }

    #[test]
    fn test_int_range() {
        assert_eq!(int_range(0, 60, 5).len(), 13);
        assert_eq!(int_range(2, 12, 1).last(), Some(&12.0));
        assert_eq!(int_range(3, 5, 0), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_apply_substitutes_one_field() {
        let base = LoanConfiguration::default();
        let swept = SweepParameter::MerchantCommission.apply(&base, 0.07).unwrap();
        assert_eq!(swept, base.with_merchant_commission_pct(0.07));

        let late = SweepParameter::LateFeeAmount.apply(&base, 8.0).unwrap();
        assert_eq!(late.late_fee_amount, 8.0);
        assert_eq!(late.late_installment_pct, base.late_installment_pct);

        let early = SweepParameter::EarlyRepaymentRate.apply(&base, 0.25).unwrap();
        assert_eq!(early.early_repayment_rate, 0.25);
        assert_eq!(early.early_repayment_installment, base.early_repayment_installment);
    }

    #[test]
    fn test_integer_parameters_reject_fractions() {
        let base = LoanConfiguration::default();
        assert_eq!(
            SweepParameter::InstallmentCount.apply(&base, 2.5),
            Err(ConfigurationError::NotWholeNumber { field: "installment_count", value: 2.5 })
        );
        let err = SweepParameter::SettlementDelayDays.apply(&base, -5.0).unwrap_err();
        assert_eq!(err.field(), "settlement_delay_days");

        let swept = SweepParameter::InstallmentCount.apply(&base, 9.0).unwrap();
        assert_eq!(swept.installment_count, 9);
    }

    #[test]
    fn test_standard_ranges_are_valid() {
        let base = LoanConfiguration::default();
        for parameter in SweepParameter::ALL {
            for value in parameter.standard_range() {
                let config = parameter.apply(&base, value).unwrap();
                assert!(config.validate().is_ok(), "{} = {} rejected", parameter.field(), value);
            }
        }
    }
}
