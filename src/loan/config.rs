//! Loan configuration record and its constraint table

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Days per year used for every annualisation in the engine
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Smallest installment count a plan may have
pub const MIN_INSTALLMENTS: u32 = 2;

/// Largest installment count a plan may have
pub const MAX_INSTALLMENTS: u32 = 12;

/// Longest merchant settlement delay accepted, in days
pub const MAX_SETTLEMENT_DELAY_DAYS: u32 = 60;

/// Largest share of the portfolio that may repay early
pub const MAX_EARLY_REPAYMENT_RATE: f64 = 0.50;

/// Installment at which early repayers settle when none is given
pub const DEFAULT_EARLY_REPAYMENT_INSTALLMENT: u32 = 3;

fn default_early_repayment_installment() -> u32 {
    DEFAULT_EARLY_REPAYMENT_INSTALLMENT
}

/// Spacing between customer installments
///
/// Serialised as the number of days (30 or 14) so that JSON and CSV inputs
/// carry `installment_frequency_days` exactly as the dashboard sends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum InstallmentFrequency {
    /// Every 30 days
    Monthly,
    /// Every 14 days
    Biweekly,
}

impl InstallmentFrequency {
    /// Days between consecutive installments
    pub fn days(&self) -> u32 {
        match self {
            InstallmentFrequency::Monthly => 30,
            InstallmentFrequency::Biweekly => 14,
        }
    }

    /// Lowercase name for display
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallmentFrequency::Monthly => "monthly",
            InstallmentFrequency::Biweekly => "biweekly",
        }
    }
}

impl TryFrom<u32> for InstallmentFrequency {
    type Error = ConfigurationError;

    fn try_from(days: u32) -> Result<Self, Self::Error> {
        match days {
            30 => Ok(InstallmentFrequency::Monthly),
            14 => Ok(InstallmentFrequency::Biweekly),
            other => Err(ConfigurationError::UnsupportedFrequency { days: other }),
        }
    }
}

impl From<InstallmentFrequency> for u32 {
    fn from(frequency: InstallmentFrequency) -> Self {
        frequency.days()
    }
}

/// Input assumptions for pricing a single BNPL plan
///
/// Rates are decimals (0.05 = 5%), never percentages. The record is a plain
/// value: variants are produced with the `with_*` methods, which return a new
/// configuration and leave the original untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanConfiguration {
    /// Purchase amount financed
    pub principal: f64,

    /// Number of customer installments (2-12)
    pub installment_count: u32,

    /// Days between installments
    #[serde(rename = "installment_frequency_days")]
    pub installment_frequency: InstallmentFrequency,

    /// Annual interest rate charged to the customer
    pub apr: f64,

    /// One-off fee as a fraction of principal
    pub fixed_fee_pct: f64,

    /// Fee charged per late installment, in currency units
    pub late_fee_amount: f64,

    /// Fraction of installments paid late
    pub late_installment_pct: f64,

    /// Merchant discount as a fraction of principal
    pub merchant_commission_pct: f64,

    /// Days between purchase and paying the merchant
    pub settlement_delay_days: u32,

    /// Fraction of principal expected to default
    pub default_rate: f64,

    /// Fraction of defaulted principal recovered
    pub recovery_rate: f64,

    /// Annual cost of the capital deployed
    pub funding_cost_apr: f64,

    /// Annualised yield the APR solver aims for
    pub target_yield: f64,

    /// Customer pays the first installment at purchase
    ///
    /// The lender then finances only the remaining installments; merchant
    /// commission and the fixed fee are still charged on the full principal.
    #[serde(default)]
    pub first_installment_upfront: bool,

    /// Share of the portfolio that repays the balance early (0 disables blending)
    #[serde(default)]
    pub early_repayment_rate: f64,

    /// Financed installment at which early repayers settle the balance
    #[serde(default = "default_early_repayment_installment")]
    pub early_repayment_installment: u32,
}

/// Early-repayment segment of a blended portfolio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarlyRepayment {
    /// Share of loans in the segment
    pub share: f64,
    /// Financed installments paid before the balance is settled
    pub installments_paid: u32,
}

impl Default for LoanConfiguration {
    /// Dashboard defaults, with APR clamped to the validated maximum
    fn default() -> Self {
        Self {
            principal: 100.0,
            installment_count: 7,
            installment_frequency: InstallmentFrequency::Biweekly,
            apr: 1.0,
            fixed_fee_pct: 0.0,
            late_fee_amount: 3.0,
            late_installment_pct: 0.20,
            merchant_commission_pct: 0.01,
            settlement_delay_days: 1,
            default_rate: 0.15,
            recovery_rate: 0.10,
            funding_cost_apr: 0.08,
            target_yield: 0.60,
            first_installment_upfront: false,
            early_repayment_rate: 0.0,
            early_repayment_installment: DEFAULT_EARLY_REPAYMENT_INSTALLMENT,
        }
    }
}

/// Check a real-valued field against a closed range
pub(crate) fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ConfigurationError> {
    if !value.is_finite() {
        return Err(ConfigurationError::NotFinite { field });
    }
    if value < min || value > max {
        return Err(ConfigurationError::OutOfRange { field, value, min, max });
    }
    Ok(())
}

impl LoanConfiguration {
    /// Validate every field against the constraint table
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.validate_except_apr()?;
        check_range("apr", self.apr, 0.0, 1.0)
    }

    /// Validate every field except `apr`
    ///
    /// The APR solver searches beyond the customer-facing APR ceiling, so it
    /// checks the rest of the record once and then varies APR freely.
    pub(crate) fn validate_except_apr(&self) -> Result<(), ConfigurationError> {
        if !self.principal.is_finite() {
            return Err(ConfigurationError::NotFinite { field: "principal" });
        }
        if self.principal <= 0.0 {
            return Err(ConfigurationError::OutOfRange {
                field: "principal",
                value: self.principal,
                min: 0.0,
                max: f64::INFINITY,
            });
        }
        check_range(
            "installment_count",
            self.installment_count as f64,
            MIN_INSTALLMENTS as f64,
            MAX_INSTALLMENTS as f64,
        )?;
        check_range("fixed_fee_pct", self.fixed_fee_pct, 0.0, 0.10)?;
        check_range("late_fee_amount", self.late_fee_amount, 0.0, 20.0)?;
        check_range("late_installment_pct", self.late_installment_pct, 0.0, 1.0)?;
        check_range("merchant_commission_pct", self.merchant_commission_pct, 0.0, 0.10)?;
        check_range(
            "settlement_delay_days",
            self.settlement_delay_days as f64,
            0.0,
            MAX_SETTLEMENT_DELAY_DAYS as f64,
        )?;
        check_range("default_rate", self.default_rate, 0.0, 0.30)?;
        check_range("recovery_rate", self.recovery_rate, 0.0, 1.0)?;
        check_range("funding_cost_apr", self.funding_cost_apr, 0.0, 0.20)?;
        check_range("target_yield", self.target_yield, 0.10, 1.00)?;
        check_range(
            "early_repayment_rate",
            self.early_repayment_rate,
            0.0,
            MAX_EARLY_REPAYMENT_RATE,
        )?;
        check_range(
            "early_repayment_installment",
            self.early_repayment_installment as f64,
            1.0,
            MAX_INSTALLMENTS as f64,
        )
    }

    /// Installments the lender finances (one fewer when the first is paid upfront)
    pub fn financed_installments(&self) -> u32 {
        if self.first_installment_upfront {
            self.installment_count - 1
        } else {
            self.installment_count
        }
    }

    /// Customer payment collected at purchase
    pub fn upfront_payment(&self) -> f64 {
        if self.first_installment_upfront {
            self.principal / self.installment_count as f64
        } else {
            0.0
        }
    }

    /// Principal the lender actually puts at risk
    pub fn capital_at_risk(&self) -> f64 {
        if self.first_installment_upfront {
            self.principal - self.upfront_payment()
        } else {
            self.principal
        }
    }

    /// Days from purchase to the last customer payment
    pub fn loan_duration_days(&self) -> u32 {
        self.financed_installments() * self.installment_frequency.days()
    }

    /// The early-repayment segment, if it changes the economics
    ///
    /// `None` when the rate is zero or repayment falls on or after the last
    /// financed installment.
    pub fn early_repayment(&self) -> Option<EarlyRepayment> {
        if self.early_repayment_rate > 0.0
            && self.early_repayment_installment < self.financed_installments()
        {
            Some(EarlyRepayment {
                share: self.early_repayment_rate,
                installments_paid: self.early_repayment_installment,
            })
        } else {
            None
        }
    }

    /// Copy with a different principal
    pub fn with_principal(self, principal: f64) -> Self {
        Self { principal, ..self }
    }

    /// Copy with a different installment count
    pub fn with_installment_count(self, installment_count: u32) -> Self {
        Self {
            installment_count,
            ..self
        }
    }

    /// Copy with a different installment frequency
    pub fn with_frequency(self, installment_frequency: InstallmentFrequency) -> Self {
        Self {
            installment_frequency,
            ..self
        }
    }

    /// Copy with a different APR
    pub fn with_apr(self, apr: f64) -> Self {
        Self { apr, ..self }
    }

    /// Copy with a different fixed fee
    pub fn with_fixed_fee_pct(self, fixed_fee_pct: f64) -> Self {
        Self {
            fixed_fee_pct,
            ..self
        }
    }

    /// Copy with a different late fee amount and late share
    pub fn with_late_fees(self, late_fee_amount: f64, late_installment_pct: f64) -> Self {
        Self {
            late_fee_amount,
            late_installment_pct,
            ..self
        }
    }

    /// Copy with a different merchant commission
    pub fn with_merchant_commission_pct(self, merchant_commission_pct: f64) -> Self {
        Self {
            merchant_commission_pct,
            ..self
        }
    }

    /// Copy with a different settlement delay
    pub fn with_settlement_delay_days(self, settlement_delay_days: u32) -> Self {
        Self {
            settlement_delay_days,
            ..self
        }
    }

    /// Copy with a different default rate
    pub fn with_default_rate(self, default_rate: f64) -> Self {
        Self {
            default_rate,
            ..self
        }
    }

    /// Copy with a different recovery rate
    pub fn with_recovery_rate(self, recovery_rate: f64) -> Self {
        Self {
            recovery_rate,
            ..self
        }
    }

    /// Copy with a different funding cost
    pub fn with_funding_cost_apr(self, funding_cost_apr: f64) -> Self {
        Self {
            funding_cost_apr,
            ..self
        }
    }

    /// Copy with a different target yield
    pub fn with_target_yield(self, target_yield: f64) -> Self {
        Self {
            target_yield,
            ..self
        }
    }

    /// Copy with the first installment collected at purchase, or not
    pub fn with_first_installment_upfront(self, first_installment_upfront: bool) -> Self {
        Self {
            first_installment_upfront,
            ..self
        }
    }

    /// Copy with an early-repayment segment of `rate` settling at `installment`
    pub fn with_early_repayment(
        self,
        early_repayment_rate: f64,
        early_repayment_installment: u32,
    ) -> Self {
        Self {
            early_repayment_rate,
            early_repayment_installment,
            ..self
        }
    }
}
