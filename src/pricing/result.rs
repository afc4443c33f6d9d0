//! Yield result record and its revenue/cost breakdown

use serde::{Deserialize, Serialize};

/// Economics of one loan configuration
///
/// Every revenue and cost field is computed independently; `net_profit` is
/// exactly their signed sum, with nothing else folded in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldResult {
    // Echoed inputs
    pub principal: f64,
    pub apr: f64,
    pub settlement_delay_days: u32,

    // Financing
    /// Principal less any installment collected at purchase
    pub capital_at_risk: f64,
    /// First installment collected at purchase, 0 when financed
    pub upfront_payment: f64,
    /// Figures blend a full-term segment with an early-repayment segment
    pub has_early_repayment: bool,

    // Timing
    pub loan_duration_days: u32,
    pub capital_deployment_days: f64,
    pub is_float_scenario: bool,
    pub float_period_days: u32,

    // Revenue
    pub interest_income: f64,
    pub fixed_fee_income: f64,
    pub merchant_commission_income: f64,
    pub late_fee_income: f64,

    // Costs
    pub funding_cost: f64,
    pub expected_credit_loss: f64,

    // Summary
    pub net_profit: f64,
    pub effective_yield: f64,
    pub settlement_delay_benefit: f64,
}

/// One signed entry of the profit waterfall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub label: &'static str,
    /// Positive for revenue, negative for cost
    pub amount: f64,
}

impl YieldResult {
    /// Interest, fees, commission and late fees
    pub fn total_revenue(&self) -> f64 {
        self.interest_income
            + self.fixed_fee_income
            + self.merchant_commission_income
            + self.late_fee_income
    }

    /// Funding cost plus expected credit loss
    pub fn total_cost(&self) -> f64 {
        self.funding_cost + self.expected_credit_loss
    }

    /// Net profit as a fraction of principal (not annualised)
    pub fn profit_margin(&self) -> f64 {
        self.net_profit / self.principal
    }

    /// Capital deployment period in years
    pub fn capital_deployment_years(&self) -> f64 {
        self.capital_deployment_days / crate::loan::DAYS_PER_YEAR
    }

    /// Ordered waterfall entries; their amounts sum to `net_profit`
    pub fn breakdown(&self) -> Vec<LineItem> {
        vec![
            LineItem {
                label: "Interest income",
                amount: self.interest_income,
            },
            LineItem {
                label: "Fixed fee income",
                amount: self.fixed_fee_income,
            },
            LineItem {
                label: "Merchant commission",
                amount: self.merchant_commission_income,
            },
            LineItem {
                label: "Late fee income",
                amount: self.late_fee_income,
            },
            LineItem {
                label: "Funding cost",
                amount: -self.funding_cost,
            },
            LineItem {
                label: "Expected credit loss",
                amount: -self.expected_credit_loss,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> YieldResult {
        YieldResult {
            principal: 200.0,
            apr: 0.3,
            settlement_delay_days: 5,
            capital_at_risk: 200.0,
            upfront_payment: 0.0,
            has_early_repayment: false,
            loan_duration_days: 120,
            capital_deployment_days: 115.0,
            is_float_scenario: false,
            float_period_days: 0,
            interest_income: 10.0,
            fixed_fee_income: 4.0,
            merchant_commission_income: 6.0,
            late_fee_income: 2.5,
            funding_cost: 1.5,
            expected_credit_loss: 9.0,
            net_profit: 12.0,
            effective_yield: 0.19,
            settlement_delay_benefit: 0.01,
        }
    }

    #[test]
    fn test_totals() {
        let result = sample();
        assert_eq!(result.total_revenue(), 22.5);
        assert_eq!(result.total_cost(), 10.5);
        assert_eq!(result.profit_margin(), 0.06);
    }

    #[test]
    fn test_breakdown_signs() {
        let items = sample().breakdown();
        assert_eq!(items.len(), 6);
        assert!(items[..4].iter().all(|i| i.amount >= 0.0));
        assert!(items[4..].iter().all(|i| i.amount <= 0.0));

        let total: f64 = items.iter().map(|i| i.amount).sum();
        assert_eq!(total, 12.0);
    }
}
