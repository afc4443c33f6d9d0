//! BNPL Pricing - yield and rate engine for Buy-Now-Pay-Later installment loans
//!
//! This library provides:
//! - Effective annualised yield on deployed capital, including the merchant
//!   settlement-delay benefit and the float scenario
//! - APR solving for a target yield
//! - Interest-free installment cap estimation
//! - Parameter sensitivity sweeps and interest-bearing vs interest-free comparison
//! - Optional memoization of yield results

pub mod error;
pub mod loan;
pub mod pricing;
pub mod sensitivity;
pub mod comparison;
pub mod cache;

// Re-export commonly used types
pub use error::{ConfigurationError, PricingError};
pub use loan::{InstallmentFrequency, LoanConfiguration};
pub use pricing::{
    AprSolution, AprSolver, EngineSettings, InterestFreeCapEstimator, InterestMethod,
    SolverSettings, YieldCalculator, YieldResult,
};
pub use sensitivity::{SensitivitySweepGenerator, SweepMetric, SweepParameter, SweepPoint};
pub use comparison::{Comparison, ComparisonEngine};
pub use cache::YieldCache;
