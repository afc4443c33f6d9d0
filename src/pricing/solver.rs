//! Required-APR solver
//!
//! Finds the APR at which a configuration earns a target effective yield by
//! bisection. Only interest income depends on APR and it rises with APR, so
//! effective yield is monotonically non-decreasing in APR and a bracketed
//! target is always found.

use crate::error::ConfigurationError;
use crate::loan::LoanConfiguration;
use super::engine::YieldCalculator;
use super::result::YieldResult;
use serde::{Deserialize, Serialize};

/// Default upper APR bound searched (200%)
pub const DEFAULT_APR_UPPER_BOUND: f64 = 2.0;

/// Default relative yield tolerance
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Default iteration cap
pub const DEFAULT_MAX_ITERATIONS: u32 = 60;

/// Absolute floor for the yield gap tolerance when the target is near zero
const MIN_ABS_TOLERANCE: f64 = 1e-12;

/// Search bounds and stopping rules for the solver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Highest APR considered
    pub upper_bound: f64,

    /// Yield gap tolerance, relative to the target
    pub tolerance: f64,

    /// Bisection steps before giving up
    pub max_iterations: u32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            upper_bound: DEFAULT_APR_UPPER_BOUND,
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SolverSettings {
    /// Reject a non-positive bound or tolerance and a zero iteration cap
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        crate::loan::check_range("upper_bound", self.upper_bound, f64::MIN_POSITIVE, f64::MAX)?;
        crate::loan::check_range("tolerance", self.tolerance, f64::MIN_POSITIVE, 1.0)?;
        if self.max_iterations == 0 {
            return Err(ConfigurationError::OutOfRange {
                field: "max_iterations",
                value: 0.0,
                min: 1.0,
                max: u32::MAX as f64,
            });
        }
        Ok(())
    }
}

/// Outcome of an APR solve
///
/// When `converged` is false the target could not be bracketed (or the
/// iteration cap was hit) and `apr` is the nearest boundary or last midpoint;
/// it must not be presented as the required APR.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AprSolution {
    /// Required APR, or the fallback described above
    pub apr: f64,
    /// Effective yield at `apr`
    pub achieved_yield: f64,
    pub converged: bool,
    /// Bisection steps taken (0 when the answer is a bound)
    pub iterations: u32,
    /// Full result at the returned APR
    pub result: YieldResult,
}

/// Bisection solver for the APR that hits a target yield
#[derive(Debug, Clone, Copy, Default)]
pub struct AprSolver {
    calculator: YieldCalculator,
    settings: SolverSettings,
}

impl AprSolver {
    /// Create a solver with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a solver around a calculator with custom search settings
    pub fn with_settings(
        calculator: YieldCalculator,
        settings: SolverSettings,
    ) -> Result<Self, ConfigurationError> {
        settings.validate()?;
        Ok(Self { calculator, settings })
    }

    /// Search settings this solver was built with
    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Solve for the configuration's own `target_yield`
    pub fn solve_for_target(
        &self,
        config: &LoanConfiguration,
    ) -> Result<AprSolution, ConfigurationError> {
        self.solve(config, config.target_yield)
    }

    /// Solve for the APR that makes effective yield equal `target_yield`
    ///
    /// The configuration's `apr` is ignored. Every other field must be valid.
    /// An unreachable target is not an error: the nearest bound is returned
    /// with `converged = false`.
    pub fn solve(
        &self,
        config: &LoanConfiguration,
        target_yield: f64,
    ) -> Result<AprSolution, ConfigurationError> {
        config.validate_except_apr()?;
        if !target_yield.is_finite() {
            return Err(ConfigurationError::NotFinite { field: "target_yield" });
        }
        Ok(self.solve_unchecked(config, target_yield))
    }

    /// Bisection over a configuration already validated except for APR
    pub(crate) fn solve_unchecked(
        &self,
        config: &LoanConfiguration,
        target_yield: f64,
    ) -> AprSolution {
        let gap_tolerance = (self.settings.tolerance * target_yield.abs()).max(MIN_ABS_TOLERANCE);
        let evaluate = |apr: f64| self.calculator.evaluate(&config.with_apr(apr));

        let mut apr_low = 0.0_f64;
        let mut apr_high = self.settings.upper_bound;

        let at_low = evaluate(apr_low);
        if (at_low.effective_yield - target_yield).abs() <= gap_tolerance {
            return solution(at_low, true, 0);
        }
        if at_low.effective_yield > target_yield {
            log::warn!(
                "Target yield {:.4} below yield {:.4} at zero APR; returning lower bound",
                target_yield,
                at_low.effective_yield
            );
            return solution(at_low, false, 0);
        }

        let at_high = evaluate(apr_high);
        if (at_high.effective_yield - target_yield).abs() <= gap_tolerance {
            return solution(at_high, true, 0);
        }
        if at_high.effective_yield < target_yield {
            log::warn!(
                "Target yield {:.4} above yield {:.4} at APR bound {:.2}; returning upper bound",
                target_yield,
                at_high.effective_yield,
                apr_high
            );
            return solution(at_high, false, 0);
        }

        let mut best = at_low;
        for iteration in 1..=self.settings.max_iterations {
            let apr_mid = (apr_low + apr_high) / 2.0;
            let at_mid = evaluate(apr_mid);
            let gap = at_mid.effective_yield - target_yield;
            best = at_mid;

            if gap.abs() <= gap_tolerance {
                log::debug!(
                    "APR solver converged to {:.6} after {} iterations (gap {:.2e})",
                    apr_mid,
                    iteration,
                    gap
                );
                return solution(at_mid, true, iteration);
            }

            if gap < 0.0 {
                apr_low = apr_mid;
            } else {
                apr_high = apr_mid;
            }
        }

        log::warn!(
            "APR solver hit the {} iteration cap with bracket [{:.8}, {:.8}]",
            self.settings.max_iterations,
            apr_low,
            apr_high
        );
        solution(best, false, self.settings.max_iterations)
    }
}

fn solution(result: YieldResult, converged: bool, iterations: u32) -> AprSolution {
    AprSolution {
        apr: result.apr,
        achieved_yield: result.effective_yield,
        converged,
        iterations,
        result,
    }
}
