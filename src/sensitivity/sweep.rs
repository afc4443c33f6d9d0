//! Sensitivity sweeps
//!
//! A sweep holds one base configuration and a range of values for a single
//! parameter. Every substituted configuration is validated when the sweep is
//! built, so iterating it never fails. Points are independent of each other:
//! a sweep can be cloned and replayed, or collected in parallel with the
//! output kept in range order.

use crate::error::ConfigurationError;
use crate::loan::LoanConfiguration;
use crate::pricing::{AprSolution, AprSolver, YieldCalculator, YieldResult};
use super::parameter::{SweepMetric, SweepParameter};
use rayon::prelude::*;
use serde::Serialize;

/// One evaluated point of a sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepPoint {
    /// Value substituted for the swept parameter
    pub value: f64,

    /// Yield result at the configured APR, or at the solved APR for a
    /// required-APR sweep
    pub result: YieldResult,

    /// Solver output, present only for required-APR sweeps
    pub solution: Option<AprSolution>,
}

impl SweepPoint {
    /// The plotted quantity for `metric`
    ///
    /// `None` for a required-APR point whose solve did not converge.
    pub fn metric_value(&self, metric: SweepMetric) -> Option<f64> {
        match metric {
            SweepMetric::EffectiveYield => Some(self.result.effective_yield),
            SweepMetric::RequiredApr => self
                .solution
                .filter(|solution| solution.converged)
                .map(|solution| solution.apr),
        }
    }
}

/// Builds sweeps over a shared calculator and solver
#[derive(Debug, Clone, Copy, Default)]
pub struct SensitivitySweepGenerator {
    calculator: YieldCalculator,
    solver: AprSolver,
}

impl SensitivitySweepGenerator {
    /// Create a generator from a calculator and the solver for required-APR sweeps
    pub fn new(calculator: YieldCalculator, solver: AprSolver) -> Self {
        Self { calculator, solver }
    }

    /// Effective yield as `parameter` takes each of `values`
    pub fn sweep(
        &self,
        config: &LoanConfiguration,
        parameter: SweepParameter,
        values: &[f64],
    ) -> Result<Sweep, ConfigurationError> {
        self.sweep_with_metric(config, parameter, SweepMetric::EffectiveYield, values)
    }

    /// Sweep reporting `metric` at each value
    ///
    /// For [`SweepMetric::RequiredApr`] each point solves for the
    /// configuration's `target_yield`; the configured APR is ignored and APR
    /// itself cannot be the swept parameter.
    pub fn sweep_with_metric(
        &self,
        config: &LoanConfiguration,
        parameter: SweepParameter,
        metric: SweepMetric,
        values: &[f64],
    ) -> Result<Sweep, ConfigurationError> {
        if metric == SweepMetric::RequiredApr && parameter == SweepParameter::Apr {
            return Err(ConfigurationError::UnsupportedSweep {
                parameter: parameter.field(),
                metric: metric.as_str(),
            });
        }

        let points = values
            .iter()
            .map(|&value| {
                let swept = parameter.apply(config, value)?;
                match metric {
                    SweepMetric::EffectiveYield => swept.validate()?,
                    SweepMetric::RequiredApr => swept.validate_except_apr()?,
                }
                Ok((value, swept))
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;

        log::debug!(
            "Built {} sweep over {} with {} points",
            metric.as_str(),
            parameter.field(),
            points.len()
        );

        Ok(Sweep {
            calculator: self.calculator,
            solver: self.solver,
            parameter,
            metric,
            points,
            position: 0,
        })
    }

    /// Sweep over the parameter's standard dashboard range
    pub fn standard_sweep(
        &self,
        config: &LoanConfiguration,
        parameter: SweepParameter,
        metric: SweepMetric,
    ) -> Result<Sweep, ConfigurationError> {
        self.sweep_with_metric(config, parameter, metric, &parameter.standard_range())
    }
}

/// Lazy, replayable sequence of sweep points
#[derive(Debug, Clone)]
pub struct Sweep {
    calculator: YieldCalculator,
    solver: AprSolver,
    parameter: SweepParameter,
    metric: SweepMetric,
    points: Vec<(f64, LoanConfiguration)>,
    position: usize,
}

impl Sweep {
    /// Field being swept
    pub fn parameter(&self) -> SweepParameter {
        self.parameter
    }

    /// Quantity reported at each point
    pub fn metric(&self) -> SweepMetric {
        self.metric
    }

    /// Swept values not yet yielded
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points[self.position..].iter().map(|(value, _)| *value)
    }

    /// Evaluate the remaining points on the rayon pool, in range order
    pub fn par_collect(&self) -> Vec<SweepPoint> {
        self.points[self.position..]
            .par_iter()
            .map(|(value, config)| self.evaluate(*value, config))
            .collect()
    }

    fn evaluate(&self, value: f64, config: &LoanConfiguration) -> SweepPoint {
        match self.metric {
            SweepMetric::EffectiveYield => SweepPoint {
                value,
                result: self.calculator.evaluate(config),
                solution: None,
            },
            SweepMetric::RequiredApr => {
                let solution = self.solver.solve_unchecked(config, config.target_yield);
                SweepPoint {
                    value,
                    result: solution.result,
                    solution: Some(solution),
                }
            }
        }
    }
}

impl Iterator for Sweep {
    type Item = SweepPoint;

    fn next(&mut self) -> Option<SweepPoint> {
        let (value, config) = *self.points.get(self.position)?;
        self.position += 1;
        Some(self.evaluate(value, &config))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.points.len() - self.position;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Sweep {}
