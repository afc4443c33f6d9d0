//! Pricing engine for BNPL loans
//!
//! - **engine**: effective yield of one configuration, including the
//!   settlement-delay benefit and the float scenario
//! - **solver**: APR required for a target yield
//! - **cap**: longest interest-free plan that stays profitable

mod engine;
mod result;
mod solver;
mod cap;

pub use engine::{
    DeploymentWindow, EngineSettings, InterestMethod, YieldCalculator, DEFAULT_FLOAT_PROXY_FRACTION,
};
pub use result::{LineItem, YieldResult};
pub use solver::{
    AprSolution, AprSolver, SolverSettings, DEFAULT_APR_UPPER_BOUND, DEFAULT_MAX_ITERATIONS,
    DEFAULT_TOLERANCE,
};
pub use cap::InterestFreeCapEstimator;
