//! Flat sweep rows for charting and CSV export

use crate::error::Result;
use super::sweep::SweepPoint;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// One sweep point flattened to scalar columns
///
/// The solver columns are empty for effective-yield sweeps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    pub value: f64,
    pub effective_yield: f64,
    pub net_profit: f64,
    pub capital_deployment_days: f64,
    pub is_float_scenario: bool,
    pub required_apr: Option<f64>,
    pub converged: Option<bool>,
}

impl From<&SweepPoint> for SweepRow {
    fn from(point: &SweepPoint) -> Self {
        Self {
            value: point.value,
            effective_yield: point.result.effective_yield,
            net_profit: point.result.net_profit,
            capital_deployment_days: point.result.capital_deployment_days,
            is_float_scenario: point.result.is_float_scenario,
            required_apr: point.solution.map(|solution| solution.apr),
            converged: point.solution.map(|solution| solution.converged),
        }
    }
}

/// Write sweep points as CSV, one row per point, with a header
pub fn write_sweep_csv<W: Write>(points: &[SweepPoint], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for point in points {
        csv_writer.serialize(SweepRow::from(point))?;
    }
    csv_writer.flush()?;
    Ok(())
}
