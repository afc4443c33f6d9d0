//! Sensitivity sweeps across one input parameter at a time

mod parameter;
mod report;
mod sweep;

pub use parameter::{int_range, linspace, SweepMetric, SweepParameter};
pub use report::{write_sweep_csv, SweepRow};
pub use sweep::{SensitivitySweepGenerator, Sweep, SweepPoint};
