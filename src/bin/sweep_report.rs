//! Write every standard dashboard sweep to CSV
//!
//! One file per (parameter, metric) pair under `SWEEP_OUTPUT_DIR`
//! (default `sweeps/`). The base configuration is read from the JSON file in
//! `LOAN_CONFIG` when set, otherwise the defaults are used.
//! Supports a JSON summary via --json flag

use anyhow::{Context, Result};
use bnpl_pricing::loan::load_configuration;
use bnpl_pricing::sensitivity::write_sweep_csv;
use bnpl_pricing::{
    LoanConfiguration, SensitivitySweepGenerator, SweepMetric, SweepParameter, SweepPoint,
};
use rayon::prelude::*;
use serde::Serialize;
use std::env;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Serialize)]
struct SweepSummary {
    parameter: &'static str,
    metric: &'static str,
    points: usize,
    float_points: usize,
    unconverged_points: usize,
    min_metric: Option<f64>,
    max_metric: Option<f64>,
    file: PathBuf,
}

#[derive(Debug, Serialize)]
struct ReportResponse {
    base_configuration: LoanConfiguration,
    sweeps: Vec<SweepSummary>,
    execution_time_ms: u64,
}

fn main() -> Result<()> {
    env_logger::init();

    let json_output = env::args().any(|arg| arg == "--json");
    let start = Instant::now();

    let output_dir =
        PathBuf::from(env::var("SWEEP_OUTPUT_DIR").unwrap_or_else(|_| "sweeps".to_string()));
    let base = match env::var("LOAN_CONFIG") {
        Ok(path) => {
            load_configuration(&path).with_context(|| format!("Failed to load {}", path))?
        }
        Err(_) => LoanConfiguration::default(),
    };

    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    // APR itself has no required-APR sweep
    let jobs: Vec<(SweepParameter, SweepMetric)> = SweepParameter::ALL
        .iter()
        .flat_map(|&parameter| {
            let metrics: &[SweepMetric] = if parameter == SweepParameter::Apr {
                &[SweepMetric::EffectiveYield]
            } else {
                &[SweepMetric::EffectiveYield, SweepMetric::RequiredApr]
            };
            metrics.iter().map(move |&metric| (parameter, metric))
        })
        .collect();

    if !json_output {
        println!("Running {} sweeps into {}...", jobs.len(), output_dir.display());
    }

    let generator = SensitivitySweepGenerator::default();
    let summaries = jobs
        .par_iter()
        .map(|&(parameter, metric)| run_sweep(&generator, &base, parameter, metric, &output_dir))
        .collect::<Result<Vec<_>>>()?;

    let execution_time_ms = start.elapsed().as_millis() as u64;

    if json_output {
        let response = ReportResponse {
            base_configuration: base,
            sweeps: summaries,
            execution_time_ms,
        };
        println!("{}", serde_json::to_string(&response)?);
    } else {
        println!();
        println!(
            "{:<26} {:<16} {:>6} {:>6} {:>6} {:>10} {:>10}",
            "Parameter", "Metric", "Points", "Float", "Unconv", "Min", "Max"
        );
        println!("{}", "-".repeat(86));
        for summary in &summaries {
            println!(
                "{:<26} {:<16} {:>6} {:>6} {:>6} {:>10} {:>10}",
                summary.parameter,
                summary.metric,
                summary.points,
                summary.float_points,
                summary.unconverged_points,
                format_metric(summary.min_metric),
                format_metric(summary.max_metric)
            );
        }
        println!("\nCompleted in {:?}", start.elapsed());
    }

    Ok(())
}

fn run_sweep(
    generator: &SensitivitySweepGenerator,
    base: &LoanConfiguration,
    parameter: SweepParameter,
    metric: SweepMetric,
    output_dir: &Path,
) -> Result<SweepSummary> {
    let points: Vec<SweepPoint> = generator
        .standard_sweep(base, parameter, metric)
        .with_context(|| format!("Cannot sweep {} for {}", parameter.field(), metric.as_str()))?
        .collect();

    let file = output_dir.join(format!("{}_{}.csv", parameter.field(), metric.as_str()));
    let writer = BufWriter::new(
        File::create(&file).with_context(|| format!("Unable to create {}", file.display()))?,
    );
    write_sweep_csv(&points, writer)?;

    let metric_values: Vec<f64> = points.iter().filter_map(|p| p.metric_value(metric)).collect();
    log::debug!("Wrote {} points to {}", points.len(), file.display());

    Ok(SweepSummary {
        parameter: parameter.field(),
        metric: metric.as_str(),
        points: points.len(),
        float_points: points.iter().filter(|p| p.result.is_float_scenario).count(),
        unconverged_points: points.len() - metric_values.len(),
        min_metric: metric_values.iter().copied().reduce(f64::min),
        max_metric: metric_values.iter().copied().reduce(f64::max),
        file,
    })
}

fn format_metric(value: Option<f64>) -> String {
    value.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "-".to_string())
}
