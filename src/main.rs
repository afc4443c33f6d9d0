//! BNPL Pricing CLI
//!
//! Command-line front end for quoting, APR solving, interest-free caps,
//! sensitivity sweeps and plan comparison.

use anyhow::{Context, Result};
use bnpl_pricing::loan::{load_configuration, load_configurations_csv};
use bnpl_pricing::pricing::LineItem;
use bnpl_pricing::sensitivity::{write_sweep_csv, SweepRow};
use bnpl_pricing::{
    AprSolution, AprSolver, Comparison, ComparisonEngine, EngineSettings, InstallmentFrequency,
    InterestFreeCapEstimator, InterestMethod, LoanConfiguration, SensitivitySweepGenerator,
    SolverSettings, SweepMetric, SweepParameter, YieldCalculator, YieldResult,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bnpl", version, about = "Yield and rate engine for Buy-Now-Pay-Later loans")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, value_enum, default_value = "json", global = true)]
    format: OutputFormat,

    /// Interest income approximation
    #[arg(long, value_enum, default_value = "declining-balance", global = true)]
    interest_method: InterestMethodArg,

    /// Share of loan duration used as deployment window in a float scenario
    #[arg(long, global = true)]
    float_proxy_fraction: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Yield, profit and line items for one configuration
    Quote(LoanArgs),
    /// APR required to reach the configuration's target yield
    SolveApr {
        #[command(flatten)]
        loan: LoanArgs,
        /// Highest APR searched
        #[arg(long)]
        upper_bound: Option<f64>,
        /// Relative yield tolerance
        #[arg(long)]
        tolerance: Option<f64>,
        #[arg(long)]
        max_iterations: Option<u32>,
    },
    /// Longest interest-free plan that stays profitable
    Cap {
        #[command(flatten)]
        loan: LoanArgs,
        /// Require the target yield instead of break-even
        #[arg(long)]
        for_target: bool,
    },
    /// Vary one parameter across a range
    Sweep {
        #[command(flatten)]
        loan: LoanArgs,
        #[arg(long, value_enum)]
        parameter: ParameterArg,
        #[arg(long, value_enum, default_value = "yield")]
        metric: MetricArg,
        /// Comma-separated values; the standard range when omitted
        #[arg(long, value_delimiter = ',')]
        values: Vec<f64>,
    },
    /// Interest-bearing plan against the same plan at zero APR
    Compare(LoanArgs),
    /// Quote every configuration in a CSV file
    Batch {
        /// CSV file, one configuration per row
        input: PathBuf,
    },
}

/// Configuration source plus per-field overrides
#[derive(Args)]
struct LoanArgs {
    /// JSON configuration file (defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    principal: Option<f64>,
    #[arg(long)]
    installments: Option<u32>,
    #[arg(long, value_enum)]
    frequency: Option<FrequencyArg>,
    #[arg(long)]
    apr: Option<f64>,
    #[arg(long)]
    fixed_fee: Option<f64>,
    #[arg(long)]
    late_fee: Option<f64>,
    /// Fraction of installments paid late
    #[arg(long)]
    late_pct: Option<f64>,
    #[arg(long)]
    commission: Option<f64>,
    #[arg(long)]
    settlement_delay: Option<u32>,
    #[arg(long)]
    default_rate: Option<f64>,
    #[arg(long)]
    recovery_rate: Option<f64>,
    #[arg(long)]
    funding_cost: Option<f64>,
    #[arg(long)]
    target_yield: Option<f64>,
    /// Collect the first installment at purchase
    #[arg(long)]
    first_installment_upfront: bool,
    /// Share of loans repaid early (0 to 0.5)
    #[arg(long)]
    early_repayment_rate: Option<f64>,
    /// Installment at which early repayers settle
    #[arg(long)]
    early_repayment_installment: Option<u32>,
}

impl LoanArgs {
    fn resolve(&self) -> Result<LoanConfiguration> {
        let mut config = match &self.config {
            Some(path) => load_configuration(path).with_context(|| {
                format!("Failed to load configuration from {}", path.display())
            })?,
            None => LoanConfiguration::default(),
        };

        if let Some(v) = self.principal {
            config.principal = v;
        }
        if let Some(v) = self.installments {
            config.installment_count = v;
        }
        if let Some(v) = self.frequency {
            config.installment_frequency = v.into();
        }
        if let Some(v) = self.apr {
            config.apr = v;
        }
        if let Some(v) = self.fixed_fee {
            config.fixed_fee_pct = v;
        }
        if let Some(v) = self.late_fee {
            config.late_fee_amount = v;
        }
        if let Some(v) = self.late_pct {
            config.late_installment_pct = v;
        }
        if let Some(v) = self.commission {
            config.merchant_commission_pct = v;
        }
        if let Some(v) = self.settlement_delay {
            config.settlement_delay_days = v;
        }
        if let Some(v) = self.default_rate {
            config.default_rate = v;
        }
        if let Some(v) = self.recovery_rate {
            config.recovery_rate = v;
        }
        if let Some(v) = self.funding_cost {
            config.funding_cost_apr = v;
        }
        if let Some(v) = self.target_yield {
            config.target_yield = v;
        }
        if self.first_installment_upfront {
            config.first_installment_upfront = true;
        }
        if let Some(v) = self.early_repayment_rate {
            config.early_repayment_rate = v;
        }
        if let Some(v) = self.early_repayment_installment {
            config.early_repayment_installment = v;
        }

        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
    Csv,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FrequencyArg {
    Monthly,
    Biweekly,
}

impl From<FrequencyArg> for InstallmentFrequency {
    fn from(arg: FrequencyArg) -> Self {
        match arg {
            FrequencyArg::Monthly => InstallmentFrequency::Monthly,
            FrequencyArg::Biweekly => InstallmentFrequency::Biweekly,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InterestMethodArg {
    DecliningBalance,
    HalfRateSimple,
}

impl From<InterestMethodArg> for InterestMethod {
    fn from(arg: InterestMethodArg) -> Self {
        match arg {
            InterestMethodArg::DecliningBalance => InterestMethod::DecliningBalance,
            InterestMethodArg::HalfRateSimple => InterestMethod::HalfRateSimple,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ParameterArg {
    DefaultRate,
    Installments,
    Commission,
    SettlementDelay,
    Apr,
    FixedFee,
    LateFee,
    RecoveryRate,
    FundingCost,
    EarlyRepayment,
}

impl From<ParameterArg> for SweepParameter {
    fn from(arg: ParameterArg) -> Self {
        match arg {
            ParameterArg::DefaultRate => SweepParameter::DefaultRate,
            ParameterArg::Installments => SweepParameter::InstallmentCount,
            ParameterArg::Commission => SweepParameter::MerchantCommission,
            ParameterArg::SettlementDelay => SweepParameter::SettlementDelayDays,
            ParameterArg::Apr => SweepParameter::Apr,
            ParameterArg::FixedFee => SweepParameter::FixedFee,
            ParameterArg::LateFee => SweepParameter::LateFeeAmount,
            ParameterArg::RecoveryRate => SweepParameter::RecoveryRate,
            ParameterArg::FundingCost => SweepParameter::FundingCost,
            ParameterArg::EarlyRepayment => SweepParameter::EarlyRepaymentRate,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MetricArg {
    Yield,
    RequiredApr,
}

impl From<MetricArg> for SweepMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Yield => SweepMetric::EffectiveYield,
            MetricArg::RequiredApr => SweepMetric::RequiredApr,
        }
    }
}

#[derive(Debug, Serialize)]
struct CapReport {
    criterion: &'static str,
    target_yield: Option<f64>,
    max_interest_free_installments: Option<u32>,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let mut settings = EngineSettings {
        interest_method: cli.interest_method.into(),
        ..Default::default()
    };
    if let Some(fraction) = cli.float_proxy_fraction {
        settings.float_proxy_fraction = fraction;
    }
    let calculator =
        YieldCalculator::with_settings(settings).context("Invalid engine settings")?;

    match &cli.command {
        Commands::Quote(loan) => {
            let config = loan.resolve()?;
            let result = calculator.compute(&config).context("Configuration rejected")?;
            match cli.format {
                OutputFormat::Json => print_json(&result)?,
                OutputFormat::Table => print_quote_table(&result),
                OutputFormat::Csv => print_csv(&[result])?,
            }
        }
        Commands::SolveApr {
            loan,
            upper_bound,
            tolerance,
            max_iterations,
        } => {
            let config = loan.resolve()?;
            let defaults = SolverSettings::default();
            let solver_settings = SolverSettings {
                upper_bound: upper_bound.unwrap_or(defaults.upper_bound),
                tolerance: tolerance.unwrap_or(defaults.tolerance),
                max_iterations: max_iterations.unwrap_or(defaults.max_iterations),
            };
            let solver = AprSolver::with_settings(calculator, solver_settings)
                .context("Invalid solver settings")?;
            let solution = solver.solve_for_target(&config).context("Configuration rejected")?;
            match cli.format {
                OutputFormat::Json => print_json(&solution)?,
                OutputFormat::Table => print_solution_table(&solution, config.target_yield),
                OutputFormat::Csv => print_field_csv(&[
                    ("target_yield", config.target_yield.to_string()),
                    ("apr", solution.apr.to_string()),
                    ("achieved_yield", solution.achieved_yield.to_string()),
                    ("converged", solution.converged.to_string()),
                    ("iterations", solution.iterations.to_string()),
                ])?,
            }
        }
        Commands::Cap { loan, for_target } => {
            let config = loan.resolve()?;
            let estimator = InterestFreeCapEstimator::new(calculator);
            let report = if *for_target {
                CapReport {
                    criterion: "target_yield",
                    target_yield: Some(config.target_yield),
                    max_interest_free_installments: estimator
                        .max_interest_free_installments_for_target(&config, config.target_yield)
                        .context("Configuration rejected")?,
                }
            } else {
                CapReport {
                    criterion: "break_even",
                    target_yield: None,
                    max_interest_free_installments: estimator
                        .max_interest_free_installments(&config)
                        .context("Configuration rejected")?,
                }
            };
            match cli.format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Table => match report.max_interest_free_installments {
                    Some(count) => println!(
                        "Max interest-free installments ({}): {}",
                        report.criterion, count
                    ),
                    None => println!("No interest-free plan qualifies ({})", report.criterion),
                },
                OutputFormat::Csv => print_csv(&[report])?,
            }
        }
        Commands::Sweep {
            loan,
            parameter,
            metric,
            values,
        } => {
            let config = loan.resolve()?;
            let parameter = SweepParameter::from(*parameter);
            let metric = SweepMetric::from(*metric);
            let values = if values.is_empty() {
                parameter.standard_range()
            } else {
                values.clone()
            };

            let solver = AprSolver::with_settings(calculator, SolverSettings::default())?;
            let generator = SensitivitySweepGenerator::new(calculator, solver);
            let points = generator
                .sweep_with_metric(&config, parameter, metric, &values)
                .with_context(|| format!("Cannot sweep {}", parameter.field()))?
                .par_collect();

            match cli.format {
                OutputFormat::Json => {
                    let rows: Vec<SweepRow> = points.iter().map(SweepRow::from).collect();
                    print_json(&rows)?
                }
                OutputFormat::Table => {
                    println!("{} sweep ({})", parameter.label(), metric.as_str());
                    println!(
                        "{:>12} {:>12} {:>12} {:>8} {:>12}",
                        "Value", "Yield", "Profit", "Float", "Req. APR"
                    );
                    println!("{}", "-".repeat(60));
                    for point in &points {
                        let required = point
                            .metric_value(SweepMetric::RequiredApr)
                            .map(|apr| format!("{:.4}", apr))
                            .unwrap_or_else(|| "-".to_string());
                        println!(
                            "{:>12.4} {:>12.4} {:>12.2} {:>8} {:>12}",
                            point.value,
                            point.result.effective_yield,
                            point.result.net_profit,
                            if point.result.is_float_scenario { "yes" } else { "" },
                            required
                        );
                    }
                }
                OutputFormat::Csv => write_sweep_csv(&points, io::stdout().lock())?,
            }
        }
        Commands::Compare(loan) => {
            let config = loan.resolve()?;
            let comparison = ComparisonEngine::new(calculator)
                .compare_interest_models(&config)
                .context("Configuration rejected")?;
            match cli.format {
                OutputFormat::Json => print_json(&comparison)?,
                OutputFormat::Table => print_comparison_table(&comparison),
                OutputFormat::Csv => print_csv(&[comparison.bearing, comparison.free])?,
            }
        }
        Commands::Batch { input } => {
            let configs = load_configurations_csv(input).with_context(|| {
                format!("Failed to load configurations from {}", input.display())
            })?;
            let results = calculator
                .compute_batch(&configs)
                .into_iter()
                .collect::<Result<Vec<_>, _>>()?;
            log::info!("Quoted {} configurations", results.len());
            match cli.format {
                OutputFormat::Json => print_json(&results)?,
                OutputFormat::Table => {
                    println!(
                        "{:>5} {:>10} {:>6} {:>8} {:>12} {:>10} {:>6}",
                        "Row", "Principal", "APR", "Days", "Net Profit", "Yield", "Float"
                    );
                    println!("{}", "-".repeat(64));
                    for (row, result) in results.iter().enumerate() {
                        println!(
                            "{:>5} {:>10.2} {:>6.2} {:>8} {:>12.4} {:>10.4} {:>6}",
                            row + 1,
                            result.principal,
                            result.apr,
                            result.loan_duration_days,
                            result.net_profit,
                            result.effective_yield,
                            if result.is_float_scenario { "yes" } else { "" }
                        );
                    }
                }
                OutputFormat::Csv => print_csv(&results)?,
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_csv<T: Serialize>(rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout().lock());
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn print_field_csv(fields: &[(&str, String)]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout().lock());
    writer.write_record(["field", "value"])?;
    for (field, value) in fields {
        writer.write_record([*field, value.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_line_items(items: &[LineItem]) {
    for item in items {
        println!("  {:<24} {:>12.4}", item.label, item.amount);
    }
}

fn print_quote_table(result: &YieldResult) {
    println!(
        "Loan: {:.2} over {} days, APR {:.2}%",
        result.principal,
        result.loan_duration_days,
        result.apr * 100.0
    );
    if result.upfront_payment > 0.0 {
        println!(
            "Paid upfront: {:.2}, capital at risk {:.2}",
            result.upfront_payment, result.capital_at_risk
        );
    }
    println!("Capital deployed: {:.1} days", result.capital_deployment_days);
    if result.has_early_repayment {
        println!("Figures blend full-term and early-repayment loans");
    }
    println!();
    print_line_items(&result.breakdown());
    println!("  {}", "-".repeat(37));
    println!("  {:<24} {:>12.4}", "Net profit", result.net_profit);
    println!();
    println!("Effective yield:          {:>10.2}%", result.effective_yield * 100.0);
    println!(
        "Settlement delay benefit: {:>10.2}%",
        result.settlement_delay_benefit * 100.0
    );
    println!("Profit margin:            {:>10.2}%", result.profit_margin() * 100.0);

    if result.is_float_scenario {
        println!();
        println!(
            "WARNING: float scenario, merchant paid {} days after the last installment; \
             yield is a lower bound over a proxy deployment window",
            result.float_period_days
        );
    }
}

fn print_solution_table(solution: &AprSolution, target_yield: f64) {
    println!("Target yield:   {:>10.2}%", target_yield * 100.0);
    if solution.converged {
        println!("Required APR:   {:>10.2}%", solution.apr * 100.0);
    } else {
        println!(
            "Required APR:   target unreachable (nearest bound {:.2}%)",
            solution.apr * 100.0
        );
    }
    println!("Achieved yield: {:>10.2}%", solution.achieved_yield * 100.0);
    println!("Iterations:     {:>10}", solution.iterations);
}

fn print_comparison_table(comparison: &Comparison) {
    println!("{:<24} {:>14} {:>14}", "", "Interest", "Interest-free");
    println!("{}", "-".repeat(54));
    let bearing = comparison.bearing.breakdown();
    let free = comparison.free.breakdown();
    for (b, f) in bearing.iter().zip(&free) {
        println!("{:<24} {:>14.4} {:>14.4}", b.label, b.amount, f.amount);
    }
    println!(
        "{:<24} {:>14.4} {:>14.4}",
        "Net profit", comparison.bearing.net_profit, comparison.free.net_profit
    );
    println!(
        "{:<24} {:>13.2}% {:>13.2}%",
        "Effective yield",
        comparison.bearing.effective_yield * 100.0,
        comparison.free.effective_yield * 100.0
    );
    println!();
    println!("Yield difference:  {:>10.2}%", comparison.yield_difference * 100.0);
    println!("Profit difference: {:>10.4}", comparison.profit_difference);
}
