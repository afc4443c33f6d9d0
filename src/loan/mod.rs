//! Loan configuration records and loading

mod config;
pub mod loader;

pub use config::{
    EarlyRepayment, InstallmentFrequency, LoanConfiguration, DAYS_PER_YEAR,
    DEFAULT_EARLY_REPAYMENT_INSTALLMENT, MAX_EARLY_REPAYMENT_RATE, MAX_INSTALLMENTS,
    MAX_SETTLEMENT_DELAY_DAYS, MIN_INSTALLMENTS,
};
pub(crate) use config::check_range;
pub use loader::{load_configuration, load_configurations_csv, load_configurations_from_reader};
