//! Load loan configurations from JSON and CSV files
//!
//! JSON holds a single configuration, exactly as the dashboard posts it.
//! CSV holds one configuration per row, with headers equal to the field names.
//! Every record is validated as it is read.

use super::LoanConfiguration;
use crate::error::Result;
use csv::Reader;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Load and validate a single configuration from a JSON file
pub fn load_configuration<P: AsRef<Path>>(path: P) -> Result<LoanConfiguration> {
    let file = File::open(path)?;
    let config: LoanConfiguration = serde_json::from_reader(BufReader::new(file))?;
    config.validate()?;
    Ok(config)
}

/// Load and validate all configurations from a CSV file
pub fn load_configurations_csv<P: AsRef<Path>>(path: P) -> Result<Vec<LoanConfiguration>> {
    let file = File::open(path)?;
    load_configurations_from_reader(file)
}

/// Load configurations from any reader (e.g., string buffer, network stream)
pub fn load_configurations_from_reader<R: std::io::Read>(
    reader: R,
) -> Result<Vec<LoanConfiguration>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut configs = Vec::new();

    for record in csv_reader.deserialize() {
        let config: LoanConfiguration = record?;
        config.validate()?;
        configs.push(config);
    }

    log::debug!("Loaded {} loan configurations", configs.len());
    Ok(configs)
}
