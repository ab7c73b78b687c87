use beacon_core::{
    config::AppConfig,
    engine::BuildError,
    errors::EngineError,
    types::MetricRecord,
};
use serde::Deserialize;
use std::{io::Read, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Engine initialization failed: {0}")]
    Build(#[from] BuildError),

    #[error("Error: {0}")]
    General(String),
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        Self::Input(error.to_string())
    }
}

pub type CliResult<T> = Result<T, CliError>;

pub fn print_success(message: &str) {
    println!("[SUCCESS] {message}");
}

pub fn print_error(message: &str) {
    eprintln!("[ERROR] {message}");
}

pub fn print_info(message: &str) {
    println!("[INFO] {message}");
}

/// Loads the config file if given, otherwise `BEACON_CONFIG` or the default path.
pub fn load_config(file: Option<&str>) -> CliResult<AppConfig> {
    let config = match file {
        Some(file) => AppConfig::from_file(file),
        None => AppConfig::load(),
    }
    .map_err(|e| CliError::Config(e.to_string()))?;

    config.validate().map_err(CliError::Config)?;
    Ok(config)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordInput {
    Many(Vec<MetricRecord>),
    One(MetricRecord),
}

/// Decodes one record or an array of records.
pub fn parse_records(json: &str) -> CliResult<Vec<MetricRecord>> {
    match serde_json::from_str::<RecordInput>(json) {
        Ok(RecordInput::Many(records)) => Ok(records),
        Ok(RecordInput::One(record)) => Ok(vec![record]),
        Err(_) => {
            // Untagged errors say nothing useful; retry for the single-record message.
            let record: MetricRecord = serde_json::from_str(json)?;
            Ok(vec![record])
        }
    }
}

/// Reads a file, or stdin when `path` is `-`.
pub fn read_input(path: &str) -> CliResult<String> {
    if path == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }
    if !Path::new(path).exists() {
        return Err(CliError::Input(format!("File not found: {path}")));
    }
    Ok(std::fs::read_to_string(path)?)
}
