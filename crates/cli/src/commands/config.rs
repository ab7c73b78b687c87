use beacon_core::{
    config::AppConfig,
    types::{Domain, RecordKind},
};
use clap::{Subcommand, ValueEnum};
use std::path::Path;

use super::utils::{print_error, print_info, print_success, CliError, CliResult};

/// Sample configuration written by `config generate`; every value is a default.
pub const SAMPLE_CONFIG: &str = include_str!("../../../../config/beacon.toml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShowFormat {
    Text,
    Toml,
    Json,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to config file
        #[arg(short, long, default_value = "config/beacon.toml")]
        file: String,
    },

    /// Show the effective configuration (file plus defaults and env overrides)
    Show {
        /// Path to config file
        #[arg(short, long, default_value = "config/beacon.toml")]
        file: String,

        #[arg(long, value_enum, default_value = "text")]
        format: ShowFormat,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output path for the config file
        #[arg(short, long, default_value = "config/beacon.toml")]
        output: String,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn handle_config_command(command: ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Validate { file } => validate_config(&file),
        ConfigCommands::Show { file, format } => show_config(&file, format),
        ConfigCommands::Generate { output, force } => generate_config(&output, force),
    }
}

fn validate_config(file: &str) -> CliResult<()> {
    if !Path::new(file).exists() {
        print_error(&format!("Configuration file not found: {file}"));
        return Err(CliError::Config(format!("File not found: {file}")));
    }

    print_info(&format!("Loading configuration from {file}..."));
    let config = AppConfig::from_file(file).map_err(|e| CliError::Config(e.to_string()))?;

    print_info("Validating configuration...");
    config.validate().map_err(CliError::Config)?;

    print_success("Configuration is valid!");

    println!("Configuration Summary:");
    println!(
        "  Randomness: {}",
        match (config.engine.seed, config.engine.allow_entropy) {
            (Some(seed), _) => format!("seeded ({seed})"),
            (None, true) => "entropy".to_string(),
            (None, false) => "disabled".to_string(),
        }
    );
    println!(
        "  Auto-resolve below floor: {}",
        if config.alerts.auto_resolve_below_floor { "enabled" } else { "disabled" }
    );
    println!(
        "  Monitor: {}",
        if config.monitor.enabled {
            format!("every {}s", config.monitor.interval_seconds)
        } else {
            "disabled".to_string()
        }
    );
    println!("  Metrics: {}", if config.metrics.enabled { "enabled" } else { "disabled" });

    Ok(())
}

fn show_config(file: &str, format: ShowFormat) -> CliResult<()> {
    let config = AppConfig::from_file(file).map_err(|e| CliError::Config(e.to_string()))?;

    match format {
        ShowFormat::Toml => {
            let rendered =
                toml::to_string_pretty(&config).map_err(|e| CliError::General(e.to_string()))?;
            println!("{rendered}");
            return Ok(());
        }
        ShowFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            return Ok(());
        }
        ShowFormat::Text => {}
    }

    println!("Configuration from {file}:");

    println!("\n[Engine]");
    match config.engine.seed {
        Some(seed) => println!("  Seed: {seed}"),
        None => println!("  Seed: none (entropy allowed: {})", config.engine.allow_entropy),
    }
    println!("  Routes:");
    for kind in RecordKind::ALL {
        println!("    {kind} -> {}", config.engine.route(kind));
    }

    println!("\n[Alerts]");
    println!("  Auto-resolve below floor: {}", config.alerts.auto_resolve_below_floor);
    println!("  Max alerts: {}", config.alerts.max_alerts);
    println!("  Floors:");
    for domain in Domain::ALL {
        println!("    {domain}: {}", config.alerts.floor(domain));
    }

    println!("\n[Aggregator]");
    for kind in RecordKind::ALL {
        println!("  {kind}: {} records per subject", config.aggregator.capacity(kind));
    }

    println!("\n[Monitor]");
    println!("  Enabled: {}", config.monitor.enabled);
    println!("  Interval: {}s", config.monitor.interval_seconds);

    println!("\n[Metrics]");
    println!("  Enabled: {}", config.metrics.enabled);

    println!("\n[Logging]");
    println!("  Level: {}", config.logging.level);
    println!("  Format: {}", config.logging.format);

    Ok(())
}

fn generate_config(output: &str, force: bool) -> CliResult<()> {
    let path = Path::new(output);
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "File {output} already exists. Use --force to overwrite."
        )));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, SAMPLE_CONFIG)?;

    print_success(&format!("Sample configuration written to {output}"));
    Ok(())
}
