use beacon_core::{config::AppConfig, types::Domain};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
use commands::{
    handle_config_command, score_records, simulate, ConfigCommands, ScoreOptions, SimulateOptions,
};

#[derive(Parser)]
#[command(name = "beacon-cli")]
#[command(about = "Beacon CLI - scoring, classification and alerting for the hospital network")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file for engine commands (defaults to $BEACON_CONFIG or config/beacon.toml)
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration Management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Score JSON records and print the assessments
    Score {
        /// JSON file with one record or an array of records (`-` for stdin)
        #[arg(short, long)]
        file: String,

        /// Score in this domain instead of the record kind's route
        #[arg(short, long, value_parser = parse_domain)]
        domain: Option<Domain>,

        /// Seed for randomized rules (overrides the configured policy)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run the synthetic hospital network through the engine
    Simulate {
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Number of generator ticks (default 12; without it `monitor.enabled` selects --follow)
        #[arg(short, long)]
        rounds: Option<u64>,

        /// Number of hospitals in the network
        #[arg(long, default_value = "6")]
        hospitals: usize,

        /// Chance of an occupancy surge per hospital and tick (0.0 - 1.0)
        #[arg(long)]
        surge_probability: Option<f64>,

        /// Poll on an interval until Ctrl-C instead of running fixed rounds
        #[arg(long)]
        follow: bool,

        /// Poll interval in seconds for --follow (defaults to monitor.interval_seconds)
        #[arg(long)]
        interval: Option<u64>,

        /// Print the Prometheus metrics rendering at the end
        #[arg(long)]
        metrics: bool,
    },
}

fn parse_domain(value: &str) -> Result<Domain, String> {
    value.parse::<Domain>().map_err(|e| e.to_string())
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,beacon_core={0},cli={0}", config.logging.level))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format.as_str() == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr);
        registry.with(fmt_layer).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(false);
        registry.with(fmt_layer).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let logging_config = match cli.config.as_deref() {
        Some(file) => AppConfig::from_file(file),
        None => AppConfig::load(),
    }
    .unwrap_or_default();
    init_logging(&logging_config);

    match cli.command {
        Commands::Config(config_command) => {
            handle_config_command(config_command)?;
        }

        Commands::Score { file, domain, seed } => {
            score_records(ScoreOptions { file, domain, seed, config: cli.config })?;
        }

        Commands::Simulate {
            seed,
            rounds,
            hospitals,
            surge_probability,
            follow,
            interval,
            metrics,
        } => {
            simulate(SimulateOptions {
                seed,
                rounds,
                hospitals,
                surge_probability,
                follow,
                interval_seconds: interval,
                show_metrics: metrics,
                config: cli.config,
            })
            .await?;
        }
    }

    Ok(())
}
