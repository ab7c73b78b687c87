pub mod config;
pub mod score;
pub mod simulate;
pub mod utils;

pub use config::{handle_config_command, ConfigCommands};
pub use score::{score_records, ScoreOptions};
pub use simulate::{simulate, SimulateOptions};
