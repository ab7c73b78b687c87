use beacon_core::{
    engine::{Assessment, Engine, EngineBuilder},
    types::{Domain, MetricRecord},
};
use tracing::debug;

use super::utils::{load_config, parse_records, read_input, CliResult};

pub struct ScoreOptions {
    /// JSON record or array of records; `-` reads stdin.
    pub file: String,
    /// Score in this domain instead of the kind's route.
    pub domain: Option<Domain>,
    /// Overrides the configured random policy.
    pub seed: Option<u64>,
    pub config: Option<String>,
}

/// Scores records and prints one JSON assessment per record.
pub fn score_records(options: ScoreOptions) -> CliResult<()> {
    let config = load_config(options.config.as_deref())?;
    let mut builder = EngineBuilder::from_config(&config)?.enable_metrics(false);
    if let Some(seed) = options.seed {
        builder = builder.with_seed(seed);
    }
    let engine = builder.build()?;

    let records = parse_records(&read_input(&options.file)?)?;
    debug!(records = records.len(), file = %options.file, "scoring records");

    let assessments = assess(&engine, records, options.domain)?;
    let rendered = if assessments.len() == 1 {
        serde_json::to_string_pretty(&assessments[0])?
    } else {
        serde_json::to_string_pretty(&assessments)?
    };
    println!("{rendered}");

    Ok(())
}

fn assess(
    engine: &Engine,
    records: Vec<MetricRecord>,
    domain: Option<Domain>,
) -> CliResult<Vec<Assessment>> {
    let mut assessments = Vec::with_capacity(records.len());
    for record in records {
        let assessment = match domain {
            Some(domain) => engine.submit_to(domain, record)?,
            None => engine.submit(record)?,
        };
        assessments.push(assessment);
    }
    Ok(assessments)
}
