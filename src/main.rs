use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::climtrend::config::ClimtrendConfig;
use crate::climtrend::pipeline::Event;
use crate::climtrend::Job;

pub mod climtrend;

#[derive(Parser, Debug)]
#[command(
    name = "climtrend",
    about = "Computes the temperature trend of every location in a city temperature dataset"
)]
struct Args {
    /// csv file with the temperature observations
    input: PathBuf,

    /// csv file to write the per location trends to
    output: PathBuf,

    /// csv file with authoritative city names and coordinates
    reference: Option<PathBuf>,

    /// yaml configuration file, defaults are used if not given
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match &args.config {
        Some(path) => climtrend::config::load(path)?,
        None => ClimtrendConfig::default(),
    };

    let job = Job {
        input: args.input,
        output: args.output,
        reference: args.reference,
    };

    let report = climtrend::run(&job, &config)?;

    report.diagnostics.iter().for_each(Event::log);
    report.summary.log();

    Ok(())
}
