use std::path::PathBuf;

use anyhow::{Context, Result};
use arcstr::ArcStr;
use climtrend_geo::{Gazetteer, Point, Reconciler};
use ordered_float::OrderedFloat;
use tracing::info;

use crate::climtrend::config::ClimtrendConfig;
use crate::climtrend::pipeline::{Pipeline, Report};

pub mod config;
pub mod group;
pub mod observation;
pub mod output;
pub mod pipeline;
pub mod stats;
pub mod trend;

/// A single temperature reading of one location.
#[derive(Clone, Debug, PartialEq)]
pub struct Observation {
    pub name: ArcStr,
    pub point: Point,
    pub year: i32,

    // None if the dataset has no value for this date
    pub temperature: Option<f64>,
}

impl Observation {
    pub fn key(&self) -> LocationKey {
        let (latitude, longitude) = self.point.key();
        LocationKey { name: self.name.clone(), latitude, longitude }
    }
}

/// Identity of a location as given in the input, before any reconciliation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationKey {
    pub name: ArcStr,
    pub latitude: OrderedFloat<f64>,
    pub longitude: OrderedFloat<f64>,
}

impl LocationKey {
    pub fn point(&self) -> Point {
        Point::new(self.latitude.0, self.longitude.0)
    }
}

/// The trend of one location, one per group of observations.
#[derive(Clone, Debug, PartialEq)]
pub struct LocationRecord {
    pub name: ArcStr,
    pub point: Point,
    pub trend: f64,
}

/// Files taking part in a single run.
pub struct Job {
    pub input: PathBuf,
    pub output: PathBuf,
    pub reference: Option<PathBuf>,
}

/// Loads all inputs, runs the analysis and writes the output table. The
/// output is only written if every stage succeeded.
pub fn run(job: &Job, config: &ClimtrendConfig) -> Result<Report> {
    let loaded = observation::load(&job.input, &config.input)?;

    let reconciler = match &job.reference {
        None => None,
        Some(path) => {
            let gazetteer = Gazetteer::load(path, &config.reference.gazetteer_options())?;
            Some(Reconciler::new(gazetteer, config.reference.metric))
        }
    };

    let pipeline = Pipeline::new(config.analysis.clone(), reconciler);

    let mut report = pipeline.run(loaded.observations)?;
    report.summary.skipped_rows = loaded.skipped;

    output::write(&job.output, &report.records)
        .with_context(|| format!("write output to {:?}", job.output))?;

    info!("Wrote {} locations to {:?}", report.records.len(), job.output);

    Ok(report)
}
