use std::collections::HashSet;

use anyhow::{Context, Result};
use arcstr::ArcStr;
use climtrend_geo::{Point, Reconciler, Reconciliation};
use itertools::Itertools;
use tracing::{info, instrument, warn};

use crate::climtrend::config::{AnalysisConfig, FitFailurePolicy};
use crate::climtrend::group::{self, Group};
use crate::climtrend::stats::{self, PointCounts};
use crate::climtrend::trend::{fit_slope, FitError};
use crate::climtrend::{LocationRecord, Observation};

/// Something worth telling the user about, collected while the pipeline runs.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Fitted { name: ArcStr, point: Point, trend: f64 },
    Excluded { name: ArcStr, point: Point, error: FitError },
    NoMatch { name: ArcStr },
    Unique { name: ArcStr, from: Point, to: Point },
    Nearest { name: ArcStr, candidates: usize, from: Point, to: Point },
}

impl Event {
    pub fn log(&self) {
        match self {
            Event::Fitted { name, point, trend } => info!("{} ({}): {}", name, point, trend),
            Event::Excluded { name, point, error } => warn!("{} ({}): excluded, {}", name, point, error),
            Event::NoMatch { name } => info!("{}: no results", name),
            Event::Unique { name, from, to } => info!("{}: moved from {} to {}", name, from, to),
            Event::Nearest { name, candidates, from, to } => {
                info!("{}: {} results, changed location from {} to {}", name, candidates, from, to)
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Summary {
    /// distinct locations in the input
    pub groups: usize,

    /// locations left out because no trend could be fitted
    pub excluded: usize,

    /// input rows dropped while parsing
    pub skipped_rows: usize,

    pub reconciled: usize,
    pub unmatched: usize,

    /// positions entering deduplication
    pub points: PointCounts,
    pub duplicates: usize,

    pub median: Option<f64>,
    pub mean: Option<f64>,
}

impl Summary {
    pub fn log(&self) {
        info!(
            "Locations: {}, excluded: {}, skipped rows: {}",
            self.groups, self.excluded, self.skipped_rows,
        );

        info!("Reconciled: {}, no match: {}", self.reconciled, self.unmatched);

        info!(
            "Points: {}, Unique points: {}, dropped duplicates: {}",
            self.points.total, self.points.unique, self.duplicates,
        );

        match (self.mean, self.median) {
            (Some(mean), Some(median)) => info!("Average trend: {}, median: {}", mean, median),
            _ => warn!("No trends, statistics are undefined"),
        }
    }
}

pub struct Report {
    pub records: Vec<LocationRecord>,
    pub summary: Summary,
    pub diagnostics: Vec<Event>,
}

pub struct Pipeline {
    config: AnalysisConfig,
    reconciler: Option<Reconciler>,
}

impl Pipeline {
    pub fn new(config: AnalysisConfig, reconciler: Option<Reconciler>) -> Self {
        Self { config, reconciler }
    }

    #[instrument(skip_all, fields(observations = observations.len()))]
    pub fn run(&self, observations: Vec<Observation>) -> Result<Report> {
        let mut summary = Summary::default();
        let mut diagnostics = Vec::new();

        let groups = group::by_location(observations, self.config.group_order);
        summary.groups = groups.len();

        let records = self.estimate(groups, &mut summary, &mut diagnostics)?;

        let records = match &self.reconciler {
            Some(reconciler) => reconcile(reconciler, records, &mut summary, &mut diagnostics),
            None => records,
        };

        summary.points = stats::point_counts(records.iter().map(|r| r.point));

        let before = records.len();
        let records = dedup_by_point(records);
        summary.duplicates = before - records.len();

        let trends = records.iter().map(|r| r.trend).collect_vec();
        summary.median = stats::median(&trends);
        summary.mean = stats::mean(&trends);

        Ok(Report { records, summary, diagnostics })
    }

    fn estimate(&self, groups: Vec<Group>, summary: &mut Summary, diagnostics: &mut Vec<Event>) -> Result<Vec<LocationRecord>> {
        let mut records = Vec::with_capacity(groups.len());

        for group in groups {
            let name = group.key.name.clone();
            let point = group.key.point();

            let pairs = group.observations.iter().map(|o| (o.year, o.temperature));

            match fit_slope(pairs) {
                Ok(trend) => {
                    diagnostics.push(Event::Fitted { name: name.clone(), point, trend });
                    records.push(LocationRecord { name, point, trend });
                }

                Err(error) => match self.config.on_fit_failure {
                    FitFailurePolicy::Abort => {
                        return Err(error).with_context(|| format!("fit trend for {} ({})", name, point));
                    }

                    FitFailurePolicy::Exclude => {
                        summary.excluded += 1;
                        diagnostics.push(Event::Excluded { name, point, error });
                    }
                },
            }
        }

        Ok(records)
    }
}

fn reconcile(
    reconciler: &Reconciler,
    records: Vec<LocationRecord>,
    summary: &mut Summary,
    diagnostics: &mut Vec<Event>,
) -> Vec<LocationRecord> {
    records
        .into_iter()
        .map(|mut record| {
            let from = record.point;
            let outcome = reconciler.reconcile(&record.name, from);
            record.point = outcome.point(from);

            let name = record.name.clone();
            let event = match outcome {
                Reconciliation::NoMatch => {
                    summary.unmatched += 1;
                    Event::NoMatch { name }
                }

                Reconciliation::Unique { to } => {
                    summary.reconciled += 1;
                    Event::Unique { name, from, to }
                }

                Reconciliation::Nearest { candidates, from, to } => {
                    summary.reconciled += 1;
                    Event::Nearest { name, candidates, from, to }
                }
            };

            diagnostics.push(event);
            record
        })
        .collect_vec()
}

/// Keeps the first record for every distinct point, dropping later ones.
pub fn dedup_by_point(records: Vec<LocationRecord>) -> Vec<LocationRecord> {
    let mut seen = HashSet::new();

    records
        .into_iter()
        .filter(|record| seen.insert(record.point.key()))
        .collect_vec()
}
