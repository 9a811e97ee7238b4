use ordered_float::OrderedFloat;

use crate::{Gazetteer, Metric, Point, ReferenceEntry};

/// Outcome of looking up a single location in the gazetteer.
#[derive(Clone, Debug, PartialEq)]
pub enum Reconciliation {
    /// name is unknown, coordinates stay as they are
    NoMatch,

    /// exactly one entry, taken regardless of its distance
    Unique { to: Point },

    /// several entries, the nearest one to the original coordinates wins
    Nearest { candidates: usize, from: Point, to: Point },
}

impl Reconciliation {
    /// The coordinates a location at `original` ends up with.
    pub fn point(&self, original: Point) -> Point {
        match self {
            Reconciliation::NoMatch => original,
            Reconciliation::Unique { to } => *to,
            Reconciliation::Nearest { to, .. } => *to,
        }
    }
}

/// Rewrites noisy coordinates using an authoritative gazetteer.
pub struct Reconciler {
    gazetteer: Gazetteer,
    metric: Metric,
}

impl Reconciler {
    pub fn new(gazetteer: Gazetteer, metric: Metric) -> Self {
        Self { gazetteer, metric }
    }

    pub fn gazetteer(&self) -> &Gazetteer {
        &self.gazetteer
    }

    pub fn reconcile(&self, name: &str, origin: Point) -> Reconciliation {
        match self.gazetteer.lookup(name) {
            [] => Reconciliation::NoMatch,

            [entry] => Reconciliation::Unique { to: entry.point },

            candidates => match nearest(origin, candidates, self.metric) {
                Some(entry) => Reconciliation::Nearest {
                    candidates: candidates.len(),
                    from: origin,
                    to: entry.point,
                },

                None => Reconciliation::NoMatch,
            },
        }
    }
}

/// Returns the candidate closest to `origin`. On equal distance the earlier
/// candidate wins.
pub fn nearest(origin: Point, candidates: &[ReferenceEntry], metric: Metric) -> Option<&ReferenceEntry> {
    candidates
        .iter()
        .min_by_key(|&entry| OrderedFloat(origin.distance(&entry.point, metric)))
}
