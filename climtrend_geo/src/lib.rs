pub use gazetteer::{CanonicalName, Columns, Encoding, Gazetteer, GazetteerOptions, ReferenceEntry};
pub use metric::Metric;
pub use point::{parse_coordinate, Axis, CoordinateError, Point};
pub use reconcile::{nearest, Reconciler, Reconciliation};

mod gazetteer;
mod metric;
mod point;
mod reconcile;
