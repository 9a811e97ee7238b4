use climtrend_geo::Point;
use itertools::Itertools;
use ordered_float::OrderedFloat;

/// Arithmetic mean, `None` for an empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median of the values. For an even count this is the mean of the two
/// middle values.
pub fn median(values: &[f64]) -> Option<f64> {
    let sorted = values.iter().copied().sorted_by(f64::total_cmp).collect_vec();

    let mid = sorted.len() / 2;
    match sorted.len() {
        0 => None,
        len if len % 2 == 1 => Some(sorted[mid]),
        _ => Some((sorted[mid - 1] + sorted[mid]) / 2.0),
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointCounts {
    pub total: usize,
    pub unique: usize,
}

/// Counts all and all distinct (longitude, latitude) positions.
pub fn point_counts(points: impl IntoIterator<Item=Point>) -> PointCounts {
    let positions = points.into_iter()
        .map(|p| (OrderedFloat(p.longitude), OrderedFloat(p.latitude)))
        .collect_vec();

    PointCounts {
        total: positions.len(),
        unique: positions.iter().unique().count(),
    }
}
