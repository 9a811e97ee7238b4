use std::fmt::{Display, Formatter};

use ordered_float::OrderedFloat;
use regex::Regex;
use thiserror::Error;

use crate::Metric;

thread_local! {
    static RE_COORDINATE: Regex = Regex::new(r"^(?P<value>[^NSEWnsew]+?)\s*(?P<hemisphere>[NSEWnsew])?$").unwrap();
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, derive_more::Display)]
pub enum Axis {
    #[display("latitude")]
    Latitude,

    #[display("longitude")]
    Longitude,
}

impl Axis {
    fn limit(self) -> f64 {
        match self {
            Axis::Latitude => 90.0,
            Axis::Longitude => 180.0,
        }
    }

    // sign of the hemisphere, if it belongs to this axis
    fn hemisphere_sign(self, hemisphere: char) -> Option<f64> {
        match (self, hemisphere.to_ascii_uppercase()) {
            (Axis::Latitude, 'N') | (Axis::Longitude, 'E') => Some(1.0),
            (Axis::Latitude, 'S') | (Axis::Longitude, 'W') => Some(-1.0),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CoordinateError {
    #[error("not a coordinate: {0:?}")]
    Malformed(String),

    #[error("hemisphere {hemisphere:?} is not valid for a {axis}")]
    Hemisphere { axis: Axis, hemisphere: char },

    #[error("{axis} {value} is out of range")]
    OutOfRange { axis: Axis, value: f64 },
}

/// Parses a coordinate in decimal degrees. Accepts signed values like `-12.5`
/// as well as hemisphere suffixed values like `57.05N` or `10.33W`.
pub fn parse_coordinate(text: &str, axis: Axis) -> Result<f64, CoordinateError> {
    let text = text.trim();
    let malformed = || CoordinateError::Malformed(text.to_owned());

    // plain numbers first, this also covers exponents like `1e-05`
    let parsed = match text.parse::<f64>() {
        Ok(value) => Some((value, None)),
        Err(_) => RE_COORDINATE.with(|re| {
            let captures = re.captures(text)?;
            let value = captures.name("value")?.as_str().trim().parse::<f64>().ok()?;
            let hemisphere = captures.name("hemisphere").and_then(|m| m.as_str().chars().next());
            Some((value, hemisphere))
        }),
    };

    let (value, hemisphere) = parsed.ok_or_else(malformed)?;

    if !value.is_finite() {
        return Err(malformed());
    }

    let value = match hemisphere {
        None => value,
        Some(hemisphere) => {
            // a hemisphere already carries the sign
            if value < 0.0 {
                return Err(malformed());
            }

            let sign = axis.hemisphere_sign(hemisphere)
                .ok_or(CoordinateError::Hemisphere { axis, hemisphere })?;

            sign * value
        }
    };

    if value.abs() > axis.limit() {
        return Err(CoordinateError::OutOfRange { axis, value });
    }

    Ok(value)
}

/// A position on earth in decimal degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn parse(latitude: &str, longitude: &str) -> Result<Self, CoordinateError> {
        Ok(Self {
            latitude: parse_coordinate(latitude, Axis::Latitude)?,
            longitude: parse_coordinate(longitude, Axis::Longitude)?,
        })
    }

    pub fn distance(&self, other: &Point, metric: Metric) -> f64 {
        metric.distance(self, other)
    }

    /// Hashable identity of this point. Two points share a key only if both
    /// coordinates are exactly equal.
    pub fn key(&self) -> (OrderedFloat<f64>, OrderedFloat<f64>) {
        (OrderedFloat(self.latitude), OrderedFloat(self.longitude))
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_plain_degrees() {
        assert_eq!(parse_coordinate("-12.5", Axis::Latitude), Ok(-12.5));
        assert_eq!(parse_coordinate(" 10 ", Axis::Longitude), Ok(10.0));
        assert_eq!(parse_coordinate("1e-05", Axis::Longitude), Ok(1e-5));
        assert_eq!(parse_coordinate("-2.5E-3", Axis::Latitude), Ok(-2.5e-3));
        assert_eq!(parse_coordinate("1.0e1", Axis::Longitude), Ok(10.0));
    }

    #[test]
    fn parses_hemisphere_suffix() {
        assert_eq!(parse_coordinate("57.05N", Axis::Latitude), Ok(57.05));
        assert_eq!(parse_coordinate("12.50S", Axis::Latitude), Ok(-12.5));
        assert_eq!(parse_coordinate("10.33E", Axis::Longitude), Ok(10.33));
        assert_eq!(parse_coordinate("77.2 w", Axis::Longitude), Ok(-77.2));
    }

    #[test]
    fn rejects_hemisphere_of_other_axis() {
        assert_eq!(
            parse_coordinate("10.33E", Axis::Latitude),
            Err(CoordinateError::Hemisphere { axis: Axis::Latitude, hemisphere: 'E' }),
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_coordinate("", Axis::Latitude), Err(CoordinateError::Malformed(_))));
        assert!(matches!(parse_coordinate("abc", Axis::Latitude), Err(CoordinateError::Malformed(_))));
        assert!(matches!(parse_coordinate("NaN", Axis::Latitude), Err(CoordinateError::Malformed(_))));
        assert!(matches!(parse_coordinate("inf", Axis::Longitude), Err(CoordinateError::Malformed(_))));
        assert!(matches!(parse_coordinate("-5N", Axis::Latitude), Err(CoordinateError::Malformed(_))));
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(matches!(parse_coordinate("91", Axis::Latitude), Err(CoordinateError::OutOfRange { .. })));
        assert_eq!(parse_coordinate("179.9W", Axis::Longitude), Ok(-179.9));
    }

    #[test]
    fn key_distinguishes_fractional_difference() {
        let a = Point::new(10.0, 20.0);
        let b = Point::new(10.0, 20.000001);
        assert_ne!(a.key(), b.key());
        assert_eq!(a.key(), Point::new(10.0, 20.0).key());
    }
}
