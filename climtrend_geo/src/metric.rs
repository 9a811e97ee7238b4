use serde::Deserialize;

use crate::Point;

/// Distance used to rank reference candidates. Values are only comparable
/// within the same metric.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// squared euclidean distance on raw degrees
    Planar,

    /// great circle distance in kilometers
    #[default]
    Haversine,
}

impl Metric {
    pub fn distance(self, a: &Point, b: &Point) -> f64 {
        match self {
            Metric::Planar => {
                let d_lat = a.latitude - b.latitude;
                let d_long = a.longitude - b.longitude;
                d_lat * d_lat + d_long * d_long
            }

            Metric::Haversine => haversine::distance(
                haversine::Location { latitude: a.latitude, longitude: a.longitude },
                haversine::Location { latitude: b.latitude, longitude: b.longitude },
                haversine::Units::Kilometers,
            ),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn planar_is_squared_euclidean() {
        let d = Metric::Planar.distance(&Point::new(0.0, 0.0), &Point::new(3.0, 4.0));
        assert_eq!(d, 25.0);
    }

    #[test]
    fn haversine_paris_london() {
        let paris = Point::new(48.8566, 2.3522);
        let london = Point::new(51.5074, -0.1278);

        let d = Metric::Haversine.distance(&paris, &london);
        assert!((d - 343.5).abs() < 5.0, "unexpected distance {}", d);
    }

    #[test]
    fn distance_to_self_is_zero() {
        let p = Point::new(-33.9, 151.2);
        for metric in [Metric::Planar, Metric::Haversine] {
            assert_eq!(metric.distance(&p, &p), 0.0);
        }
    }

    #[test]
    fn metrics_agree_on_ordering_nearby() {
        let origin = Point::new(45.0, 7.0);
        let near = Point::new(45.1, 7.1);
        let far = Point::new(46.0, 8.0);

        for metric in [Metric::Planar, Metric::Haversine] {
            assert!(metric.distance(&origin, &near) < metric.distance(&origin, &far));
        }
    }
}
