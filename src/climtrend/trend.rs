use itertools::Itertools;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum FitError {
    #[error("need at least 2 observations with a temperature, got {valid}")]
    InsufficientData { valid: usize },

    #[error("all observations are from year {year}")]
    DegenerateYears { year: i32 },

    #[error("slope is not finite")]
    NonFinite,
}

/// Least squares slope of temperature over year, in degrees per year.
///
/// Pairs without a temperature are dropped first. The result only depends on
/// the set of remaining pairs, not on their order.
pub fn fit_slope(pairs: impl IntoIterator<Item=(i32, Option<f64>)>) -> Result<f64, FitError> {
    let pairs = pairs.into_iter()
        .filter_map(|(year, temperature)| Some((year, temperature.filter(|t| !t.is_nan())?)))
        // a fixed summation order keeps the result bit for bit stable
        .sorted_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)))
        .collect_vec();

    let Some(&(first_year, _)) = pairs.first() else {
        return Err(FitError::InsufficientData { valid: 0 });
    };

    if pairs.len() < 2 {
        return Err(FitError::InsufficientData { valid: pairs.len() });
    }

    if pairs.iter().all(|&(year, _)| year == first_year) {
        return Err(FitError::DegenerateYears { year: first_year });
    }

    // two points, a single division keeps the slope exact
    if let [(y1, t1), (y2, t2)] = pairs[..] {
        return finite((t2 - t1) / f64::from(y2 - y1));
    }

    // years relative to the first one, small integers are exact in f64
    let x = |year: i32| f64::from(year - first_year);

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|&(year, _)| x(year)).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|&(_, temperature)| temperature).sum::<f64>() / n;

    let (sxy, sxx) = pairs.iter().fold((0.0, 0.0), |(sxy, sxx), &(year, temperature)| {
        let dx = x(year) - mean_x;
        let dy = temperature - mean_y;
        (sxy + dx * dy, sxx + dx * dx)
    });

    finite(sxy / sxx)
}

fn finite(slope: f64) -> Result<f64, FitError> {
    if slope.is_finite() {
        Ok(slope)
    } else {
        Err(FitError::NonFinite)
    }
}
