use std::fs::File;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use climtrend_geo::{Columns, Encoding, GazetteerOptions, Metric};
use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClimtrendConfig {
    pub input: InputConfig,
    pub reference: ReferenceConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputConfig {
    pub columns: InputColumns,

    // chrono format of the date column, only the year is used
    pub date_format: String,

    pub on_parse_error: ParseErrorPolicy,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            columns: InputColumns::default(),
            date_format: "%Y-%m-%d".into(),
            on_parse_error: ParseErrorPolicy::default(),
        }
    }
}

/// Column names of the temperature dataset. Defaults match the Berkeley Earth
/// `GlobalLandTemperaturesByCity.csv` export.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputColumns {
    pub date: String,
    pub temperature: String,
    pub name: String,
    pub latitude: String,
    pub longitude: String,
}

impl Default for InputColumns {
    fn default() -> Self {
        Self {
            date: "dt".into(),
            temperature: "AverageTemperature".into(),
            name: "City".into(),
            latitude: "Latitude".into(),
            longitude: "Longitude".into(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseErrorPolicy {
    /// fail the run on the first malformed row
    #[default]
    Abort,

    /// drop malformed rows and count them
    Skip,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReferenceConfig {
    pub columns: Columns,
    pub encoding: Encoding,
    pub metric: Metric,
}

impl ReferenceConfig {
    pub fn gazetteer_options(&self) -> GazetteerOptions {
        GazetteerOptions {
            columns: self.columns.clone(),
            encoding: self.encoding,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    pub on_fit_failure: FitFailurePolicy,
    pub group_order: GroupOrder,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitFailurePolicy {
    /// leave the location out of the output and count it
    #[default]
    Exclude,

    /// fail the run
    Abort,
}

/// Order in which locations are produced, which also decides which record
/// survives deduplication.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupOrder {
    #[default]
    FirstSeen,

    /// by name, then latitude, then longitude
    Sorted,
}

pub fn load(path: impl AsRef<Path>) -> Result<ClimtrendConfig> {
    let path = path.as_ref();

    let fp = File::open(path).with_context(|| format!("open config {:?}", path))?;
    let config: ClimtrendConfig = serde_yaml::from_reader(fp)
        .with_context(|| format!("parse config {:?}", path))?;

    config.validate()?;

    Ok(config)
}

impl ClimtrendConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.input.date_format.is_empty(), "input.dateFormat must not be empty");

        let columns = &self.input.columns;
        for (key, value) in [
            ("date", &columns.date),
            ("temperature", &columns.temperature),
            ("name", &columns.name),
            ("latitude", &columns.latitude),
            ("longitude", &columns.longitude),
        ] {
            ensure!(!value.is_empty(), "input.columns.{} must not be empty", key);
        }

        let columns = &self.reference.columns;
        for (key, value) in [
            ("name", &columns.name),
            ("latitude", &columns.latitude),
            ("longitude", &columns.longitude),
        ] {
            ensure!(!value.is_empty(), "reference.columns.{} must not be empty", key);
        }

        Ok(())
    }
}
