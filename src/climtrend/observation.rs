use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use arcstr::ArcStr;
use chrono::format::{self, Parsed, StrftimeItems};
use climtrend_geo::Point;
use csv::StringRecord;
use tracing::{info, instrument, warn};

use crate::climtrend::config::{InputColumns, InputConfig, ParseErrorPolicy};
use crate::climtrend::Observation;

/// Observations read from the input dataset.
pub struct Loaded {
    pub observations: Vec<Observation>,

    // rows dropped because they could not be parsed
    pub skipped: usize,
}

#[instrument(skip_all, fields(? path))]
pub fn load(path: &Path, config: &InputConfig) -> Result<Loaded> {
    let fp = BufReader::new(File::open(path).with_context(|| format!("open {:?}", path))?);
    let loaded = from_reader(fp, config).with_context(|| format!("read {:?}", path))?;

    info!("Read {} observations, skipped {} rows", loaded.observations.len(), loaded.skipped);

    Ok(loaded)
}

pub fn from_reader(reader: impl Read, config: &InputConfig) -> Result<Loaded> {
    let mut r = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let columns = Columns::resolve(r.headers()?, &config.columns)?;

    let mut observations = Vec::new();
    let mut skipped = 0;

    let mut record = StringRecord::new();
    while r.read_record(&mut record)? {
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        match columns.parse(&record, &config.date_format) {
            Ok(observation) => observations.push(observation),

            Err(err) => match config.on_parse_error {
                ParseErrorPolicy::Abort => {
                    return Err(err.context(format!("parse row at line {}", line)));
                }

                ParseErrorPolicy::Skip => {
                    warn!("Skip row at line {}: {:#}", line, err);
                    skipped += 1;
                }
            },
        }
    }

    Ok(Loaded { observations, skipped })
}

// positions of the columns we care about
struct Columns {
    date: usize,
    temperature: usize,
    name: usize,
    latitude: usize,
    longitude: usize,
}

impl Columns {
    fn resolve(headers: &StringRecord, names: &InputColumns) -> Result<Self> {
        let position = |name: &str| {
            headers.iter()
                .position(|header| header.trim() == name)
                .ok_or_else(|| anyhow!("input has no column {:?}", name))
        };

        Ok(Self {
            date: position(&names.date)?,
            temperature: position(&names.temperature)?,
            name: position(&names.name)?,
            latitude: position(&names.latitude)?,
            longitude: position(&names.longitude)?,
        })
    }

    fn parse(&self, record: &StringRecord, date_format: &str) -> Result<Observation> {
        let field = |idx: usize| record.get(idx).map(str::trim).ok_or_else(|| anyhow!("row is too short"));

        let date = field(self.date)?;
        let year = parse_year(date, date_format).with_context(|| format!("invalid date {:?}", date))?;

        let point = Point::parse(field(self.latitude)?, field(self.longitude)?)?;

        let name = field(self.name)?;
        if name.is_empty() {
            bail!("empty location name");
        }

        Ok(Observation {
            name: ArcStr::from(name),
            point,
            year,
            temperature: parse_temperature(field(self.temperature)?)?,
        })
    }
}

/// Year of a date. Month and day must be in range but need not form a
/// calendar date, `2000-02-30` is year 2000.
pub fn parse_year(date: &str, date_format: &str) -> Result<i32> {
    let mut parsed = Parsed::new();
    format::parse(&mut parsed, date, StrftimeItems::new(date_format))?;

    parsed.year().ok_or_else(|| anyhow!("format {:?} has no year", date_format))
}

/// An empty cell is a missing value.
fn parse_temperature(value: &str) -> Result<Option<f64>> {
    if value.is_empty() {
        return Ok(None);
    }

    let temperature = value.parse::<f64>()
        .with_context(|| format!("invalid temperature {:?}", value))?;

    Ok(Some(temperature).filter(|t| !t.is_nan()))
}

#[cfg(test)]
mod test {
    use anyhow::Result;
    use super::*;

    const DATA: &str = "dt,AverageTemperature,AverageTemperatureUncertainty,City,Country,Latitude,Longitude\n\
        1743-11-01,6.068,1.737,Århus,Denmark,57.05N,10.33E\n\
        1743-12-01,,,Århus,Denmark,57.05N,10.33E\n\
        2013-09-01,-1.5,0.3,Punta Arenas,Chile,53.84S,70.81W\n";

    #[test]
    fn reads_berkeley_earth_rows() -> Result<()> {
        let loaded = from_reader(DATA.as_bytes(), &InputConfig::default())?;

        assert_eq!(loaded.skipped, 0);
        assert_eq!(loaded.observations.len(), 3);

        let first = &loaded.observations[0];
        assert_eq!(first.name.as_str(), "Århus");
        assert_eq!(first.point, Point::new(57.05, 10.33));
        assert_eq!(first.year, 1743);
        assert_eq!(first.temperature, Some(6.068));

        assert_eq!(loaded.observations[1].temperature, None);
        assert_eq!(loaded.observations[2].point, Point::new(-53.84, -70.81));

        Ok(())
    }

    #[test]
    fn malformed_row_aborts_by_default() {
        let data = format!("{}1744-xx-01,1.0,1.0,Århus,Denmark,57.05N,10.33E\n", DATA);

        let err = from_reader(data.as_bytes(), &InputConfig::default()).err().unwrap();
        assert!(format!("{:#}", err).contains("line 5"), "unexpected error {:#}", err);
    }

    #[test]
    fn malformed_rows_can_be_skipped() -> Result<()> {
        let data = format!(
            "{}1744-01-01,warm,1.0,Århus,Denmark,57.05N,10.33E\n1744-01-01,1.0,1.0,Århus,Denmark,far north,10.33E\n",
            DATA,
        );

        let config = InputConfig { on_parse_error: ParseErrorPolicy::Skip, ..InputConfig::default() };
        let loaded = from_reader(data.as_bytes(), &config)?;

        assert_eq!(loaded.observations.len(), 3);
        assert_eq!(loaded.skipped, 2);

        Ok(())
    }

    #[test]
    fn missing_column_fails() {
        let data = "dt,City,Latitude,Longitude\n";
        let err = from_reader(data.as_bytes(), &InputConfig::default()).err().unwrap();
        assert!(err.to_string().contains("AverageTemperature"));
    }

    #[test]
    fn custom_date_format() -> Result<()> {
        let data = "date,average_temperature,city,latitude,longitude\n01.02.1999,3.5,Bern,46.95,7.45\n";

        let config = InputConfig {
            columns: InputColumns {
                date: "date".into(),
                temperature: "average_temperature".into(),
                name: "city".into(),
                latitude: "latitude".into(),
                longitude: "longitude".into(),
            },
            date_format: "%d.%m.%Y".into(),
            ..InputConfig::default()
        };

        let loaded = from_reader(data.as_bytes(), &config)?;
        assert_eq!(loaded.observations[0].year, 1999);

        Ok(())
    }

    #[test]
    fn parse_year_ignores_calendar() -> Result<()> {
        assert_eq!(parse_year("1743-11-01", "%Y-%m-%d")?, 1743);
        assert_eq!(parse_year("2000-02-30", "%Y-%m-%d")?, 2000);
        assert_eq!(parse_year("1999-02-29", "%Y-%m-%d")?, 1999);
        assert!(parse_year("2000-xx-01", "%Y-%m-%d").is_err());
        assert!(parse_year("01.02", "%d.%m").is_err());
        Ok(())
    }

    #[test]
    fn impossible_day_keeps_row() -> Result<()> {
        let data = format!("{}2000-02-30,1.0,1.0,Århus,Denmark,57.05N,10.33E\n", DATA);

        let loaded = from_reader(data.as_bytes(), &InputConfig::default())?;
        assert_eq!(loaded.observations.len(), 4);
        assert_eq!(loaded.observations[3].year, 2000);

        Ok(())
    }

    #[test]
    fn parse_temperature_values() -> Result<()> {
        assert_eq!(parse_temperature("")?, None);
        assert_eq!(parse_temperature("12.25")?, Some(12.25));
        assert_eq!(parse_temperature("NaN")?, None);
        assert!(parse_temperature("n/a").is_err());
        Ok(())
    }
}
