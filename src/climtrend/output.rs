use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::climtrend::LocationRecord;

#[derive(Serialize)]
struct Row<'a> {
    location_name: &'a str,
    latitude: f64,
    longitude: f64,
    trend: f64,
}

/// Writes the table to a temporary file next to `path` and renames it into
/// place, so `path` never holds a partial table.
pub fn write(path: &Path, records: &[LocationRecord]) -> Result<()> {
    let dir = path.parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut file = NamedTempFile::new_in(dir).with_context(|| format!("create temporary file in {:?}", dir))?;
    to_writer(file.as_file_mut(), records)?;

    file.persist(path).with_context(|| format!("write {:?}", path))?;

    Ok(())
}

pub fn to_writer(writer: impl Write, records: &[LocationRecord]) -> Result<()> {
    let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(writer);

    // explicit header, an empty table still gets one
    w.write_record(["location_name", "latitude", "longitude", "trend"])?;

    for record in records {
        w.serialize(Row {
            location_name: &record.name,
            latitude: record.point.latitude,
            longitude: record.point.longitude,
            trend: record.trend,
        })?;
    }

    w.flush()?;
    Ok(())
}
