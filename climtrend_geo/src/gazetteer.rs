use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use arcstr::ArcStr;
use csv::ByteRecord;
use derive_more::{AsRef, Deref, Display};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::Point;

/// A place name folded to lowercase, used as the lookup key into the gazetteer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, AsRef, Deref, Display)]
pub struct CanonicalName(String);

impl CanonicalName {
    pub fn new(name: &str) -> Self {
        Self(name.to_lowercase())
    }
}

#[derive(Clone, Debug)]
pub struct ReferenceEntry {
    /// name as written in the reference table
    pub name: ArcStr,
    pub point: Point,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// ISO-8859-1, as the world cities database is distributed
    #[default]
    Latin1,
    Utf8,
}

impl Encoding {
    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        match self {
            // every latin1 byte maps to the unicode code point of the same value
            Encoding::Latin1 => Ok(bytes.iter().copied().map(char::from).collect()),
            Encoding::Utf8 => Ok(std::str::from_utf8(bytes)?.to_owned()),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Columns {
    pub name: String,
    pub latitude: String,
    pub longitude: String,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            name: "AccentCity".into(),
            latitude: "Latitude".into(),
            longitude: "Longitude".into(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GazetteerOptions {
    pub columns: Columns,
    pub encoding: Encoding,
}

/// Authoritative place names and their coordinates. A name may occur
/// multiple times, entries for the same name keep the order of the input.
#[derive(Default)]
pub struct Gazetteer {
    entries: HashMap<CanonicalName, Vec<ReferenceEntry>>,
    len: usize,
    skipped: usize,
}

impl Gazetteer {
    pub fn from_entries<N: Into<ArcStr>>(entries: impl IntoIterator<Item=(N, Point)>) -> Self {
        let mut gazetteer = Gazetteer::default();

        for (name, point) in entries {
            gazetteer.push(ReferenceEntry { name: name.into(), point });
        }

        gazetteer
    }

    /// Loads the gazetteer from a csv file. Files ending in `.gz` are
    /// decompressed on the fly.
    #[instrument(skip_all, fields(? path))]
    pub fn load(path: &Path, options: &GazetteerOptions) -> Result<Self> {
        let fp = BufReader::new(File::open(path).with_context(|| format!("open {:?}", path))?);

        let is_gzip = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));

        let reader: Box<dyn Read> = if is_gzip {
            Box::new(flate2::read::GzDecoder::new(fp))
        } else {
            Box::new(fp)
        };

        let gazetteer = Self::from_reader(reader, options).with_context(|| format!("read {:?}", path))?;

        info!(
            "Loaded {} reference entries for {} names, skipped {} rows",
            gazetteer.len, gazetteer.entries.len(), gazetteer.skipped,
        );

        Ok(gazetteer)
    }

    pub fn from_reader(reader: impl Read, options: &GazetteerOptions) -> Result<Self> {
        let mut r = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers = r.byte_headers()?.clone();
        let column = |name: &str| -> Result<usize> {
            headers.iter()
                .position(|header| options.encoding.decode(header).is_ok_and(|h| h.trim() == name))
                .ok_or_else(|| anyhow!("reference table has no column {:?}", name))
        };

        let idx_name = column(&options.columns.name)?;
        let idx_latitude = column(&options.columns.latitude)?;
        let idx_longitude = column(&options.columns.longitude)?;

        let mut gazetteer = Gazetteer::default();

        let mut record = ByteRecord::new();
        while r.read_byte_record(&mut record)? {
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            let field = |idx: usize| -> Result<String> {
                let bytes = record.get(idx).ok_or_else(|| anyhow!("missing column {}", idx))?;
                options.encoding.decode(bytes)
            };

            let entry = field(idx_name).and_then(|name| {
                let point = Point::parse(&field(idx_latitude)?, &field(idx_longitude)?)?;
                Ok(ReferenceEntry { name: name.into(), point })
            });

            match entry {
                Ok(entry) => gazetteer.push(entry),
                Err(err) => {
                    // a broken reference row only costs us a candidate
                    warn!("Skip reference row at line {}: {:#}", line, err);
                    gazetteer.skipped += 1;
                }
            }
        }

        Ok(gazetteer)
    }

    fn push(&mut self, entry: ReferenceEntry) {
        let key = CanonicalName::new(&entry.name);
        self.entries.entry(key).or_default().push(entry);
        self.len += 1;
    }

    /// All entries for the given name, compared case insensitive.
    pub fn lookup(&self, name: &str) -> &[ReferenceEntry] {
        let key = CanonicalName::new(name);

        let entries = self.entries.get(&key).map(Vec::as_slice).unwrap_or_default();
        debug!("Lookup {:?} found {} entries", key.as_str(), entries.len());

        entries
    }

    /// Number of entries, counting duplicate names.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of rows dropped while loading.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use anyhow::Result;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    use super::*;

    const CITIES: &str = "Country,City,AccentCity,Region,Population,Latitude,Longitude\n\
        fr,paris,Paris,A8,,48.8667,2.3333\n\
        us,paris,Paris,TX,,33.6608,-95.5553\n\
        us,springfield,Springfield,IL,,39.8,-89.6\n\
        xx,broken,Broken,00,,north,10\n";

    #[test]
    fn lookup_is_case_insensitive() -> Result<()> {
        let gazetteer = Gazetteer::from_reader(CITIES.as_bytes(), &GazetteerOptions::default())?;

        assert_eq!(gazetteer.lookup("SPRINGFIELD").len(), 1);
        assert_eq!(gazetteer.lookup("springfield")[0].point, Point::new(39.8, -89.6));
        assert!(gazetteer.lookup("Atlantis").is_empty());

        Ok(())
    }

    #[test]
    fn duplicates_keep_file_order() -> Result<()> {
        let gazetteer = Gazetteer::from_reader(CITIES.as_bytes(), &GazetteerOptions::default())?;

        let paris = gazetteer.lookup("paris");
        assert_eq!(paris.len(), 2);
        assert_eq!(paris[0].point, Point::new(48.8667, 2.3333));
        assert_eq!(paris[1].point, Point::new(33.6608, -95.5553));

        Ok(())
    }

    #[test]
    fn broken_rows_are_skipped() -> Result<()> {
        let gazetteer = Gazetteer::from_reader(CITIES.as_bytes(), &GazetteerOptions::default())?;

        assert_eq!(gazetteer.len(), 3);
        assert_eq!(gazetteer.skipped(), 1);

        Ok(())
    }

    #[test]
    fn missing_column_fails() {
        let options = GazetteerOptions {
            columns: Columns { name: "Name".into(), ..Columns::default() },
            ..GazetteerOptions::default()
        };

        let err = Gazetteer::from_reader(CITIES.as_bytes(), &options).err().unwrap();
        assert!(err.to_string().contains("Name"));
    }

    #[test]
    fn decodes_latin1_names() -> Result<()> {
        let mut data = b"AccentCity,Latitude,Longitude\n".to_vec();
        data.extend_from_slice(b"Z\xfcrich,47.37,8.55\n");

        let gazetteer = Gazetteer::from_reader(data.as_slice(), &GazetteerOptions::default())?;

        let entries = gazetteer.lookup("ZÜRICH");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name.as_str(), "Zürich");

        Ok(())
    }

    #[test]
    fn utf8_rejects_invalid_bytes() -> Result<()> {
        let mut data = b"AccentCity,Latitude,Longitude\n".to_vec();
        data.extend_from_slice(b"Z\xfcrich,47.37,8.55\n");

        let options = GazetteerOptions { encoding: Encoding::Utf8, ..GazetteerOptions::default() };
        let gazetteer = Gazetteer::from_reader(data.as_slice(), &options)?;

        assert!(gazetteer.is_empty());
        assert_eq!(gazetteer.skipped(), 1);

        Ok(())
    }

    #[test]
    fn loads_gzip_file() -> Result<()> {
        let file = tempfile::Builder::new().suffix(".csv.gz").tempfile()?;

        let mut encoder = GzEncoder::new(file.as_file(), Compression::default());
        encoder.write_all(CITIES.as_bytes())?;
        encoder.finish()?;

        let gazetteer = Gazetteer::load(file.path(), &GazetteerOptions::default())?;
        assert_eq!(gazetteer.lookup("Paris").len(), 2);

        Ok(())
    }
}
