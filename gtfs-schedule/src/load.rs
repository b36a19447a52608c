//! Load entry point: archive bytes to a published-ready [`GtfsData`].
//!
//! The pipeline runs start to finish in private state: parse each table,
//! build records, resolve references, expand calendars. Only a model that
//! passed every step is returned; any error discards all partial work.

use std::collections::BTreeMap;
use std::io::{Read, Seek};
use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::build::EntityBuilder;
use crate::error::LoadError;
use crate::resolve::resolve;
use crate::schedule::GtfsData;
use crate::table::{KNOWN_TABLES, TableReader, TableSchema};

/// Options for loading a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Ignore files that are not GTFS tables this crate reads.
    pub allow_unknown_file: bool,
    /// Ignore undeclared columns instead of failing.
    pub allow_unknown_field: bool,
}

impl LoadOptions {
    pub fn with_allow_unknown_file(mut self, allow: bool) -> Self {
        self.allow_unknown_file = allow;
        self
    }

    pub fn with_allow_unknown_field(mut self, allow: bool) -> Self {
        self.allow_unknown_field = allow;
        self
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            allow_unknown_file: true,
            allow_unknown_field: false,
        }
    }
}

/// The files of a feed, by name.
///
/// Zero-byte files are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedArchive {
    files: BTreeMap<String, Vec<u8>>,
}

impl FeedArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(name.into(), bytes);
    }

    /// Read every file of a zip archive.
    ///
    /// Directory entries are skipped and members in sub-directories are
    /// keyed by their base name. Two non-empty members with the same base
    /// name are rejected.
    pub fn from_zip<R: Read + Seek>(reader: R) -> Result<Self, LoadError> {
        let mut zipped = zip::ZipArchive::new(reader)?;
        let mut archive = Self::new();
        for i in 0..zipped.len() {
            let mut file = zipped.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file
                .name()
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string();
            let mut bytes = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
            file.read_to_end(&mut bytes)?;
            if !bytes.is_empty() && archive.get(&name).is_some() {
                return Err(LoadError::DuplicateFile { file: name });
            }
            debug!(file = %name, bytes = bytes.len(), "read archive member");
            if !bytes.is_empty() || archive.get(&name).is_none() {
                archive.insert(name, bytes);
            }
        }
        Ok(archive)
    }

    /// Open and read a zip file.
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let file = std::fs::File::open(path)?;
        Self::from_zip(std::io::BufReader::new(file))
    }

    /// Contents of a file, `None` if absent or empty.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files
            .get(name)
            .map(Vec::as_slice)
            .filter(|b| !b.is_empty())
    }

    /// File names, sorted.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

/// Load a feed from its files.
pub fn load_feed(archive: &FeedArchive, options: &LoadOptions) -> Result<GtfsData, LoadError> {
    let started = Instant::now();

    for name in archive.file_names() {
        if TableSchema::for_file(name).is_some() {
            continue;
        }
        if !options.allow_unknown_file {
            return Err(LoadError::UnknownFile {
                file: name.to_string(),
            });
        }
        warn!(file = name, "ignoring unknown file");
    }

    let mut builder = EntityBuilder::new();
    for schema in KNOWN_TABLES {
        let Some(bytes) = archive.get(schema.file) else {
            if schema.required {
                return Err(LoadError::MissingRequiredTable { table: schema.file });
            }
            debug!(table = schema.file, "optional table absent");
            continue;
        };
        let mut rows = 0usize;
        for row in TableReader::new(schema, bytes, options.allow_unknown_field)? {
            builder.add_row(&row?)?;
            rows += 1;
        }
        info!(table = schema.file, rows, "parsed table");
    }

    let resolved = resolve(builder.finish())?;
    let model = GtfsData::new(resolved, Utc::now());

    let counts = model.counts();
    info!(
        routes = counts.routes,
        stops = counts.stops,
        trips = counts.trips,
        services = counts.services,
        version = model.feed_version().unwrap_or("-"),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "feed loaded"
    );
    Ok(model)
}

/// Load a feed from a zip file on disk.
pub fn load_zip(path: &Path, options: &LoadOptions) -> Result<GtfsData, LoadError> {
    info!(path = %path.display(), "loading feed archive");
    load_feed(&FeedArchive::open(path)?, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_feed::TestFeed;
    use std::io::Cursor;

    #[test]
    fn default_options() {
        let options = LoadOptions::default();
        assert!(options.allow_unknown_file);
        assert!(!options.allow_unknown_field);

        let options = options
            .with_allow_unknown_file(false)
            .with_allow_unknown_field(true);
        assert!(!options.allow_unknown_file);
        assert!(options.allow_unknown_field);
    }

    #[test]
    fn empty_file_counts_as_absent() {
        let mut archive = FeedArchive::new();
        archive.insert("shapes.txt", Vec::new());
        archive.insert("agency.txt", b"agency_name".to_vec());
        assert_eq!(archive.get("shapes.txt"), None);
        assert_eq!(archive.get("agency.txt"), Some(&b"agency_name"[..]));
        assert_eq!(archive.get("stops.txt"), None);
    }

    #[test]
    fn reads_zip_members() {
        let bytes = TestFeed::dublin().zip_bytes();
        let archive = FeedArchive::from_zip(Cursor::new(bytes)).unwrap();
        let names: Vec<_> = archive.file_names().collect();
        assert!(names.contains(&"stop_times.txt"));
        assert!(names.contains(&"feed_info.txt"));
        assert_eq!(archive, TestFeed::dublin().archive());
    }

    #[test]
    fn nested_and_directory_members() {
        use std::io::Write;
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        writer.add_directory("gtfs/", options).unwrap();
        writer.start_file("gtfs/agency.txt", options).unwrap();
        writer.write_all(b"agency_name").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let archive = FeedArchive::from_zip(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.file_names().collect::<Vec<_>>(), ["agency.txt"]);
    }

    #[test]
    fn repeated_base_name_is_rejected() {
        use std::io::Write;
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("old/stops.txt", options).unwrap();
        writer.write_all(b"stop_id,stop_name\nS1,Old").unwrap();
        writer.start_file("new/stops.txt", options).unwrap();
        writer.write_all(b"stop_id,stop_name\nS1,New").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = FeedArchive::from_zip(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateFile { ref file } if file == "stops.txt"));
    }

    #[test]
    fn empty_duplicate_does_not_hide_member() {
        use std::io::Write;
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("gtfs/agency.txt", options).unwrap();
        writer.write_all(b"agency_name").unwrap();
        writer.start_file("agency.txt", options).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let archive = FeedArchive::from_zip(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.get("agency.txt"), Some(&b"agency_name"[..]));
    }

    #[test]
    fn garbage_is_archive_error() {
        let err = FeedArchive::from_zip(Cursor::new(b"not a zip".to_vec())).unwrap_err();
        assert!(matches!(err, LoadError::Archive(_)));
    }

    #[test]
    fn missing_archive_is_io_error() {
        let err =
            load_zip(Path::new("/nonexistent/feed.zip"), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }
}
