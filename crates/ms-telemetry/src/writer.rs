//! Durable CSV writer.
//!
//! The sink owns the output file for the whole run. Opening it discards any
//! previous file at the path and writes the header; each appended row is
//! flushed and synced before [`CsvSink::append_row`] returns, so after a crash
//! the file holds the header plus a whole number of rows.
//!
//! Cells are never quoted. Values containing separators are rejected before
//! they reach the sink.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};
use ms_common::{Error, Result, Schema};
use tracing::{debug, info};

use crate::row::Row;

/// Append-only CSV file for one sampling run.
pub struct CsvSink {
    writer: Writer<File>,
    path: PathBuf,
    width: usize,
    rows_written: u64,
}

impl std::fmt::Debug for CsvSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvSink")
            .field("path", &self.path)
            .field("width", &self.width)
            .field("rows_written", &self.rows_written)
            .finish()
    }
}

impl CsvSink {
    /// Recreate the file at `path` and write the schema's header line.
    pub fn open(path: impl AsRef<Path>, schema: &Schema) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let open_err = |source| Error::SinkOpen {
            path: path.clone(),
            source,
        };

        match fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "removed previous output file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(open_err(e)),
        }

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(open_err)?;

        let writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(file);

        let header = schema.header();
        let mut sink = Self {
            writer,
            width: header.len(),
            path,
            rows_written: 0,
        };
        sink.write_synced(&header).map_err(|e| match e {
            Error::SinkWrite(msg) => Error::SinkOpen {
                path: sink.path.clone(),
                source: std::io::Error::other(msg),
            },
            other => other,
        })?;

        info!(path = %sink.path.display(), columns = sink.width, "output file created");
        Ok(sink)
    }

    /// Append one row and sync it to disk.
    pub fn append_row(&mut self, row: &Row) -> Result<()> {
        let record: Vec<String> = row.record().collect();
        if record.len() != self.width {
            return Err(Error::SinkWrite(format!(
                "row has {} cells but the header has {}",
                record.len(),
                self.width
            )));
        }
        self.write_synced(&record)?;
        self.rows_written += 1;
        debug!(rows = self.rows_written, "row appended");
        Ok(())
    }

    /// Flush and release the file handle.
    pub fn close(mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| Error::SinkWrite(e.to_string()))?;
        self.writer
            .get_ref()
            .sync_all()
            .map_err(|e| Error::SinkWrite(e.to_string()))?;
        info!(path = %self.path.display(), rows = self.rows_written, "output file closed");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    fn write_synced(&mut self, record: &[String]) -> Result<()> {
        self.writer
            .write_record(record)
            .map_err(|e| Error::SinkWrite(e.to_string()))?;
        self.writer
            .flush()
            .map_err(|e| Error::SinkWrite(e.to_string()))?;
        self.writer
            .get_ref()
            .sync_data()
            .map_err(|e| Error::SinkWrite(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ms_common::Category;
    use tempfile::tempdir;

    fn schema() -> Schema {
        Schema::new(
            vec![Category::new("mem", ["resident", "virtual"])],
            "wiredTiger",
            vec![Category::new("cache", ["dirty bytes"])],
        )
    }

    fn row(secs: u32, values: &[&str]) -> Row {
        Row::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, secs).unwrap(),
            values.iter().map(|v| v.to_string()).collect(),
        )
    }

    #[test]
    fn open_writes_header_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        let sink = CsvSink::open(&path, &schema()).unwrap();
        assert_eq!(sink.rows_written(), 0);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "datetime,mem_resident,mem_virtual,cache_dirty-bytes\n"
        );
    }

    #[test]
    fn rows_are_unquoted_and_newline_terminated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        let mut sink = CsvSink::open(&path, &schema()).unwrap();
        sink.append_row(&row(0, &["100", "200", "5"])).unwrap();
        sink.close().unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "datetime,mem_resident,mem_virtual,cache_dirty-bytes\n\
             2024-01-01T00:00:00.000Z,100,200,5\n"
        );
    }

    #[test]
    fn wrong_width_row_is_rejected_without_writing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        let mut sink = CsvSink::open(&path, &schema()).unwrap();
        let err = sink.append_row(&row(0, &["100"])).unwrap_err();
        assert!(matches!(err, Error::SinkWrite(_)));
        assert_eq!(sink.rows_written(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 1);
    }

    #[test]
    fn open_in_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("stats.csv");
        let err = CsvSink::open(&path, &schema()).unwrap_err();
        assert!(matches!(err, Error::SinkOpen { .. }));
        assert_eq!(err.code(), 40);
    }

    #[test]
    fn empty_schema_writes_timestamp_only_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stats.csv");
        let empty = Schema::new(vec![], "wiredTiger", vec![]);
        let mut sink = CsvSink::open(&path, &empty).unwrap();
        sink.append_row(&row(1, &[])).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "datetime\n2024-01-01T00:00:01.000Z\n"
        );
    }
}
