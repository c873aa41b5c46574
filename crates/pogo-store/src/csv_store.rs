use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use pogo_core::{FriendRecord, StampedFriend, Team};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::RecordStore;

/// Column order of the store file. Written once when the file is created.
pub const HEADER: [&str; 6] = ["Name", "Level", "Code", "Location", "Team", "Date Added"];

/// One line of the CSV file. Field order must match [`HEADER`].
#[derive(Debug, Serialize, Deserialize)]
struct StoredRow {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Level")]
    level: String,
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Location")]
    location: String,
    #[serde(rename = "Team")]
    team: Team,
    #[serde(rename = "Date Added")]
    date_added: NaiveDate,
}

impl From<&StampedFriend> for StoredRow {
    fn from(friend: &StampedFriend) -> Self {
        let r = &friend.record;
        Self {
            name: r.name.clone(),
            level: r.level.clone(),
            code: r.code.clone(),
            location: r.location.clone(),
            team: r.team,
            date_added: friend.date_added,
        }
    }
}

impl From<StoredRow> for StampedFriend {
    fn from(row: StoredRow) -> Self {
        FriendRecord {
            name: row.name,
            level: row.level,
            code: row.code,
            location: row.location,
            team: row.team,
        }
        .stamp(row.date_added)
    }
}

/// Friend-code store backed by a single CSV file.
///
/// Each call opens, uses and closes the file, so an operator can inspect or
/// copy it between poll cycles. A missing file reads as an empty store.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn csv_err(&self, err: csv::Error) -> StoreError {
        if err.is_io_error() {
            if let csv::ErrorKind::Io(source) = err.into_kind() {
                return self.io_err(source);
            }
            return StoreError::Corrupt {
                path: self.path.clone(),
                reason: "unreadable".to_string(),
            };
        }
        StoreError::Corrupt {
            path: self.path.clone(),
            reason: err.to_string(),
        }
    }

    fn read_rows(&self) -> Result<Vec<StoredRow>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_err(e)),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);
        let headers = reader.headers().map_err(|e| self.csv_err(e))?.clone();
        if headers.is_empty() {
            return Ok(Vec::new());
        }
        if !headers.iter().eq(HEADER.iter().copied()) {
            return Err(StoreError::Corrupt {
                path: self.path.clone(),
                reason: format!(
                    "unexpected header [{}]",
                    headers.iter().collect::<Vec<_>>().join(", ")
                ),
            });
        }

        // A short or garbled data row is skipped so the codes of every other
        // row still take part in deduplication.
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| self.csv_err(e))?;
            match record.deserialize::<StoredRow>(Some(&headers)) {
                Ok(row) => rows.push(row),
                Err(e) => tracing::warn!(
                    path = %self.path.display(),
                    line = record.position().map(csv::Position::line),
                    error = %e,
                    "skipping malformed store row"
                ),
            }
        }
        Ok(rows)
    }

    /// Opens the file for appending, creating it (and parent directories) if
    /// needed. Returns the handle and whether the header still has to be written.
    fn open_for_append(&self) -> Result<(File, bool), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
            }
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;

        let len = file.metadata().map_err(|e| self.io_err(e))?.len();
        if len == 0 {
            return Ok((file, true));
        }

        // A hand-edited file may lack the final newline; the next row must
        // still start on its own line.
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1)).map_err(|e| self.io_err(e))?;
        file.read_exact(&mut last).map_err(|e| self.io_err(e))?;
        if last[0] != b'\n' {
            file.write_all(b"\n").map_err(|e| self.io_err(e))?;
        }
        Ok((file, false))
    }
}

impl RecordStore for CsvStore {
    fn all_codes(&self) -> Result<HashSet<String>, StoreError> {
        Ok(self.read_rows()?.into_iter().map(|row| row.code).collect())
    }

    fn append(&self, friend: &StampedFriend) -> Result<(), StoreError> {
        let (file, needs_header) = self.open_for_append()?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer
            .serialize(StoredRow::from(friend))
            .map_err(|e| self.csv_err(e))?;
        writer.flush().map_err(|e| self.io_err(e))?;

        tracing::debug!(
            path = %self.path.display(),
            code = %friend.record.code,
            "appended friend row"
        );
        Ok(())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.read_rows()?.len())
    }

    fn load_all(&self) -> Result<Vec<StampedFriend>, StoreError> {
        Ok(self
            .read_rows()?
            .into_iter()
            .map(StampedFriend::from)
            .collect())
    }
}

#[cfg(test)]
#[path = "csv_store_test.rs"]
mod tests;
