//! Append-only schedule log on top of a [`RecordFs`].
//!
//! ```text
//!  append ─────────▶ schedule.txt  (one record per line)
//!
//!  remove(id):  schedule.txt ──decode──▶ filter ──▶ schedule.tmp
//!               remove(schedule.txt)
//!               rename(schedule.tmp → schedule.txt)
//! ```
//!
//! The rewrite is not atomic: between the remove and the rename no log
//! exists, and a power loss there leaves only the staging file.  Loads that
//! hit that window see `StorageError::Unavailable` and the cache stays
//! empty until the next successful reload.

use std::io::Write;

use log::{debug, info, warn};

use super::record::{RecordDecoder, ScheduleRecord, encode_one};
use crate::app::ports::{RecordFs, StorageError};

pub struct ScheduleStore<F: RecordFs> {
    fs: F,
    path: String,
    staging_path: String,
}

impl<F: RecordFs> ScheduleStore<F> {
    pub fn new(fs: F, path: impl Into<String>, staging_path: impl Into<String>) -> Self {
        Self {
            fs,
            path: path.into(),
            staging_path: staging_path.into(),
        }
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    /// Persist one record at the end of the log.
    pub fn append(&self, record: &ScheduleRecord) -> Result<(), StorageError> {
        let mut out = self.fs.open_append(&self.path)?;
        writeln!(out, "{}", encode_one(record)).map_err(|_| StorageError::Io)?;
        out.flush().map_err(|_| StorageError::Io)?;
        debug!("store: appended '{}'", record.identifier);
        Ok(())
    }

    /// Drop every record whose identifier equals `identifier`, keeping the
    /// relative order of the rest.  Returns how many were dropped.
    ///
    /// Anything after the first malformed record is not carried over.
    pub fn remove_by_identifier(&self, identifier: &str) -> Result<usize, StorageError> {
        let mut records = self.records()?;
        let mut staging = self.fs.open_write(&self.staging_path)?;

        let mut kept = 0usize;
        let mut removed = 0usize;
        for record in records.by_ref() {
            if record.identifier.as_str() == identifier {
                removed += 1;
                continue;
            }
            writeln!(staging, "{}", encode_one(&record)).map_err(|_| StorageError::Io)?;
            kept += 1;
        }
        if records.failed() {
            warn!("store: malformed record dropped during rewrite");
        }
        staging.flush().map_err(|_| StorageError::Io)?;
        drop(staging);
        drop(records);

        self.fs.remove(&self.path)?;
        self.fs.rename(&self.staging_path, &self.path)?;
        info!(
            "store: removed {} record(s) with id '{}', {} kept",
            removed, identifier, kept
        );
        Ok(removed)
    }

    /// Streaming view of the log in file order.
    pub fn records(&self) -> Result<RecordDecoder<F::Reader>, StorageError> {
        let reader = self.fs.open_read(&self.path)?;
        Ok(RecordDecoder::new(reader))
    }

    /// Every decodable record in file order.  A malformed record truncates.
    pub fn load_all(&self) -> Result<Vec<ScheduleRecord>, StorageError> {
        let mut records = self.records()?;
        let all: Vec<_> = records.by_ref().collect();
        if records.failed() {
            warn!("store: log truncated at record {}", all.len());
        }
        Ok(all)
    }

    /// Whether a record with `identifier` is stored.
    pub fn contains(&self, identifier: &str) -> Result<bool, StorageError> {
        match self.records() {
            Ok(mut records) => Ok(records.any(|r| r.identifier.as_str() == identifier)),
            // No log yet means nothing is stored.
            Err(StorageError::Unavailable) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
