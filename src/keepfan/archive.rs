//! # Archive Reader
//!
//! Walks a takeout zip and yields one [`Record`] per live note.
//!
//! Every entry name is checked with the zip crate's `enclosed_name` when the
//! archive is opened, before a single record is produced: an archive carrying
//! an entry that climbs out through `..`, is absolute, or holds a NUL byte is
//! rejected as a whole, so nothing downstream ever writes output for it.
//!
//! Filtering happens in this order: directories, extension, sub-folder
//! substring, then (after decoding) trashed/archived flags. Decode failures are
//! fatal and end the stream.

use crate::error::{KeepError, Result};
use crate::model::Record;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};
use zip::read::ZipFile;
use zip::ZipArchive;

pub const NOTE_EXTENSION: &str = "json";

/// Upper bound on the buffer reserved from an entry's declared size.
const MAX_PREALLOC: u64 = 1 << 20;

#[derive(Debug, Clone)]
pub struct ArchiveReader {
    sub_folder: String,
    default_tags: Vec<String>,
}

impl ArchiveReader {
    pub fn new(sub_folder: impl Into<String>, default_tags: Vec<String>) -> Self {
        Self {
            sub_folder: sub_folder.into(),
            default_tags,
        }
    }

    /// Opens `archive_path` and returns the lazy record stream.
    pub fn stream_records(&self, archive_path: &Path) -> Result<RecordStream> {
        let file = File::open(archive_path).map_err(|e| KeepError::ArchiveOpen {
            path: archive_path.to_path_buf(),
            source: e.into(),
        })?;
        let mut archive = ZipArchive::new(file).map_err(|e| KeepError::ArchiveOpen {
            path: archive_path.to_path_buf(),
            source: e,
        })?;

        for index in 0..archive.len() {
            let entry = archive
                .by_index_raw(index)
                .map_err(|e| entry_read_error(format!("#{index}"), e))?;
            if !entry.is_dir() {
                check_enclosed(&entry)?;
            }
        }

        info!(archive = %archive_path.display(), entries = archive.len(), "opened archive");
        Ok(RecordStream {
            reader: self.clone(),
            archive,
            next_index: 0,
            finished: false,
        })
    }

    fn wants(&self, name: &str) -> bool {
        let is_note = Path::new(name)
            .extension()
            .is_some_and(|ext| ext == NOTE_EXTENSION);
        if !is_note {
            debug!(entry = name, "skipping non-note entry");
            return false;
        }
        if !self.sub_folder.is_empty() && !name.contains(&self.sub_folder) {
            debug!(entry = name, sub_folder = %self.sub_folder, "skipping entry outside sub folder");
            return false;
        }
        true
    }
}

fn check_enclosed(entry: &ZipFile<'_>) -> Result<()> {
    match entry.enclosed_name() {
        Some(_) => Ok(()),
        None => Err(KeepError::PathTraversal {
            entry: entry.name().to_string(),
        }),
    }
}

fn entry_read_error(entry: String, reason: impl ToString) -> KeepError {
    KeepError::EntryRead {
        entry,
        reason: reason.to_string(),
    }
}

/// Lazy, single-pass sequence of records. After the first error it yields nothing.
pub struct RecordStream {
    reader: ArchiveReader,
    archive: ZipArchive<File>,
    next_index: usize,
    finished: bool,
}

impl RecordStream {
    fn read_entry(&mut self, index: usize) -> Result<Option<Record>> {
        let mut file = self
            .archive
            .by_index(index)
            .map_err(|e| entry_read_error(format!("#{index}"), e))?;
        let name = file.name().to_string();

        if file.is_dir() {
            return Ok(None);
        }
        check_enclosed(&file)?;
        if !self.reader.wants(&name) {
            return Ok(None);
        }

        // the declared size comes from the archive itself, so it only sizes a hint
        let mut bytes = Vec::with_capacity(file.size().min(MAX_PREALLOC) as usize);
        file.read_to_end(&mut bytes)
            .map_err(|e| entry_read_error(name.clone(), e))?;

        let record = Record::decode(&name, &bytes, &self.reader.default_tags)
            .map_err(|source| KeepError::Decode {
                entry: name.clone(),
                source,
            })?;

        if record.title_was_empty() {
            debug!(entry = %name, title = %record.display_title, "providing default title");
        }
        if !record.is_live() {
            info!(entry = %name, "skipping trashed or archived entry");
            return Ok(None);
        }
        Ok(Some(record))
    }
}

impl Iterator for RecordStream {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished && self.next_index < self.archive.len() {
            let index = self.next_index;
            self.next_index += 1;
            match self.read_entry(index) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}
