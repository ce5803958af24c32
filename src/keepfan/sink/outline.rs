use super::Sink;
use crate::error::{KeepError, Result};
use crate::model::Record;
use crate::render::render_outline;
use crate::writer::FileWriter;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::info;

/// Buffers every record, in the order `accept` was called, and writes a single
/// OPML document on flush.
pub struct OutlineSink {
    output_file: PathBuf,
    writer: FileWriter,
    records: RwLock<Vec<Record>>,
}

impl OutlineSink {
    pub fn new(output_file: impl Into<PathBuf>, writer: FileWriter) -> Self {
        Self {
            output_file: output_file.into(),
            writer,
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_opml(&self) -> Result<String> {
        let records = self
            .records
            .read()
            .map_err(|_| KeepError::LockPoisoned("outline"))?;
        render_outline(&records)
    }
}

impl Sink for OutlineSink {
    fn name(&self) -> &str {
        "outline"
    }

    fn accept(&self, record: &Record) -> Result<()> {
        self.records
            .write()
            .map_err(|_| KeepError::LockPoisoned("outline"))?
            .push(record.clone());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let opml = self.to_opml()?;
        info!(notes = self.len(), path = %self.output_file.display(), "writing outline");
        self.writer.write_file(&self.output_file, opml.as_bytes())
    }
}
