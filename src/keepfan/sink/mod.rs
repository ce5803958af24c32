//! # Sinks
//!
//! A sink is one output adapter. The dispatcher knows sinks only through the
//! [`Sink`] trait and calls `accept` from several worker threads at once, so
//! every implementation is `Send + Sync` and guards its own mutable state.
//!
//! ## Implementations
//!
//! - [`console::ConsoleSink`]: fenced dump of each note to a writer (stdout
//!   by default). Stateless apart from the writer handle.
//! - [`file::FileSink`]: one file per note, text or markdown. Names come from
//!   the shared [`NameAllocator`](crate::naming::NameAllocator), which is what
//!   keeps concurrent writes on distinct paths.
//! - [`outline::OutlineSink`]: collects every note and writes one OPML
//!   document on flush.
//! - [`paged::PagedSink`]: packs notes into word-limited batches, each written
//!   as a numbered PDF.

use crate::error::Result;
use crate::model::Record;

pub mod console;
pub mod file;
pub mod outline;
pub mod paged;

/// An output adapter fed one record at a time.
pub trait Sink: Send + Sync {
    /// Short identifier used in logs and failure reports.
    fn name(&self) -> &str;

    /// Consume one record.
    fn accept(&self, record: &Record) -> Result<()>;

    /// Emit whatever was deferred. Called once, after the last `accept`.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
