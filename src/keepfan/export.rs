//! Wires a validated [`ExportConfig`] into a reader, a shared name allocator,
//! the selected sinks and a dispatcher, then runs the export.

use crate::archive::ArchiveReader;
use crate::config::ExportConfig;
use crate::dispatch::{Dispatcher, RunReport};
use crate::error::{KeepError, Result};
use crate::naming::NameAllocator;
use crate::sink::console::ConsoleSink;
use crate::sink::file::{FileFormat, FileSink};
use crate::sink::outline::OutlineSink;
use crate::sink::paged::PagedSink;
use crate::sink::Sink;
use crate::writer::FileWriter;
use std::sync::Arc;
use tracing::info;

/// Builds the sinks the config asks for. Text and markdown share one allocator,
/// so a note gets the same base name in both directories.
pub fn build_sinks(config: &ExportConfig) -> Vec<Box<dyn Sink>> {
    let writer = FileWriter::new(config.create_dirs);
    let names = Arc::new(
        NameAllocator::new(config.name_strategy)
            .with_year_folders(config.year_folders)
            .with_month_folders(config.effective_month_folders()),
    );

    let mut sinks: Vec<Box<dyn Sink>> = Vec::new();
    if config.console {
        sinks.push(Box::new(ConsoleSink::stdout()));
    }
    if let Some(dir) = &config.text_dir {
        sinks.push(Box::new(FileSink::new(
            FileFormat::Text,
            dir,
            Arc::clone(&names),
            writer,
        )));
    }
    if let Some(dir) = &config.markdown_dir {
        sinks.push(Box::new(FileSink::new(
            FileFormat::Markdown,
            dir,
            Arc::clone(&names),
            writer,
        )));
    }
    if let Some(file) = &config.outline_file {
        sinks.push(Box::new(OutlineSink::new(file, writer)));
    }
    if let Some(dir) = &config.paged_dir {
        sinks.push(Box::new(PagedSink::new(dir, config.word_limit, writer)));
    }
    sinks
}

pub fn build_dispatcher(config: &ExportConfig, sinks: Vec<Box<dyn Sink>>) -> Result<Dispatcher> {
    let dispatcher = Dispatcher::new(sinks);
    match config.workers {
        Some(threads) => dispatcher.with_threads(threads),
        None => Ok(dispatcher),
    }
}

/// Validates the config, streams the archive through every selected sink and
/// returns the run report. Archive-level failures come back as `Err`.
pub fn run_export(config: &ExportConfig) -> Result<RunReport> {
    config.validate()?;
    let archive = config
        .archive
        .as_deref()
        .ok_or_else(|| KeepError::Config("No archive given".into()))?;

    let reader = ArchiveReader::new(&config.sub_folder, config.default_tags.clone());
    let records = reader.stream_records(archive)?;

    let dispatcher = build_dispatcher(config, build_sinks(config))?;
    info!(sinks = ?dispatcher.sink_names(), strategy = %config.name_strategy, "starting export");
    dispatcher.run(records)
}
