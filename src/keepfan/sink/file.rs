use super::Sink;
use crate::error::Result;
use crate::model::Record;
use crate::naming::NameAllocator;
use crate::render::{render_markdown, render_text};
use crate::writer::FileWriter;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Text,
    Markdown,
}

impl FileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Text => "txt",
            FileFormat::Markdown => "md",
        }
    }

    fn render(self, record: &Record) -> Result<String> {
        match self {
            FileFormat::Text => render_text(record),
            FileFormat::Markdown => render_markdown(record),
        }
    }
}

/// Writes every record to `<out_dir>/<base name>.<ext>`.
pub struct FileSink {
    format: FileFormat,
    out_dir: PathBuf,
    names: Arc<NameAllocator>,
    writer: FileWriter,
}

impl FileSink {
    pub fn new(
        format: FileFormat,
        out_dir: impl Into<PathBuf>,
        names: Arc<NameAllocator>,
        writer: FileWriter,
    ) -> Self {
        Self {
            format,
            out_dir: out_dir.into(),
            names,
            writer,
        }
    }

    fn destination(&self, base_name: &str) -> PathBuf {
        self.out_dir
            .join(format!("{}.{}", base_name, self.format.extension()))
    }
}

impl Sink for FileSink {
    fn name(&self) -> &str {
        match self.format {
            FileFormat::Text => "text",
            FileFormat::Markdown => "markdown",
        }
    }

    fn accept(&self, record: &Record) -> Result<()> {
        let base_name = self.names.allocate(record)?;
        let content = self.format.render(record)?;
        let destination = self.destination(&base_name);
        debug!(entry = %record.entry, path = %destination.display(), "writing note");
        self.writer.write_file(&destination, content.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KeepError;
    use crate::model::ListItem;
    use crate::naming::NameStrategy;
    use chrono::{TimeZone, Utc};
    use std::fs;
    use tempfile::TempDir;

    fn sink(dir: &TempDir, format: FileFormat, names: Arc<NameAllocator>) -> FileSink {
        FileSink::new(format, dir.path(), names, FileWriter::new(true))
    }

    #[test]
    fn test_text_file_named_after_entry() {
        let dir = TempDir::new().unwrap();
        let names = Arc::new(NameAllocator::new(NameStrategy::Direct));
        let record = Record::new("Takeout/Keep/Groceries.json", "Groceries")
            .with_body("buy milk")
            .with_items(vec![ListItem::new("eggs", false)])
            .with_tags(vec!["home".into()]);

        sink(&dir, FileFormat::Text, names).accept(&record).unwrap();

        let content = fs::read_to_string(dir.path().join("Groceries.txt")).unwrap();
        assert!(content.starts_with("Groceries\n"));
        assert!(content.contains("buy milk"));
        assert!(content.contains("[ ] eggs"));
        assert!(content.contains("\n#home"));
    }

    #[test]
    fn test_text_and_markdown_share_base_name() {
        let dir = TempDir::new().unwrap();
        let names = Arc::new(NameAllocator::new(NameStrategy::FavorDate));
        let record = Record::new("Keep/a.json", "A")
            .with_created(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());

        sink(&dir, FileFormat::Text, Arc::clone(&names))
            .accept(&record)
            .unwrap();
        sink(&dir, FileFormat::Markdown, names).accept(&record).unwrap();

        assert!(dir.path().join("2024-05-01.txt").exists());
        assert!(dir.path().join("2024-05-01.md").exists());
    }

    #[test]
    fn test_year_folders_created_on_demand() {
        let dir = TempDir::new().unwrap();
        let names = Arc::new(
            NameAllocator::new(NameStrategy::Direct)
                .with_year_folders(true)
                .with_month_folders(true),
        );
        let record = Record::new("Keep/a.json", "A")
            .with_created(Utc.with_ymd_and_hms(2021, 12, 24, 0, 0, 0).unwrap());

        sink(&dir, FileFormat::Markdown, names).accept(&record).unwrap();
        assert!(dir.path().join("2021/12-December/a.md").exists());
    }

    #[test]
    fn test_missing_timestamp_is_reported() {
        let dir = TempDir::new().unwrap();
        let names = Arc::new(NameAllocator::new(NameStrategy::DateAndTitle));
        let err = sink(&dir, FileFormat::Text, names)
            .accept(&Record::new("Keep/a.json", "A"))
            .unwrap_err();
        assert!(matches!(err, KeepError::MissingTimestamp { .. }));
    }
}
