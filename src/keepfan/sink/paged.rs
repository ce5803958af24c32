//! Word-limited paginated output.
//!
//! Notes are packed greedily: a note goes into the open batch unless that
//! would push the batch past the word limit, in which case the batch is closed
//! first. Notes are never split, so a single note longer than the limit gets a
//! batch of its own. Each closed batch becomes `out_<n>.pdf`, one note per page.
//!
//! The decision and the mutation happen under the same lock, so two notes
//! arriving together cannot both see room in the same batch.

use super::Sink;
use crate::error::{KeepError, Result};
use crate::model::Record;
use crate::render::{text_parts, TextParts};
use crate::writer::FileWriter;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

pub const DEFAULT_WORD_LIMIT: usize = 5000;

const DOCUMENT_TITLE: &str = "Google Keep Export";
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const TITLE_SIZE: f32 = 14.0;
const SUBHEADING_SIZE: f32 = 10.0;
const BODY_SIZE: f32 = 12.0;
const WRAP_COLUMNS: usize = 85;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub path: PathBuf,
    pub pages: usize,
    pub words: usize,
}

#[derive(Default)]
struct Batch {
    pages: Vec<TextParts>,
    words: usize,
}

#[derive(Default)]
struct PagedState {
    batch: Batch,
    sequence: usize,
    closed: Vec<BatchSummary>,
}

pub struct PagedSink {
    out_dir: PathBuf,
    word_limit: usize,
    writer: FileWriter,
    state: Mutex<PagedState>,
}

impl PagedSink {
    pub fn new(out_dir: impl Into<PathBuf>, word_limit: usize, writer: FileWriter) -> Self {
        Self {
            out_dir: out_dir.into(),
            word_limit,
            writer,
            state: Mutex::new(PagedState::default()),
        }
    }

    /// Batches written so far, oldest first.
    pub fn closed_batches(&self) -> Vec<BatchSummary> {
        self.state
            .lock()
            .map(|s| s.closed.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, PagedState>> {
        self.state
            .lock()
            .map_err(|_| KeepError::LockPoisoned("paged batch"))
    }

    /// Writes the open batch, if any, and starts a fresh one. The batch is
    /// consumed and the sequence advances even when the write fails.
    fn close_batch(&self, state: &mut PagedState) -> Result<()> {
        if state.batch.pages.is_empty() {
            return Ok(());
        }
        let batch = std::mem::take(&mut state.batch);
        let path = self.out_dir.join(format!("out_{}.pdf", state.sequence));
        state.sequence += 1;

        info!(words = batch.words, pages = batch.pages.len(), path = %path.display(), "flushing batch");
        let bytes = build_pdf(&batch.pages)?;
        self.writer.write_file(&path, &bytes)?;

        state.closed.push(BatchSummary {
            path,
            pages: batch.pages.len(),
            words: batch.words,
        });
        Ok(())
    }
}

impl Sink for PagedSink {
    fn name(&self) -> &str {
        "paged"
    }

    fn accept(&self, record: &Record) -> Result<()> {
        let parts = text_parts(record)?;
        let words = parts.word_count();

        let mut state = self.lock()?;
        let closed = if !state.batch.pages.is_empty() && state.batch.words + words > self.word_limit
        {
            self.close_batch(&mut state)
        } else {
            Ok(())
        };
        state.batch.pages.push(parts);
        state.batch.words += words;
        closed
    }

    fn flush(&self) -> Result<()> {
        let mut state = self.lock()?;
        self.close_batch(&mut state)
    }
}

struct PageWriter<'a> {
    doc: &'a printpdf::PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl PageWriter<'_> {
    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "notes");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn lines(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        let step = size * 0.5;
        for line in wrap(text, WRAP_COLUMNS) {
            if self.y - step < MARGIN {
                self.new_page();
            }
            self.layer
                .use_text(line, size, Mm(MARGIN), Mm(self.y), font);
            self.y -= step;
        }
    }

    fn gap(&mut self, mm: f32) {
        self.y -= mm;
    }
}

fn document_error<E: std::fmt::Debug>(e: E) -> KeepError {
    KeepError::Document(format!("{:?}", e))
}

fn build_pdf(pages: &[TextParts]) -> Result<Vec<u8>> {
    let (doc, page, layer) =
        PdfDocument::new(DOCUMENT_TITLE, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "notes");
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(document_error)?;
    let oblique = doc
        .add_builtin_font(BuiltinFont::HelveticaOblique)
        .map_err(document_error)?;
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(document_error)?;

    {
        let mut writer = PageWriter {
            doc: &doc,
            layer: doc.get_page(page).get_layer(layer),
            y: PAGE_HEIGHT - MARGIN,
        };
        for (i, parts) in pages.iter().enumerate() {
            if i > 0 {
                writer.new_page();
            }
            writer.lines(&parts.title, TITLE_SIZE, &bold);
            writer.lines(&parts.subheading, SUBHEADING_SIZE, &oblique);
            writer.gap(5.0);
            writer.lines(&parts.body, BODY_SIZE, &regular);
        }
    }

    doc.save_to_bytes().map_err(document_error)
}

/// Greedy word wrap; blank source lines are kept so paragraphs stay apart.
fn wrap(text: &str, columns: usize) -> Vec<String> {
    let mut out = Vec::new();
    for source in text.lines() {
        let mut line = String::new();
        for word in source.split_whitespace() {
            if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > columns {
                out.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        out.push(line);
    }
    out
}
