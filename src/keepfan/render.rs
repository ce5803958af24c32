//! # Rendering
//!
//! Turns a [`Record`] into the textual form each sink writes. Every function
//! here is pure: same record in, same string out.
//!
//! Layout data (dates, escaping) is computed in Rust and handed to minijinja
//! templates embedded from `templates/`. Templates are loaded with
//! `trim_blocks` and `lstrip_blocks`, so a block tag on its own line emits
//! nothing; every line break in the output is one written in the template.

use crate::error::Result;
use crate::model::{count_words, ListItem, Record};
use minijinja::Environment;
use once_cell::sync::Lazy;
use serde::Serialize;

pub const TEXT_SUBHEADING_TEMPLATE: &str = include_str!("templates/text_subheading.tmp");
pub const TEXT_BODY_TEMPLATE: &str = include_str!("templates/text_body.tmp");
pub const MARKDOWN_TEMPLATE: &str = include_str!("templates/markdown.tmp");
pub const CONSOLE_TEMPLATE: &str = include_str!("templates/console.tmp");
pub const OUTLINE_TEMPLATE: &str = include_str!("templates/outline.tmp");

pub const OUTLINE_TITLE: &str = "Google Keep Export";

static TEMPLATES: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_filter("xml", xml_escape);
    env.set_loader(|name| {
        let source = match name {
            "text_subheading" => TEXT_SUBHEADING_TEMPLATE,
            "text_body" => TEXT_BODY_TEMPLATE,
            "markdown" => MARKDOWN_TEMPLATE,
            "console" => CONSOLE_TEMPLATE,
            "outline" => OUTLINE_TEMPLATE,
            _ => return Ok(None),
        };
        Ok(Some(source.to_string()))
    });
    env
});

fn render<T: Serialize>(name: &str, data: &T) -> Result<String> {
    Ok(TEMPLATES.get_template(name)?.render(data)?)
}

#[derive(Serialize)]
struct RecordView<'a> {
    title: &'a str,
    created: Option<String>,
    edited: Option<String>,
    text: &'a str,
    items: &'a [ListItem],
    tags: &'a [String],
}

impl<'a> RecordView<'a> {
    fn new(record: &'a Record) -> Self {
        Self {
            title: &record.display_title,
            created: record.created_date(),
            edited: record.edited_date(),
            text: &record.body_text,
            items: &record.list_items,
            tags: &record.tags,
        }
    }
}

/// The three blocks of the plain-text form, each already trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextParts {
    pub title: String,
    pub subheading: String,
    pub body: String,
}

impl TextParts {
    pub fn word_count(&self) -> usize {
        count_words(&[&self.title, &self.subheading, &self.body])
    }

    pub fn to_text(&self) -> String {
        format!("{}\n{}\n\n{}", self.title, self.subheading, self.body)
    }
}

pub fn text_parts(record: &Record) -> Result<TextParts> {
    let view = RecordView::new(record);
    Ok(TextParts {
        title: record.display_title.trim().to_string(),
        subheading: trim_block(&render("text_subheading", &view)?),
        body: trim_block(&render("text_body", &view)?),
    })
}

pub fn render_text(record: &Record) -> Result<String> {
    Ok(text_parts(record)?.to_text())
}

pub fn render_markdown(record: &Record) -> Result<String> {
    render("markdown", &RecordView::new(record))
}

#[derive(Serialize)]
struct ConsoleView<'a> {
    entry: &'a str,
    title: String,
    subheading: String,
    body: String,
}

pub fn render_console(record: &Record) -> Result<String> {
    let parts = text_parts(record)?;
    render(
        "console",
        &ConsoleView {
            entry: &record.entry,
            title: parts.title,
            subheading: parts.subheading,
            body: parts.body,
        },
    )
}

#[derive(Serialize)]
struct OutlineView<'a> {
    title: &'a str,
    notes: Vec<RecordView<'a>>,
}

pub fn render_outline(records: &[Record]) -> Result<String> {
    let view = OutlineView {
        title: OUTLINE_TITLE,
        notes: records.iter().map(RecordView::new).collect(),
    };
    render("outline", &view)
}

fn trim_block(s: &str) -> String {
    s.trim_matches(|c| c == '\n' || c == ' ').to_string()
}

fn xml_escape(value: String) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            '\t' => out.push_str("&#x9;"),
            c if !is_xml_char(c) => out.push('\u{FFFD}'),
            other => out.push(other),
        }
    }
    out
}

/// Characters allowed in an XML 1.0 document.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}
