use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub text: String,
    pub checked: bool,
}

impl ListItem {
    pub fn new(text: impl Into<String>, checked: bool) -> Self {
        Self {
            text: text.into(),
            checked,
        }
    }
}

/// One exported note, normalized.
///
/// Records are shared read-only between sinks once dispatched, so nothing
/// here offers mutation beyond the builder-style constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Full path of the archive entry this record was decoded from.
    pub entry: String,
    /// Entry file name without extension; the fallback identity.
    pub source_name: String,
    /// Title as found in the export, possibly empty.
    pub title: String,
    /// `title`, or `source_name` when the export carried no title.
    pub display_title: String,
    pub body_text: String,
    pub list_items: Vec<ListItem>,
    pub tags: Vec<String>,
    pub trashed: bool,
    pub archived: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub edited_at: Option<DateTime<Utc>>,
}

impl Record {
    pub fn new(entry: impl Into<String>, title: impl Into<String>) -> Self {
        let entry = entry.into();
        let source_name = source_name_for(&entry);
        let title = title.into();
        let display_title = if title.is_empty() {
            source_name.clone()
        } else {
            title.clone()
        };
        Self {
            entry,
            source_name,
            title,
            display_title,
            body_text: String::new(),
            list_items: Vec::new(),
            tags: Vec::new(),
            trashed: false,
            archived: false,
            created_at: None,
            edited_at: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body_text = body.into();
        self
    }

    pub fn with_items(mut self, items: Vec<ListItem>) -> Self {
        self.list_items = items;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_created(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn with_edited(mut self, at: DateTime<Utc>) -> Self {
        self.edited_at = Some(at);
        self
    }

    /// Decodes one archive entry. Default tags land after the note's own labels.
    pub fn decode(
        entry: &str,
        bytes: &[u8],
        default_tags: &[String],
    ) -> std::result::Result<Self, serde_json::Error> {
        let raw: RawNote = serde_json::from_slice(bytes)?;

        let mut tags: Vec<String> = raw.labels.into_iter().map(|l| l.name).collect();
        tags.extend(default_tags.iter().cloned());

        let mut record = Record::new(entry, raw.title);
        record.body_text = raw.text_content;
        record.list_items = raw
            .list_content
            .into_iter()
            .map(|item| ListItem::new(item.text, item.is_checked))
            .collect();
        record.tags = tags;
        record.trashed = raw.is_trashed;
        record.archived = raw.is_archived;
        record.created_at = raw.created_timestamp_usec;
        record.edited_at = raw.user_edited_timestamp_usec;
        Ok(record)
    }

    /// Trashed and archived notes never leave the archive reader.
    pub fn is_live(&self) -> bool {
        !self.trashed && !self.archived
    }

    pub fn title_was_empty(&self) -> bool {
        self.title.is_empty()
    }

    pub fn created_date(&self) -> Option<String> {
        self.created_at.map(|at| at.format(DATE_FORMAT).to_string())
    }

    pub fn edited_date(&self) -> Option<String> {
        self.edited_at.map(|at| at.format(DATE_FORMAT).to_string())
    }
}

/// `Takeout/Keep/Groceries.json` -> `Groceries`
pub fn source_name_for(entry: &str) -> String {
    let path = Path::new(entry);
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| entry.to_string())
}

/// Counts whitespace-delimited words across all parts, in order.
pub fn count_words(parts: &[&str]) -> usize {
    parts.iter().map(|p| p.split_whitespace().count()).sum()
}

/// On-disk schema of a Keep takeout note. Unknown fields are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNote {
    #[serde(default)]
    title: String,
    #[serde(default)]
    text_content: String,
    #[serde(default)]
    is_trashed: bool,
    #[serde(default)]
    is_archived: bool,
    #[serde(default)]
    list_content: Vec<RawListItem>,
    #[serde(default)]
    labels: Vec<RawLabel>,
    #[serde(default, deserialize_with = "micros")]
    user_edited_timestamp_usec: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "micros")]
    created_timestamp_usec: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawListItem {
    #[serde(default)]
    text: String,
    #[serde(default)]
    is_checked: bool,
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    name: String,
}

fn micros<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(usec) = Option::<i64>::deserialize(deserializer)? else {
        return Ok(None);
    };
    DateTime::from_timestamp_micros(usec)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {usec}")))
}
