//! # Name Allocator
//!
//! Hands out output base names (relative path, no extension) that are unique
//! for the whole run.
//!
//! ## Strategies
//!
//! - `direct`: the entry's file stem.
//! - `favor_date`: `YYYY-MM-DD`, falling back to `YYYY-MM-DD_<stem>`.
//! - `date_and_title`: `YYYY-MM-DD_<title>` (or just the date for untitled
//!   notes), falling back to `YYYY-MM-DD_<stem>`.
//!
//! With year folders the name is prefixed with `YYYY/`, and with month folders
//! additionally with `MM-Month/`.
//!
//! ## Collisions
//!
//! The fallback decision compares the fully composed candidate (folder prefix
//! included) against everything reserved so far. For `date_and_title` this is
//! the title-qualified name, so two same-day notes with different titles never
//! collide, and two same-day notes with the same title resolve to
//! `<date>_<title>` and `<date>_<stem>`. Should the fallback itself be taken
//! (two entries sharing a stem in different archive folders), `_1`, `_2`, ...
//! is appended.
//!
//! The whole check-then-reserve sequence runs under one mutex. A record asking
//! twice (text and markdown sinks both enabled) gets the name it was first
//! given.

use crate::error::{KeepError, Result};
use crate::model::{Record, DATE_FORMAT};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameStrategy {
    #[default]
    #[serde(alias = "direct_export")]
    Direct,
    FavorDate,
    DateAndTitle,
}

impl NameStrategy {
    pub fn needs_date(self) -> bool {
        !matches!(self, NameStrategy::Direct)
    }
}

impl FromStr for NameStrategy {
    type Err = KeepError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "direct" | "direct_export" => Ok(NameStrategy::Direct),
            "favor_date" => Ok(NameStrategy::FavorDate),
            "date_and_title" => Ok(NameStrategy::DateAndTitle),
            other => Err(KeepError::Config(format!("Unknown name strategy: {}", other))),
        }
    }
}

impl fmt::Display for NameStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NameStrategy::Direct => "direct",
            NameStrategy::FavorDate => "favor_date",
            NameStrategy::DateAndTitle => "date_and_title",
        };
        f.write_str(name)
    }
}

#[derive(Default)]
struct Reservations {
    reserved: HashSet<String>,
    issued: HashMap<String, String>,
}

pub struct NameAllocator {
    strategy: NameStrategy,
    year_folders: bool,
    month_folders: bool,
    state: Mutex<Reservations>,
}

impl NameAllocator {
    pub fn new(strategy: NameStrategy) -> Self {
        Self {
            strategy,
            year_folders: false,
            month_folders: false,
            state: Mutex::new(Reservations::default()),
        }
    }

    pub fn with_year_folders(mut self, enabled: bool) -> Self {
        self.year_folders = enabled;
        self
    }

    /// Only takes effect together with year folders.
    pub fn with_month_folders(mut self, enabled: bool) -> Self {
        self.month_folders = enabled;
        self
    }

    /// Returns the record's base name, reserving it on first call.
    pub fn allocate(&self, record: &Record) -> Result<String> {
        let created = self.created_at(record)?;
        let prefix = created.map(|at| self.folder_prefix(at)).unwrap_or_default();

        let mut state = self
            .state
            .lock()
            .map_err(|_| KeepError::LockPoisoned("name reservations"))?;

        if let Some(name) = state.issued.get(&record.entry) {
            return Ok(name.clone());
        }

        let date = created.map(|at| at.format(DATE_FORMAT).to_string());
        let fallback = || match &date {
            Some(d) => format!("{}_{}", d, record.source_name),
            None => record.source_name.clone(),
        };

        let leaf = match (self.strategy, &date) {
            (NameStrategy::Direct, _) | (_, None) => record.source_name.clone(),
            (NameStrategy::FavorDate, Some(d)) => d.clone(),
            (NameStrategy::DateAndTitle, Some(d)) if record.title.is_empty() => d.clone(),
            (NameStrategy::DateAndTitle, Some(d)) => {
                format!("{}_{}", d, sanitize_name(&record.title))
            }
        };

        let mut name = format!("{}{}", prefix, leaf);
        if state.reserved.contains(&name) {
            let alternative = format!("{}{}", prefix, fallback());
            debug!(entry = %record.entry, taken = %name, fallback = %alternative, "name taken");
            name = alternative;
        }
        if state.reserved.contains(&name) {
            let stem = name.clone();
            let mut n = 1;
            while state.reserved.contains(&name) {
                name = format!("{}_{}", stem, n);
                n += 1;
            }
        }

        state.reserved.insert(name.clone());
        state.issued.insert(record.entry.clone(), name.clone());
        debug!(entry = %record.entry, name = %name, "allocated name");
        Ok(name)
    }

    fn created_at(&self, record: &Record) -> Result<Option<DateTime<Utc>>> {
        let needs_date = self.strategy.needs_date() || self.year_folders;
        match record.created_at {
            Some(at) => Ok(Some(at)),
            None if needs_date => Err(KeepError::MissingTimestamp {
                record: record.entry.clone(),
            }),
            None => Ok(None),
        }
    }

    fn folder_prefix(&self, at: DateTime<Utc>) -> String {
        if !self.year_folders {
            return String::new();
        }
        if self.month_folders {
            format!("{}/{}/", at.format("%Y"), at.format("%m-%B"))
        } else {
            format!("{}/", at.format("%Y"))
        }
    }
}

/// Keeps letters, digits, space, `-` and `_`; everything else becomes `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}
