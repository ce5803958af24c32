use crate::error::{KeepError, Result};
use crate::naming::NameStrategy;
use crate::sink::paged::DEFAULT_WORD_LIMIT;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_SUB_FOLDER: &str = "Takeout/Keep/";

/// Export settings, read from `config.json` and overlaid with command-line flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExportConfig {
    /// Takeout zip to read
    pub archive: Option<PathBuf>,

    /// Only entries whose name contains this string are exported
    pub sub_folder: String,

    /// Dump every note to stdout
    pub console: bool,

    /// Directory for one `.txt` per note
    pub text_dir: Option<PathBuf>,

    /// Directory for one `.md` per note
    pub markdown_dir: Option<PathBuf>,

    /// Single OPML document holding every note
    pub outline_file: Option<PathBuf>,

    /// Directory for the word-limited `out_<n>.pdf` batches
    pub paged_dir: Option<PathBuf>,

    pub name_strategy: NameStrategy,

    pub year_folders: bool,

    /// Ignored unless `year_folders` is set
    pub month_folders: bool,

    /// Create missing parent directories for output files
    pub create_dirs: bool,

    /// Tags added to every note
    pub default_tags: Vec<String>,

    pub word_limit: usize,

    /// Dispatcher pool size; rayon's default when unset
    pub workers: Option<usize>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            archive: None,
            sub_folder: DEFAULT_SUB_FOLDER.to_string(),
            console: false,
            text_dir: None,
            markdown_dir: None,
            outline_file: None,
            paged_dir: None,
            name_strategy: NameStrategy::default(),
            year_folders: false,
            month_folders: false,
            create_dirs: true,
            default_tags: Vec::new(),
            word_limit: DEFAULT_WORD_LIMIT,
            workers: None,
        }
    }
}

impl ExportConfig {
    /// Load config from the given file, or return defaults if it does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(KeepError::Io)?;
        let config: ExportConfig =
            serde_json::from_str(&content).map_err(KeepError::Serialization)?;
        Ok(config)
    }

    /// Per-user config file location
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "keepfan", "keepfan")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
    }

    pub fn effective_month_folders(&self) -> bool {
        self.year_folders && self.month_folders
    }

    pub fn has_sink(&self) -> bool {
        self.console
            || self.text_dir.is_some()
            || self.markdown_dir.is_some()
            || self.outline_file.is_some()
            || self.paged_dir.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        if self.archive.is_none() {
            return Err(KeepError::Config("No archive given".into()));
        }
        if !self.has_sink() {
            return Err(KeepError::Config(
                "No output selected (console, text, markdown, outline or paged)".into(),
            ));
        }
        if self.word_limit == 0 {
            return Err(KeepError::Config("Word limit must be positive".into()));
        }
        if self.workers == Some(0) {
            return Err(KeepError::Config("Worker count must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn with_archive() -> ExportConfig {
        ExportConfig {
            archive: Some(PathBuf::from("takeout.zip")),
            console: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = ExportConfig::default();
        assert_eq!(config.sub_folder, "Takeout/Keep/");
        assert_eq!(config.word_limit, 5000);
        assert!(config.create_dirs);
        assert_eq!(config.name_strategy, NameStrategy::Direct);
    }

    #[test]
    fn test_load_missing_config() {
        let dir = TempDir::new().unwrap();
        let config = ExportConfig::load(dir.path().join("config.json")).unwrap();
        assert_eq!(config, ExportConfig::default());
    }

    #[test]
    fn test_load_partial_config_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"name_strategy": "direct_export", "word_limit": 100, "default_tags": ["keep"]}"#,
        )
        .unwrap();

        let config = ExportConfig::load(&path).unwrap();
        assert_eq!(config.name_strategy, NameStrategy::Direct);
        assert_eq!(config.word_limit, 100);
        assert_eq!(config.default_tags, vec!["keep".to_string()]);
        assert_eq!(config.sub_folder, "Takeout/Keep/");
        assert!(config.create_dirs);
    }

    #[test]
    fn test_load_malformed_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ExportConfig::load(&path),
            Err(KeepError::Serialization(_))
        ));
    }

    #[test]
    fn test_month_folders_need_year_folders() {
        let mut config = ExportConfig {
            month_folders: true,
            ..Default::default()
        };
        assert!(!config.effective_month_folders());
        config.year_folders = true;
        assert!(config.effective_month_folders());
    }

    #[test]
    fn test_validate() {
        assert!(with_archive().validate().is_ok());

        let no_archive = ExportConfig {
            archive: None,
            ..with_archive()
        };
        assert!(no_archive.validate().is_err());

        let no_sink = ExportConfig {
            console: false,
            ..with_archive()
        };
        assert!(no_sink.validate().is_err());

        let zero_limit = ExportConfig {
            word_limit: 0,
            ..with_archive()
        };
        assert!(zero_limit.validate().is_err());

        let zero_workers = ExportConfig {
            workers: Some(0),
            ..with_archive()
        };
        assert!(zero_workers.validate().is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = ExportConfig {
            outline_file: Some(PathBuf::from("notes.opml")),
            name_strategy: NameStrategy::DateAndTitle,
            workers: Some(4),
            ..with_archive()
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ExportConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }
}
