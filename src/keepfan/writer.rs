use crate::error::{KeepError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Creates output files, optionally creating their parent directories first.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileWriter {
    create_dirs: bool,
}

impl FileWriter {
    pub fn new(create_dirs: bool) -> Self {
        Self { create_dirs }
    }

    pub fn prepare_dir(&self, destination: &Path) -> Result<()> {
        if !self.create_dirs {
            return Ok(());
        }
        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(KeepError::Io)?;
            }
        }
        Ok(())
    }

    /// Writes `data` to `destination`, truncating, and syncs it to disk.
    pub fn write_file(&self, destination: &Path, data: &[u8]) -> Result<()> {
        self.prepare_dir(destination)?;
        let mut file = File::create(destination).map_err(KeepError::Io)?;
        file.write_all(data).map_err(KeepError::Io)?;
        file.sync_all().map_err(KeepError::Io)?;
        Ok(())
    }
}
