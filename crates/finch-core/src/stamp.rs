//! Seed-fetch stamp: a zero-length file whose mtime records the last successful fetch.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use crate::clock::{millis_from_system_time, system_time_from_millis};

/// File name of the stamp under the state dir.
pub const STAMP_FILE_NAME: &str = "variations_stamp";

#[derive(Debug, Clone)]
pub struct SeedStamp {
    path: PathBuf,
}

impl SeedStamp {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Stamp at the default location in `state_dir`.
    pub fn in_dir(state_dir: &Path) -> Self {
        Self::new(state_dir.join(STAMP_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last-modified time in epoch millis, or None if the stamp was never written.
    pub fn modified_millis(&self) -> io::Result<Option<i64>> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(Some(millis_from_system_time(meta.modified()?))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create the stamp if needed and set its mtime to `at_millis`.
    pub fn touch(&self, at_millis: i64) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create stamp dir: {}", parent.display()))?;
        }
        let file = File::options()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.path)
            .with_context(|| format!("open stamp: {}", self.path.display()))?;
        file.set_modified(system_time_from_millis(at_millis))
            .with_context(|| format!("set stamp mtime: {}", self.path.display()))?;
        Ok(())
    }

    /// Set the mtime of an existing stamp (0 is the canonical "expired" value).
    pub fn set_modified(&self, at_millis: i64) -> Result<()> {
        let file = File::options()
            .write(true)
            .open(&self.path)
            .with_context(|| format!("open stamp: {}", self.path.display()))?;
        file.set_modified(system_time_from_millis(at_millis))
            .with_context(|| format!("set stamp mtime: {}", self.path.display()))?;
        Ok(())
    }

    /// Delete the stamp. Missing is not an error.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove stamp: {}", self.path.display())),
        }
    }
}
