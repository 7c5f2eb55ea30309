//! JSON document storage with single-writer access.
//!
//! Each history store owns one JSON file. Reads and writes go through a
//! mutex so concurrent callers never interleave, and writes land in a
//! temporary sibling first and are renamed into place, so a reader never
//! sees a partially written document.

use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Errors that can occur while reading or writing a history document.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HistoryError>;

/// A typed JSON document on disk.
///
/// `try_*` methods report failures; the plain methods are best-effort and
/// log failures as warnings instead, treating a missing or corrupt file
/// as the default (empty) value.
pub struct JsonDocument<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document. A missing file reads as the default value.
    pub fn try_read(&self) -> Result<T> {
        let _guard = self.guard();
        self.read_unlocked()
    }

    /// Replace the document atomically.
    pub fn try_write(&self, value: &T) -> Result<()> {
        let _guard = self.guard();
        self.write_unlocked(value)
    }

    /// Best-effort read: failures are logged and read as the default.
    pub fn read(&self) -> T {
        match self.try_read() {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "History unreadable, starting empty"
                );
                T::default()
            }
        }
    }

    /// Best-effort write: failures are logged and swallowed.
    pub fn write(&self, value: &T) {
        if let Err(e) = self.try_write(value) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to persist history"
            );
        }
    }

    /// Read-modify-write under a single lock acquisition. Best-effort.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let _guard = self.guard();
        let mut value = match self.read_unlocked() {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "History unreadable, rebuilding from empty"
                );
                T::default()
            }
        };

        let result = f(&mut value);

        if let Err(e) = self.write_unlocked(&value) {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to persist history"
            );
        }
        result
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // Writes are rename-based: a poisoned lock guards no torn state.
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_unlocked(&self) -> Result<T> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_unlocked(&self, value: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(value)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), "History saved");
        Ok(())
    }
}
