use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use super::config::SchemaKeys;
use super::normalizer::{NormalizeError, normalize};
use super::records::Schedule;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to read cache file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Cache file is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// Reads the snapshot the fetcher leaves on disk.
#[derive(Debug, Clone)]
pub struct CacheLoader {
    path: PathBuf,
    keys: SchemaKeys,
}

impl CacheLoader {
    pub fn new(path: impl Into<PathBuf>, keys: SchemaKeys) -> Self {
        CacheLoader {
            path: path.into(),
            keys,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current schedule, or `None` when there is nothing usable.
    ///
    /// A missing file, unreadable bytes, broken or truncated JSON and a top
    /// level that is not an object all end up as `None`. The failure is logged
    /// and never returned.
    pub fn load(&self) -> Option<Schedule> {
        if !self.path.exists() {
            debug!("No cache file at {}", self.path.display());
            return None;
        }
        match self.try_load() {
            Ok(schedule) => {
                debug!(
                    "Loaded {} outbound and {} inbound departures",
                    schedule.outbound.len(),
                    schedule.inbound.len()
                );
                Some(schedule)
            }
            Err(err) => {
                warn!("Ignoring cache file {}: {}", self.path.display(), err);
                None
            }
        }
    }

    fn try_load(&self) -> Result<Schedule, CacheError> {
        // Non UTF-8 content surfaces here as an io::Error
        let contents = fs_err::read_to_string(&self.path)?;
        let document: Value = serde_json::from_str(&contents)?;
        Ok(normalize(document, &self.keys)?)
    }
}
