//! Tracker snapshot persistence with file locking.
//!
//! The whole tracker (lab log plus medications) lives in one JSON file.
//! Writers take an exclusive lock and replace the file atomically; readers
//! take a shared lock. Load-modify-save cycles are serialized through an
//! exclusive lock on a sidecar `.lock` file that is never renamed.

use crate::{AdherenceEngine, Error, MeasurementLog, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name of the snapshot inside the data directory
pub const TRACKER_FILE: &str = "tracker.json";

/// Everything the user has recorded
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Tracker {
    #[serde(default)]
    pub measurements: MeasurementLog,
    #[serde(default)]
    pub medications: AdherenceEngine,
}

impl Tracker {
    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty() && self.medications.is_empty()
    }

    /// Load a tracker snapshot with shared locking
    ///
    /// Returns an empty tracker if the file doesn't exist. An unreadable or
    /// corrupted file is an error: saving over it would lose the history.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No tracker file at {:?}, starting empty", path);
            return Ok(Self::default());
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        let mut tracker: Tracker = serde_json::from_str(&contents).map_err(|e| {
            tracing::warn!("Failed to parse tracker file {:?}: {}", path, e);
            Error::State(format!("{} is not a valid tracker file: {}", path.display(), e))
        })?;

        tracker
            .measurements
            .restore_order()
            .and_then(|()| tracker.medications.restore_order())
            .map_err(|e| {
                tracing::warn!("Rejected tracker file {:?}: {}", path, e);
                Error::State(format!("{}: {}", path.display(), e))
            })?;

        tracing::debug!(
            "Loaded tracker from {:?}: {} measurements, {} medications",
            path,
            tracker.measurements.len(),
            tracker.medications.medications().len()
        );
        Ok(tracker)
    }

    /// Save the tracker with exclusive locking
    ///
    /// Atomically writes the snapshot by:
    /// 1. Writing to a temp file in the same directory
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "tracker path missing parent")
        })?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved tracker to {:?}", path);
        Ok(())
    }

    /// Load the tracker, modify it, and save it back
    ///
    /// Holds an exclusive lock on the sidecar lock file for the whole cycle,
    /// so concurrent updates apply one after the other. If `f` fails,
    /// nothing is written.
    pub fn update<F, T>(path: &Path, f: F) -> Result<T>
    where
        F: FnOnce(&mut Tracker) -> Result<T>,
    {
        let lock_path = lock_path_for(path);
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)?;
        lock.lock_exclusive()?;

        let result = Self::load(path).and_then(|mut tracker| {
            let out = f(&mut tracker)?;
            tracker.save(path)?;
            Ok(out)
        });

        lock.unlock()?;
        result
    }
}

/// `tracker.json` -> `tracker.json.lock`, next to the snapshot
fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| TRACKER_FILE.into());
    name.push(".lock");
    path.with_file_name(name)
}
