//! Append-only, timestamp-ordered snapshot persistence
//!
//! Ratings, tickets, and match history all persist the same way: one JSON
//! file per state, named `{timestamp}_{kind}.json` inside a dedicated
//! directory. Timestamps are fixed-width `YYYYMMDDHHMMSS`, so lexicographic
//! file order is chronological order and "latest" is simply the last file.
//! Undo deletes the newest file, making the prior snapshot current; the
//! caller undoes all three logs in lock-step.

use chrono::Local;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::error::{LeagueError, Result};

/// Fixed-width `YYYYMMDDHHMMSS` timestamp. The ordering key of every
/// snapshot log; sorts lexicographically identically to chronologically.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    pub const WIDTH: usize = 14;

    /// Current local time.
    pub fn now() -> Self {
        Self(Local::now().format("%Y%m%d%H%M%S").to_string())
    }

    /// Validates the fixed-width digit format.
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() == Self::WIDTH && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s.to_string()))
        } else {
            Err(LeagueError::InvalidTimestamp(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Append-only log of full state snapshots in a directory.
///
/// `T` is the serializable state of one ledger. The implicit initial state
/// of every log is `T::default()`: an empty league before the first match.
pub struct SnapshotLog<T> {
    dir: PathBuf,
    kind: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned + Default> SnapshotLog<T> {
    /// Opens (and creates if needed) the log directory.
    pub fn open(dir: impl Into<PathBuf>, kind: impl Into<String>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            kind: kind.into(),
            _marker: PhantomData,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes a snapshot keyed by the given timestamp. Re-appending under an
    /// existing timestamp replaces that snapshot (a match record gaining its
    /// result does this).
    pub fn append(&self, state: &T, timestamp: &Timestamp) -> Result<()> {
        let path = self.path_for(timestamp);
        let content =
            serde_json::to_string_pretty(state).map_err(|source| LeagueError::Snapshot {
                path: path.clone(),
                source,
            })?;
        std::fs::write(&path, content)?;
        tracing::debug!("wrote snapshot {}", path.display());
        Ok(())
    }

    /// The most recent snapshot, or `None` for a fresh log.
    pub fn latest(&self) -> Result<Option<T>> {
        match self.files()?.last() {
            Some(path) => Ok(Some(self.read(path)?)),
            None => Ok(None),
        }
    }

    /// The `n` most recent snapshots, oldest first. When fewer than `n`
    /// exist, the empty initial state is prepended.
    pub fn history(&self, n: usize) -> Result<Vec<T>> {
        let files = self.files()?;
        let skip = files.len().saturating_sub(n);
        let mut states = Vec::new();
        if files.len() < n {
            states.push(T::default());
        }
        for path in &files[skip..] {
            states.push(self.read(path)?);
        }
        Ok(states)
    }

    /// Full chronological history, starting from the implicit empty
    /// initial state.
    pub fn all(&self) -> Result<Vec<T>> {
        let mut states = vec![T::default()];
        for path in self.files()? {
            states.push(self.read(&path)?);
        }
        Ok(states)
    }

    /// Deletes the most recent snapshot, making the prior one current.
    /// Returns false when there is nothing to undo.
    pub fn undo_last(&self) -> Result<bool> {
        match self.files()?.last() {
            Some(path) => {
                std::fs::remove_file(path)?;
                tracing::info!("removed snapshot {}", path.display());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Number of snapshots in the log.
    pub fn count(&self) -> Result<usize> {
        Ok(self.files()?.len())
    }

    /// Chronological list of snapshot timestamps.
    pub fn timestamps(&self) -> Result<Vec<Timestamp>> {
        self.files()?
            .iter()
            .map(|path| {
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default();
                // get() keeps a non-ascii filename from splitting mid-char
                name.get(..Timestamp::WIDTH.min(name.len()))
                    .ok_or_else(|| LeagueError::InvalidTimestamp(name.to_string()))
                    .and_then(Timestamp::parse)
            })
            .collect()
    }

    fn path_for(&self, timestamp: &Timestamp) -> PathBuf {
        self.dir.join(format!("{}_{}.json", timestamp, self.kind))
    }

    /// Snapshot files sorted by name; lexicographic order is chronological.
    fn files(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .collect::<std::io::Result<Vec<_>>>()?
            .into_iter()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();
        Ok(files)
    }

    fn read(&self, path: &Path) -> Result<T> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| LeagueError::Snapshot {
            path: path.to_path_buf(),
            source,
        })
    }
}
