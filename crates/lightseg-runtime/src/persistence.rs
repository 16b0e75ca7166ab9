#![forbid(unsafe_code)]

//! Saving lit ranges and loading them back as a seed.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Saver                                │
//! │   - LogSaver: logs the ranges (no persistence)                │
//! │   - MemorySaver: keeps every snapshot (testing, ephemeral)    │
//! │   - FileSaver: one compact JSON line per save                 │
//! └──────────────────────────────────────────────────────────────┘
//!                              │  save file
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        read_seed                              │
//! │   - last line wins                                            │
//! │   - validated into a canonical IntervalSet                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # File Format
//!
//! A save file is a log: each save appends one line holding the JSON array of
//! `{"from":a,"to":b}` records. The file is truncated when the saver is
//! created, and a save file can be passed back as a seed file directly.
//!
//! ```text
//! [{"from":0,"to":4}]
//! [{"from":0,"to":4},{"from":9,"to":12}]
//! ```
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `PersistError::Io` | File I/O failure | Returned to caller |
//! | `PersistError::Serialization` | JSON encode/decode | Returned to caller |
//! | `PersistError::Seed` | Seed not canonical | Rejected, never repaired |
//! | `PersistError::NoSeedLine` | Empty seed file | Returned to caller |

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use lightseg_core::interval::{Interval, IntervalSet, SeedError};

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur while saving or loading ranges.
#[derive(Debug)]
pub enum PersistError {
    /// I/O error during file operations.
    Io(std::io::Error),
    /// Serialization or deserialization error.
    Serialization(String),
    /// The loaded ranges are not canonical.
    Seed(SeedError),
    /// The seed file has no lines.
    NoSeedLine,
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Io(e) => write!(f, "I/O error: {e}"),
            PersistError::Serialization(msg) => write!(f, "serialization error: {msg}"),
            PersistError::Seed(e) => write!(f, "invalid seed: {e}"),
            PersistError::NoSeedLine => f.write_str("no seed line found"),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistError::Io(e) => Some(e),
            PersistError::Seed(e) => Some(e),
            PersistError::Serialization(_) | PersistError::NoSeedLine => None,
        }
    }
}

impl From<std::io::Error> for PersistError {
    fn from(e: std::io::Error) -> Self {
        PersistError::Io(e)
    }
}

impl From<SeedError> for PersistError {
    fn from(e: SeedError) -> Self {
        PersistError::Seed(e)
    }
}

/// Result type for persistence operations.
pub type PersistResult<T> = Result<T, PersistError>;

// ─────────────────────────────────────────────────────────────────────────────
// Seed Loading
// ─────────────────────────────────────────────────────────────────────────────

/// Parse one seed line (a JSON array of `{from, to}` records).
pub fn parse_seed_line(line: &str) -> PersistResult<IntervalSet> {
    let ranges: Vec<Interval> = serde_json::from_str(line)
        .map_err(|e| PersistError::Serialization(format!("failed to parse seed: {e}")))?;
    Ok(IntervalSet::from_seed(ranges)?)
}

/// Read a seed from `path`.
///
/// Uses the last non-empty line, so a save file can be used directly.
pub fn read_seed(path: impl AsRef<Path>) -> PersistResult<IntervalSet> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);

    let mut last: Option<String> = None;
    let mut warned = false;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if last.is_some() && !warned {
            tracing::warn!(path = %path.display(), "seed file contains multiple lines; using the last one");
            warned = true;
        }
        last = Some(line);
    }

    let line = last.ok_or(PersistError::NoSeedLine)?;
    let seed = parse_seed_line(&line)?;
    tracing::info!(path = %path.display(), seed = %seed, "loaded seed");
    Ok(seed)
}

// ─────────────────────────────────────────────────────────────────────────────
// Saver Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Destination for explicit saves.
///
/// Implementations must be thread-safe (`Send + Sync`) so a saver can sit
/// behind the request dispatcher.
pub trait Saver: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Persist one snapshot of the lit ranges.
    fn save(&self, ranges: &[Interval]) -> PersistResult<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Log Saver
// ─────────────────────────────────────────────────────────────────────────────

/// Saver that only logs the ranges. Used when no save path is configured.
#[derive(Debug, Default)]
pub struct LogSaver;

impl Saver for LogSaver {
    fn name(&self) -> &str {
        "LogSaver"
    }

    fn save(&self, ranges: &[Interval]) -> PersistResult<()> {
        tracing::info!(ranges = ?ranges, "saving");
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Saver
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory saver keeping every snapshot in order.
#[derive(Default)]
pub struct MemorySaver {
    saves: Mutex<Vec<Vec<Interval>>>,
}

impl MemorySaver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All snapshots saved so far, oldest first.
    #[must_use]
    pub fn saves(&self) -> Vec<Vec<Interval>> {
        self.saves.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// The most recent snapshot.
    #[must_use]
    pub fn last(&self) -> Option<Vec<Interval>> {
        self.saves.lock().ok()?.last().cloned()
    }
}

impl Saver for MemorySaver {
    fn name(&self) -> &str {
        "MemorySaver"
    }

    fn save(&self, ranges: &[Interval]) -> PersistResult<()> {
        let mut guard = self
            .saves
            .lock()
            .map_err(|_| PersistError::Io(std::io::Error::other("saver lock poisoned")))?;
        guard.push(ranges.to_vec());
        Ok(())
    }
}

impl fmt::Debug for MemorySaver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.saves.lock().map(|g| g.len()).unwrap_or(0);
        f.debug_struct("MemorySaver").field("saves", &count).finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Saver
// ─────────────────────────────────────────────────────────────────────────────

/// Saver appending one compact JSON line per save.
///
/// Each save is flushed and synced before returning, so the last line of the
/// file always holds the most recent complete snapshot.
pub struct FileSaver {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSaver {
    /// Create (or truncate) the save file at `path`.
    ///
    /// Parent directories are created as needed.
    pub fn create(path: impl AsRef<Path>) -> PersistResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Saver for FileSaver {
    fn name(&self) -> &str {
        "FileSaver"
    }

    fn save(&self, ranges: &[Interval]) -> PersistResult<()> {
        let mut line = serde_json::to_vec(ranges)
            .map_err(|e| PersistError::Serialization(format!("failed to serialize ranges: {e}")))?;
        line.push(b'\n');

        let mut file = self
            .file
            .lock()
            .map_err(|_| PersistError::Io(std::io::Error::other("save file lock poisoned")))?;
        file.write_all(&line)?;
        file.flush()?;
        file.sync_all()?;

        tracing::debug!(path = %self.path.display(), intervals = ranges.len(), "saved state");
        Ok(())
    }
}

impl fmt::Debug for FileSaver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSaver").field("path", &self.path).finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_seed_line_accepts_canonical() {
        let seed = parse_seed_line(r#"[{"from":1,"to":3},{"from":6,"to":6}]"#).unwrap();
        assert_eq!(seed.to_string(), "1-3, 6");
    }

    #[test]
    fn parse_seed_line_empty_array() {
        assert!(parse_seed_line("[]").unwrap().is_empty());
    }

    #[test]
    fn parse_seed_line_rejects_garbage() {
        let err = parse_seed_line("nope").unwrap_err();
        assert!(matches!(err, PersistError::Serialization(_)));
        assert!(err.to_string().contains("failed to parse seed"));
    }

    #[test]
    fn parse_seed_line_rejects_adjacent() {
        let err = parse_seed_line(r#"[{"from":1,"to":3},{"from":4,"to":6}]"#).unwrap_err();
        assert!(matches!(err, PersistError::Seed(SeedError::Adjacent { index: 1 })));
    }

    #[test]
    fn memory_saver_keeps_history() {
        let saver = MemorySaver::new();
        assert!(saver.last().is_none());
        saver.save(&[Interval::new(0, 1)]).unwrap();
        saver.save(&[]).unwrap();
        assert_eq!(saver.saves().len(), 2);
        assert_eq!(saver.last(), Some(vec![]));
        assert_eq!(saver.name(), "MemorySaver");
    }

    #[test]
    fn log_saver_never_fails() {
        assert!(LogSaver.save(&[Interval::new(2, 4)]).is_ok());
    }

    #[test]
    fn persist_error_display() {
        let io = PersistError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        assert!(io.to_string().contains("I/O error"));
        assert_eq!(PersistError::NoSeedLine.to_string(), "no seed line found");
        let seed = PersistError::from(SeedError::Overlapping { index: 2 });
        assert!(seed.to_string().starts_with("invalid seed"));
    }
}
