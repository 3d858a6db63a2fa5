//! Change-detection policy for raw filesystem events.
//!
//! Editors and build tools emit several OS-level write events per logical
//! save; forwarding them all causes duplicate rebuild storms. The policy
//! here compares each event's observed file state against the previous
//! observation and only reports a change when the file actually differs.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Same-size rewrites within this many seconds are coalesced.
pub const MTIME_THRESHOLD: f64 = 0.25;

/// Observed state of one file at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSnapshot {
    /// Path identifier of the observed file.
    pub name: PathBuf,
    /// File size in bytes.
    pub size: i64,
    /// Modification time in seconds since the Unix epoch.
    pub mtime: f64,
}

impl FileSnapshot {
    /// Initial "previous" snapshot for a fresh session.
    ///
    /// The sentinel values never equal a real observed file, so the first
    /// real event on any path always reports a change.
    #[must_use]
    pub fn sentinel() -> Self {
        Self {
            name: PathBuf::new(),
            size: -1,
            mtime: -1.0,
        }
    }

    /// Read the current size and mtime of `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be stat'ed, typically because
    /// it was deleted between the event and now.
    pub fn read(path: &Path) -> io::Result<Self> {
        let meta = fs::metadata(path)?;
        let mtime = meta
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        Ok(Self {
            name: path.to_path_buf(),
            size: i64::try_from(meta.len()).unwrap_or(i64::MAX),
            mtime,
        })
    }
}

/// Decide whether `current` represents a meaningful change from `previous`.
///
/// A change is reported when the path differs (a different file is in
/// view), or when the path is the same and either the size differs or the
/// mtime advanced by more than [`MTIME_THRESHOLD`]. Size is authoritative;
/// time only breaks ties for same-size rewrites. The threshold comparison
/// is strictly greater-than, so a delta of exactly 0.25 is not a change.
#[must_use]
pub fn is_change(previous: &FileSnapshot, current: &FileSnapshot) -> bool {
    let same_name = previous.name == current.name;
    let diff_size = previous.size != current.size;
    let diff_time = (current.mtime - previous.mtime) > MTIME_THRESHOLD;
    !same_name || diff_size || diff_time
}
