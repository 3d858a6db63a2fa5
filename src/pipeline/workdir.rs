//! Scoped working-directory changes.

use std::io;
use std::path::{Path, PathBuf};

/// RAII guard that changes the process working directory and restores
/// the previous one on drop, on every exit path including unwinds.
///
/// The working directory is process-global, so the guard must not be
/// held across concurrent directory changes from unrelated code. The
/// build trigger holds it only for the duration of one pipeline run.
#[derive(Debug)]
pub struct WorkdirGuard {
    previous: PathBuf,
}

impl WorkdirGuard {
    /// Change the working directory to `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be read or `dir`
    /// cannot be entered.
    pub fn enter(dir: &Path) -> io::Result<Self> {
        let previous = std::env::current_dir()?;
        std::env::set_current_dir(dir)?;
        tracing::debug!(dir = %dir.display(), "Entered working directory");
        Ok(Self { previous })
    }
}

impl Drop for WorkdirGuard {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.previous) {
            tracing::warn!(
                dir = %self.previous.display(),
                error = %e,
                "Failed to restore working directory"
            );
        }
    }
}
