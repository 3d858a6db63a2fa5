//! Build trigger wrapping the external doc-generation pipeline.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use super::workdir::WorkdirGuard;
use crate::config::BuildConfig;
use crate::error::PipelineError;
use crate::watcher::RebuildCallback;
use crate::Result;

/// Pipeline command used when the config does not name one.
pub const DEFAULT_BUILD_COMMAND: &str = "quarto render";

/// Filter pattern meaning "all files".
pub const FILTER_ALL: &str = "*";

/// Seam for the external documentation pipeline.
pub trait Pipeline: Send + Sync {
    /// Regenerate the docs, restricted to files matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying pipeline fails; callers
    /// decide whether that aborts (one-shot mode) or is logged and
    /// survived (watch mode).
    fn build(&self, filter: &str) -> Result<()>;
}

/// Pipeline that shells out to an external command.
#[derive(Debug, Clone)]
pub struct CommandPipeline {
    command: String,
}

impl CommandPipeline {
    /// Create a pipeline running `command`.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Create a pipeline from the config's `build` block, falling back
    /// to [`DEFAULT_BUILD_COMMAND`].
    #[must_use]
    pub fn from_config(build: Option<&BuildConfig>) -> Self {
        let command = build
            .and_then(|b| b.command.clone())
            .unwrap_or_else(|| DEFAULT_BUILD_COMMAND.to_string());
        Self::new(command)
    }
}

impl Pipeline for CommandPipeline {
    fn build(&self, filter: &str) -> Result<()> {
        let mut parts = self.command.split_whitespace();
        let program = parts.next().ok_or_else(|| PipelineError::Spawn {
            command: self.command.clone(),
            reason: "empty build command".to_string(),
        })?;

        let mut cmd = Command::new(program);
        cmd.args(parts);
        if filter != FILTER_ALL {
            cmd.args(["--filter", filter]);
        }

        tracing::debug!(command = %self.command, filter, "Running doc pipeline");

        let status = cmd.status().map_err(|e| PipelineError::Spawn {
            command: self.command.clone(),
            reason: e.to_string(),
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(PipelineError::Failed {
                command: self.command.clone(),
                status: status.to_string(),
            }
            .into())
        }
    }
}

/// Zero-argument rebuild unit invoked by the watch session.
///
/// Each run enters the config file's directory for the duration of the
/// pipeline call and restores the previous directory afterwards.
pub struct BuildTrigger {
    config_dir: PathBuf,
    filter: String,
    pipeline: Arc<dyn Pipeline>,
}

impl BuildTrigger {
    /// Create a trigger rooted at `config_dir`.
    pub fn new(
        config_dir: impl AsRef<Path>,
        filter: impl Into<String>,
        pipeline: Arc<dyn Pipeline>,
    ) -> Self {
        Self {
            config_dir: config_dir.as_ref().to_path_buf(),
            filter: filter.into(),
            pipeline,
        }
    }

    /// Run the pipeline once.
    ///
    /// # Errors
    ///
    /// Propagates pipeline and working-directory failures to the caller.
    pub fn run(&self) -> Result<()> {
        let _workdir = WorkdirGuard::enter(&self.config_dir)?;
        self.pipeline.build(&self.filter)
    }

    /// Convert into the callback form the watch session consumes.
    #[must_use]
    pub fn into_callback(self) -> RebuildCallback {
        Box::new(move || self.run())
    }
}
