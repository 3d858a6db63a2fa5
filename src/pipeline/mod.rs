//! Build trigger and working-directory scoping for the doc pipeline.

mod trigger;
mod workdir;

pub use trigger::{
    BuildTrigger, CommandPipeline, Pipeline, DEFAULT_BUILD_COMMAND, FILTER_ALL,
};
pub use workdir::WorkdirGuard;
