//! docwatch - documentation build orchestrator
//!
//! Watches a source tree for meaningful changes and retriggers the doc
//! pipeline, and synchronizes external object inventories for
//! cross-project API links.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod interlinks;
pub mod logging;
pub mod pipeline;
pub mod watcher;

pub use config::QuartoConfig;
pub use error::{Error, Result};
