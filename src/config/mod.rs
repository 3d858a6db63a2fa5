//! Configuration management for docwatch.
//!
//! Configuration comes from a Quarto-style YAML project file
//! (`_quarto.yml` by default); command-line flags select the file
//! and override per-invocation behavior.

mod settings;

pub use settings::{BuildConfig, InterlinksConfig, QuartoConfig, SourceConfig};
