//! Filesystem watching with change debouncing.
//!
//! This module provides:
//! - A change-detection policy that coalesces duplicate OS write events
//! - A fixed ignore filter for build output and tool caches
//! - A watch session that wires notify events to a rebuild callback

mod debounce;
mod filter;
mod session;

pub use debounce::{is_change, FileSnapshot, MTIME_THRESHOLD};
pub use filter::WatchFilter;
pub use session::{RebuildCallback, SessionState, WatchSession, EVENT_QUEUE_CAPACITY};
