//! Durable process manifest.
//!
//! # Safety guarantees
//! - Atomic writes via temp file + rename
//! - Read-modify-write cycles serialized within one supervisor
//! - Process verification before killing (prevents PID reuse issues)

mod io;
mod sweep;
mod verify;

pub use io::ManifestStore;
pub use sweep::cleanup_stale;
pub use verify::{EntryState, classify};
