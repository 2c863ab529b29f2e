//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the domain expects from the operating
//! system. They contain no implementation details.

pub mod process_table;

pub use process_table::{ProcessInfo, ProcessTable};
