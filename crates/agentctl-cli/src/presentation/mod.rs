//! Shared CLI presentation utilities.
//!
//! Keep this module format-only: no domain transforms.

pub mod report;
pub mod tables;

pub use report::{print_report, print_skipped, print_warnings, summary_line};
pub use tables::{format_optional, print_separator, truncate_string};
