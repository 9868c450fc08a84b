//! Utility functions for string formatting and manipulation.

pub mod format;

pub use format::{collapse_whitespace, non_empty, truncate_body};
