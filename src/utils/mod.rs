//! Utility modules for common operations

pub mod paths;

pub use paths::PathExpander;
