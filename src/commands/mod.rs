//! CLI command implementations.

pub mod collect;
pub mod merge;

pub use collect::CollectCommand;
pub use merge::{MergeCommand, MergeInputs};
