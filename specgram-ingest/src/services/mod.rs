//! Services built on the loader

pub mod batch;
pub mod tree;

pub use batch::{AssetOutcome, BatchConverter, BatchOptions, BatchReport, FailurePolicy};
pub use tree::{convert_tree, FolderReport};
