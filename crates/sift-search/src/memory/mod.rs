//! In-memory collaborators.
//!
//! Each store is populated through `&mut self` and then frozen behind an
//! `Arc`, so lookups need no locking. They back the tests and the CLI's
//! fixture mode and honor the same contracts a remote store would.

mod catalog;
mod dataset;
mod index;
mod permissions;

pub use catalog::MemoryCatalog;
pub use dataset::{DatasetError, MemoryDataset};
pub use index::MemoryIssueIndex;
pub use permissions::MemoryPermissions;
