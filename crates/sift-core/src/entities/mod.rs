//! Entity structs for Sift domain objects.
//!
//! All structs derive `Serialize` and `Deserialize` so they can travel through
//! dataset fixtures and CLI output unchanged.

mod component;
mod issue;

pub use component::{ComponentNode, ProjectLink};
pub use issue::IssueRecord;
