//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod entities;
pub mod error;
pub mod indexer;
pub mod organizer;
pub mod render;

pub use arena::{ForestNode, HeirForest};
pub use entities::*;
pub use error::DomainError;
pub use indexer::{index_records, MemberIndex};
pub use organizer::{
    build_forest, find_reference_issues, organize, organize_with_policy, ForestResult,
    ReferenceIssue,
};
pub use render::{label, outline, ForestRender, RenderOptions};
