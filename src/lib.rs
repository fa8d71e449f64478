//! Heir and family-lineage forests.
//!
//! Flat member records carrying a `parentId` back-reference are indexed by id
//! ([`domain::MemberIndex`]) and organized into an ordered forest
//! ([`domain::HeirForest`]) for rendering and certificate generation.
//! Submission stores nested drafts parent-first through a
//! [`infrastructure::traits::RecordStore`].

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
