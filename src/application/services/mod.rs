//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, RecordStore)
//! but are themselves concrete structs, not traits.

mod lineage;

pub use lineage::{validate_application_id, LineageService};
