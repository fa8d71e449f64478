//! Domain-level errors (no external dependencies)

use itertools::Itertools;
use thiserror::Error;

use crate::domain::entities::MemberId;
use crate::domain::organizer::ReferenceIssue;

/// Domain errors represent business logic violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("invalid member references: {}", .0.iter().join("; "))]
    InvalidReferences(Vec<ReferenceIssue>),

    #[error("member not found: {0}")]
    MemberNotFound(MemberId),

    #[error("invalid application id: '{0}'")]
    InvalidApplicationId(String),
}
