//! Organizes an identity index into a forest and checks its references.

use std::collections::HashSet;
use std::fmt;

use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::domain::arena::HeirForest;
use crate::domain::entities::{MemberId, MemberRecord, ReferencePolicy};
use crate::domain::error::DomainError;
use crate::domain::indexer::MemberIndex;

/// Result type for forest operations.
pub type ForestResult<T> = Result<T, DomainError>;

/// Reference defect found in a member set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferenceIssue {
    /// The id occurred more than once; the last record won.
    DuplicateId { id: MemberId },
    /// `parent_id` does not name any member of the set.
    DanglingParent { id: MemberId, parent_id: MemberId },
    /// The member names itself as parent.
    SelfParent { id: MemberId },
    /// Members whose parent chain loops back to themselves.
    ParentCycle { ids: Vec<MemberId> },
    /// Members hanging below a parent cycle, so no root reaches them either.
    Stranded { ids: Vec<MemberId> },
}

impl fmt::Display for ReferenceIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceIssue::DuplicateId { id } => write!(f, "duplicate member id '{id}'"),
            ReferenceIssue::DanglingParent { id, parent_id } => {
                write!(f, "member '{id}' references unknown parent '{parent_id}'")
            }
            ReferenceIssue::SelfParent { id } => write!(f, "member '{id}' is its own parent"),
            ReferenceIssue::ParentCycle { ids } => write!(
                f,
                "members in a parent cycle, unreachable from any root: {}",
                ids.iter().join(", ")
            ),
            ReferenceIssue::Stranded { ids } => write!(
                f,
                "members below a parent cycle, unreachable from any root: {}",
                ids.iter().join(", ")
            ),
        }
    }
}

/// Link every indexed member under its parent; collect the rest as roots.
///
/// A member becomes a child when its parent id resolves to *another* member of
/// the index, and a root otherwise. Children keep index order. Dangling and
/// self references therefore yield roots, and members of a parent cycle end up
/// linked to each other but unreachable from any root. Never fails.
#[instrument(level = "debug", skip(index), fields(members = index.len()))]
pub fn organize(index: &MemberIndex) -> HeirForest {
    let mut forest = HeirForest::with_capacity(index.len());
    let handles: Vec<_> = index
        .iter()
        .map(|record| forest.insert_detached(record.clone()))
        .collect();

    for (record, &handle) in index.iter().zip(&handles) {
        let parent = resolved_parent(record).and_then(|p| forest.lookup(p));
        match parent {
            Some(parent_idx) => forest.attach(handle, parent_idx),
            None => forest.push_root(handle),
        }
    }

    debug!(
        "organize: {} roots, {} reachable of {}",
        forest.roots().len(),
        forest.reachable_count(),
        forest.len()
    );
    forest
}

/// Parent reference, ignoring a member pointing at itself.
fn resolved_parent(record: &MemberRecord) -> Option<&MemberId> {
    record.parent().filter(|p| **p != record.id)
}

/// Collect every reference defect of `index` and the forest built from it.
pub fn find_reference_issues(index: &MemberIndex, forest: &HeirForest) -> Vec<ReferenceIssue> {
    let mut issues: Vec<ReferenceIssue> = index
        .duplicates()
        .iter()
        .unique()
        .map(|id| ReferenceIssue::DuplicateId { id: id.clone() })
        .collect();

    for record in index {
        match record.parent() {
            Some(parent) if *parent == record.id => issues.push(ReferenceIssue::SelfParent {
                id: record.id.clone(),
            }),
            Some(parent) if !index.contains(parent) => {
                issues.push(ReferenceIssue::DanglingParent {
                    id: record.id.clone(),
                    parent_id: parent.clone(),
                })
            }
            _ => {}
        }
    }

    let cycle: Vec<MemberId> = forest
        .cycle_members()
        .into_iter()
        .map(|r| r.id.clone())
        .collect();
    let in_cycle: HashSet<&MemberId> = cycle.iter().collect();
    let stranded: Vec<MemberId> = forest
        .unreachable()
        .into_iter()
        .filter(|r| !in_cycle.contains(&r.id))
        .map(|r| r.id.clone())
        .collect();
    if !cycle.is_empty() {
        issues.push(ReferenceIssue::ParentCycle { ids: cycle });
    }
    if !stranded.is_empty() {
        issues.push(ReferenceIssue::Stranded { ids: stranded });
    }

    issues
}

/// Organize `index` under `policy`.
///
/// `Lenient` returns the forest as-is. `Strict` fails with every reference
/// issue when there is at least one.
pub fn organize_with_policy(
    index: &MemberIndex,
    policy: ReferencePolicy,
) -> ForestResult<HeirForest> {
    let forest = organize(index);
    if policy == ReferencePolicy::Lenient {
        return Ok(forest);
    }

    let issues = find_reference_issues(index, &forest);
    if issues.is_empty() {
        Ok(forest)
    } else {
        debug!("organize_with_policy: {} reference issues", issues.len());
        Err(DomainError::InvalidReferences(issues))
    }
}

/// Index and organize a flat record list in one go.
pub fn build_forest(records: &[MemberRecord], policy: ReferencePolicy) -> ForestResult<HeirForest> {
    let index = MemberIndex::build(records);
    organize_with_policy(&index, policy)
}
