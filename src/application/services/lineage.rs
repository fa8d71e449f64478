//! Heir lineage service
//!
//! Reads flat member records, organizes them into forests under the configured
//! reference policy, and submits nested drafts to the record store.

use std::io;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{debug, info, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, PathContextExt};
use crate::domain::{
    find_reference_issues, organize, organize_with_policy, DomainError, HeirForest, MemberDraft,
    MemberId, MemberIndex, MemberRecord, ReferenceIssue, ReferencePolicy,
};
use crate::infrastructure::traits::{FileSystem, RecordStore};

/// Reject ids that could escape the store layout or collide with temp files.
pub fn validate_application_id(application_id: &str) -> ApplicationResult<()> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let valid = PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").ok())
        .as_ref()
        .map(|re| re.is_match(application_id) && !application_id.ends_with(".tmp"))
        .unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err(DomainError::InvalidApplicationId(application_id.to_string()).into())
    }
}

/// Service for building and submitting heir forests.
pub struct LineageService {
    fs: Arc<dyn FileSystem>,
    store: Arc<dyn RecordStore>,
    policy: ReferencePolicy,
}

impl LineageService {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        store: Arc<dyn RecordStore>,
        policy: ReferencePolicy,
    ) -> Self {
        Self { fs, store, policy }
    }

    pub fn policy(&self) -> ReferencePolicy {
        self.policy
    }

    fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &Path,
        what: &str,
    ) -> ApplicationResult<T> {
        if !self.fs.is_file(path) {
            let missing: io::Result<T> =
                Err(io::Error::new(io::ErrorKind::NotFound, "file does not exist"));
            return missing.with_path_context(&format!("read {what}"), path);
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context(&format!("read {what}"), path)?;
        serde_json::from_str(&content).with_path_context(&format!("parse {what}"), path)
    }

    /// Read a flat JSON array of member records.
    pub fn read_records(&self, path: &Path) -> ApplicationResult<Vec<MemberRecord>> {
        debug!("read_records: path={}", path.display());
        self.read_json(path, "member records")
    }

    /// Read a JSON array of nested member drafts.
    ///
    /// `id`, `parentId` and `children` inside the payload are dropped, so
    /// nested forest JSON (`tree json`) can be resubmitted as drafts.
    pub fn read_drafts(&self, path: &Path) -> ApplicationResult<Vec<MemberDraft>> {
        debug!("read_drafts: path={}", path.display());
        let mut drafts: Vec<MemberDraft> = self.read_json(path, "member drafts")?;
        let removed: usize = drafts.iter_mut().map(MemberDraft::strip_reserved).sum();
        if removed > 0 {
            warn!(
                "ignored {} id/parentId/children keys in {}; the store assigns new ids",
                removed,
                path.display()
            );
        }
        Ok(drafts)
    }

    /// Index and organize `records` under the service policy.
    #[instrument(
        level = "debug",
        skip(self, records),
        fields(records = records.len(), policy = %self.policy)
    )]
    pub fn build_forest(&self, records: &[MemberRecord]) -> ApplicationResult<HeirForest> {
        let index = MemberIndex::build(records);
        Ok(organize_with_policy(&index, self.policy)?)
    }

    pub fn forest_from_file(&self, path: &Path) -> ApplicationResult<HeirForest> {
        let records = self.read_records(path)?;
        self.build_forest(&records)
    }

    /// Every reference issue of `records`, independent of the policy.
    pub fn check(&self, records: &[MemberRecord]) -> Vec<ReferenceIssue> {
        let index = MemberIndex::build(records);
        let forest = organize(&index);
        find_reference_issues(&index, &forest)
    }

    /// Stored records of one application.
    pub fn load_records(&self, application_id: &str) -> ApplicationResult<Vec<MemberRecord>> {
        validate_application_id(application_id)?;
        self.store
            .load(application_id)
            .map_err(|e| ApplicationError::from_store(application_id, e))
    }

    /// Rebuild the forest of one application from its stored records.
    pub fn load_forest(&self, application_id: &str) -> ApplicationResult<HeirForest> {
        debug!("load_forest: application={}", application_id);
        let records = self.load_records(application_id)?;
        self.build_forest(&records)
    }

    /// Store nested drafts, every parent before its children.
    ///
    /// Walks the drafts in pre-order with an explicit stack; each child is
    /// inserted with the id just assigned to its parent. Returns the new ids
    /// in insertion order.
    #[instrument(level = "debug", skip(self, drafts), fields(roots = drafts.len()))]
    pub fn submit(
        &self,
        application_id: &str,
        drafts: &[MemberDraft],
    ) -> ApplicationResult<Vec<MemberId>> {
        validate_application_id(application_id)?;

        let total: usize = drafts.iter().map(MemberDraft::size).sum();
        let mut inserted = Vec::with_capacity(total);
        let mut stack: Vec<(&MemberDraft, Option<MemberId>)> =
            drafts.iter().rev().map(|d| (d, None)).collect();

        while let Some((draft, parent_id)) = stack.pop() {
            let id = self
                .store
                .insert(application_id, parent_id.as_ref(), &draft.attributes)
                .map_err(|e| ApplicationError::StoreFailed {
                    application: application_id.to_string(),
                    source: e,
                })?;
            for child in draft.children.iter().rev() {
                stack.push((child, Some(id.clone())));
            }
            inserted.push(id);
        }

        info!("submitted {} members to application {}", inserted.len(), application_id);
        Ok(inserted)
    }

    /// Ids of all stored applications.
    pub fn applications(&self) -> ApplicationResult<Vec<String>> {
        self.store
            .applications()
            .map_err(|e| ApplicationError::OperationFailed {
                context: "list applications".to_string(),
                source: Box::new(e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_valid_ids_when_validating_then_ok() {
        for id in ["warish-2024-001", "A1", "lineage_7.b"] {
            assert!(validate_application_id(id).is_ok(), "{id} should be valid");
        }
    }

    #[test]
    fn given_path_like_ids_when_validating_then_rejected() {
        for id in ["", "../etc", "a/b", ".hidden", "x.tmp"] {
            assert!(validate_application_id(id).is_err(), "{id} should be rejected");
        }
    }
}
