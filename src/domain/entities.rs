//! Domain entities: member records, drafts and nested nodes

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of a member record, unique within one application.
///
/// Opaque to the tree logic; the persistence layer decides its shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identifier, as assigned by the record store on insert.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for MemberId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Whether the member was alive at the time of application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LivingStatus {
    #[serde(alias = "living")]
    Alive,
    #[serde(alias = "dead")]
    Deceased,
}

/// JSON keys owned by the tree structure; never part of a member's payload.
pub const RESERVED_KEYS: [&str; 3] = ["id", "parentId", "children"];

/// Payload carried by a member. Never inspected by the tree logic.
///
/// Unknown fields are kept verbatim in `extra` so records round-trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub living_status: Option<LivingStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl MemberAttributes {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }

    pub fn is_deceased(&self) -> bool {
        self.living_status == Some(LivingStatus::Deceased)
    }

    /// Drop structural keys that slipped into `extra`; returns the keys removed.
    ///
    /// Flattened next to `id`, `parentId` or `children` they would serialize
    /// as duplicate keys.
    pub fn strip_reserved(&mut self) -> Vec<&'static str> {
        RESERVED_KEYS
            .iter()
            .copied()
            .filter(|key| self.extra.remove(*key).is_some())
            .collect()
    }

    /// Copy of the attributes without structural keys.
    pub fn payload(&self) -> Self {
        let mut payload = self.clone();
        payload.strip_reserved();
        payload
    }
}

/// Flat heir/member record as handed over by the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    pub id: MemberId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<MemberId>,
    #[serde(flatten)]
    pub attributes: MemberAttributes,
}

impl MemberRecord {
    /// Root record without attributes.
    pub fn root(id: impl Into<MemberId>) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            attributes: MemberAttributes::default(),
        }
    }

    /// Record pointing at `parent`.
    pub fn child_of(id: impl Into<MemberId>, parent: impl Into<MemberId>) -> Self {
        Self {
            id: id.into(),
            parent_id: Some(parent.into()),
            attributes: MemberAttributes::default(),
        }
    }

    pub fn with_attributes(mut self, attributes: MemberAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Effective parent reference. An empty `parentId` counts as absent.
    pub fn parent(&self) -> Option<&MemberId> {
        self.parent_id.as_ref().filter(|p| !p.is_empty())
    }
}

/// Member as submitted by an applicant: no id yet, nested children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberDraft {
    #[serde(flatten)]
    pub attributes: MemberAttributes,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MemberDraft>,
}

impl MemberDraft {
    pub fn new(attributes: MemberAttributes) -> Self {
        Self {
            attributes,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<MemberDraft>) -> Self {
        self.children = children;
        self
    }

    /// Number of drafts in this subtree, including self.
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(draft) = stack.pop() {
            count += 1;
            stack.extend(draft.children.iter());
        }
        count
    }

    /// Strip structural keys from every draft of this subtree.
    ///
    /// Drafts copied from nested forest JSON carry the old `id` and
    /// `parentId`; the store assigns fresh ones. Returns the number of keys
    /// removed.
    pub fn strip_reserved(&mut self) -> usize {
        let mut removed = 0;
        let mut stack = vec![self];
        while let Some(draft) = stack.pop() {
            removed += draft.attributes.strip_reserved().len();
            stack.extend(draft.children.iter_mut());
        }
        removed
    }
}

/// Owned, nested view of a member and its descendants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberNode {
    #[serde(flatten)]
    pub record: MemberRecord,
    #[serde(default)]
    pub children: Vec<MemberNode>,
}

impl MemberNode {
    /// Number of nodes in this subtree, including self.
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

// Long lineages nest deeply; unlink children iteratively instead of recursing.
impl Drop for MemberNode {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

/// How reference defects (dangling, duplicate, cyclic parents) are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferencePolicy {
    /// Compatibility mode: defects degrade silently into a partial forest.
    Lenient,
    /// Defects are rejected with a validation error.
    #[default]
    Strict,
}

impl fmt::Display for ReferencePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferencePolicy::Lenient => f.write_str("lenient"),
            ReferencePolicy::Strict => f.write_str("strict"),
        }
    }
}

impl FromStr for ReferencePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(ReferencePolicy::Lenient),
            "strict" => Ok(ReferencePolicy::Strict),
            other => Err(format!(
                "unknown reference policy '{other}' (expected 'strict' or 'lenient')"
            )),
        }
    }
}
