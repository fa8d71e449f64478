//! Text renderings of a forest: terminal trees and the numbered heir outline.

use std::collections::HashMap;

use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::arena::HeirForest;
use crate::domain::entities::MemberRecord;

/// What a member label shows besides name and relation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub show_ids: bool,
    pub show_status: bool,
}

/// One-line label for a member: `Name (relation) [deceased] #id`.
pub fn label(record: &MemberRecord, options: &RenderOptions) -> String {
    let attrs = &record.attributes;
    let mut label = attrs
        .name
        .clone()
        .unwrap_or_else(|| "(unnamed)".to_string());
    if let Some(relation) = &attrs.relation {
        label.push_str(&format!(" ({relation})"));
    }
    if options.show_status && attrs.is_deceased() {
        label.push_str(" [deceased]");
    }
    if options.show_ids {
        label.push_str(&format!(" #{}", record.id));
    }
    label
}

pub trait ForestRender {
    /// One `termtree` per root.
    fn to_trees(&self, options: &RenderOptions) -> Vec<Tree<String>>;

    /// All trees as one text block, `None` when no root exists.
    fn render_trees(&self, options: &RenderOptions) -> Option<String>;
}

impl ForestRender for HeirForest {
    #[instrument(level = "debug", skip(self))]
    fn to_trees(&self, options: &RenderOptions) -> Vec<Tree<String>> {
        let mut built: HashMap<Index, Tree<String>> = HashMap::new();
        for (idx, node) in self.iter_postorder() {
            let leaves: Vec<_> = node
                .children
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            built.insert(idx, Tree::new(label(&node.record, options)).with_leaves(leaves));
        }
        self.roots()
            .iter()
            .filter_map(|root| built.remove(root))
            .collect()
    }

    fn render_trees(&self, options: &RenderOptions) -> Option<String> {
        if self.roots().is_empty() {
            return None;
        }
        Some(
            self.to_trees(options)
                .iter()
                .map(|tree| tree.to_string())
                .collect(),
        )
    }
}

/// Numbered outline of the forest, as printed on a certificate:
///
/// ```text
/// 1. Karim (deceased owner)
///   1.1. Rahim (son)
///   1.2. Salma (daughter)
/// ```
#[instrument(level = "debug", skip(forest))]
pub fn outline(forest: &HeirForest, options: &RenderOptions) -> String {
    let mut out = String::new();
    let mut number: Vec<usize> = Vec::new();
    for (level, _, node) in forest.iter_levels() {
        // Pre-order: a node at `level` is either the next sibling of the
        // last entry at that level or the first child of the previous node.
        if number.len() > level {
            number.truncate(level + 1);
            if let Some(last) = number.last_mut() {
                *last += 1;
            }
        } else {
            number.push(1);
        }
        let numbering: Vec<String> = number.iter().map(|n| n.to_string()).collect();
        out.push_str(&format!(
            "{}{}. {}\n",
            "  ".repeat(level),
            numbering.join("."),
            label(&node.record, options)
        ));
    }
    out
}
