//! Identity index over a flat member list.

use std::collections::HashMap;

use tracing::instrument;

use crate::domain::entities::{MemberId, MemberRecord};

/// Lookup of member records by id, in first-seen order.
///
/// Built once per read; the children of each entry start out empty and are
/// only realized when the index is organized into a forest.
#[derive(Debug, Clone, Default)]
pub struct MemberIndex {
    entries: Vec<MemberRecord>,
    positions: HashMap<MemberId, usize>,
    duplicates: Vec<MemberId>,
}

impl MemberIndex {
    /// Index `records` by id.
    ///
    /// A repeated id overwrites the earlier record (last write wins) but keeps
    /// the slot of its first occurrence. The overwritten ids are remembered so
    /// validation can report them; nothing here fails.
    #[instrument(level = "debug", skip(records), fields(records = records.len()))]
    pub fn build(records: &[MemberRecord]) -> Self {
        let mut index = Self {
            entries: Vec::with_capacity(records.len()),
            positions: HashMap::with_capacity(records.len()),
            duplicates: Vec::new(),
        };

        for record in records {
            match index.positions.get(&record.id) {
                Some(&pos) => {
                    index.entries[pos] = record.clone();
                    index.duplicates.push(record.id.clone());
                }
                None => {
                    index
                        .positions
                        .insert(record.id.clone(), index.entries.len());
                    index.entries.push(record.clone());
                }
            }
        }

        index
    }

    pub fn get(&self, id: &MemberId) -> Option<&MemberRecord> {
        self.positions.get(id).map(|&pos| &self.entries[pos])
    }

    pub fn contains(&self, id: &MemberId) -> bool {
        self.positions.contains_key(id)
    }

    /// Position of `id` in iteration order.
    pub fn position(&self, id: &MemberId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> std::slice::Iter<'_, MemberRecord> {
        self.entries.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &MemberId> {
        self.entries.iter().map(|r| &r.id)
    }

    /// Ids that appeared more than once in the input, once per extra occurrence.
    pub fn duplicates(&self) -> &[MemberId] {
        &self.duplicates
    }
}

impl<'a> IntoIterator for &'a MemberIndex {
    type Item = &'a MemberRecord;
    type IntoIter = std::slice::Iter<'a, MemberRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Index a flat record list by id. See [`MemberIndex::build`].
pub fn index_records(records: &[MemberRecord]) -> MemberIndex {
    MemberIndex::build(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_unique_ids_when_indexing_then_keeps_input_order() {
        let records = vec![
            MemberRecord::child_of("b", "a"),
            MemberRecord::root("a"),
            MemberRecord::child_of("c", "a"),
        ];

        let index = index_records(&records);

        let ids: Vec<&str> = index.ids().map(MemberId::as_str).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert!(index.duplicates().is_empty());
    }

    #[test]
    fn given_duplicate_id_when_indexing_then_last_write_wins_in_first_slot() {
        let records = vec![
            MemberRecord::root("a"),
            MemberRecord::root("b"),
            MemberRecord::child_of("a", "b"),
        ];

        let index = index_records(&records);

        assert_eq!(index.len(), 2);
        assert_eq!(index.position(&MemberId::new("a")), Some(0));
        assert_eq!(
            index.get(&MemberId::new("a")).and_then(|r| r.parent()),
            Some(&MemberId::new("b"))
        );
        assert_eq!(index.duplicates(), &[MemberId::new("a")]);
    }
}
