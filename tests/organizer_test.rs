//! Tests for organizing indexed member records into a forest

use std::path::Path;

use rstest::rstest;

use warish::domain::{
    build_forest, find_reference_issues, organize, organize_with_policy, DomainError, HeirForest,
    MemberId, MemberIndex, MemberRecord, ReferenceIssue, ReferencePolicy,
};
use warish::util::testing;

fn load_records(name: &str) -> Vec<MemberRecord> {
    let path = Path::new("tests/resources/records").join(name);
    let content = std::fs::read_to_string(&path).unwrap();
    serde_json::from_str(&content).unwrap()
}

fn ids<'a>(records: impl IntoIterator<Item = &'a MemberRecord>) -> Vec<&'a str> {
    records.into_iter().map(|r| r.id.as_str()).collect()
}

fn preorder(forest: &HeirForest) -> Vec<&str> {
    forest.iter().map(|(_, node)| node.record.id.as_str()).collect()
}

fn children_of<'a>(forest: &'a HeirForest, id: &str) -> Vec<&'a str> {
    let node = forest.find(&MemberId::new(id)).unwrap();
    node.children
        .iter()
        .map(|&idx| forest.get_node(idx).unwrap().record.id.as_str())
        .collect()
}

// ============================================================
// Basic Scenarios
// ============================================================

#[test]
fn given_two_roots_with_one_child_when_organizing_then_child_under_first_root() {
    testing::init_test_setup();
    let records = vec![
        MemberRecord::root("1"),
        MemberRecord::child_of("2", "1"),
        MemberRecord::root("3"),
    ];

    let forest = organize(&MemberIndex::build(&records));

    assert_eq!(ids(forest.root_records()), vec!["1", "3"]);
    assert_eq!(children_of(&forest, "1"), vec!["2"]);
    assert!(children_of(&forest, "3").is_empty());
}

#[test]
fn given_three_generations_when_organizing_then_single_chain() {
    let records = vec![
        MemberRecord::root("a"),
        MemberRecord::child_of("b", "a"),
        MemberRecord::child_of("c", "b"),
    ];

    let forest = organize(&MemberIndex::build(&records));

    assert_eq!(ids(forest.root_records()), vec!["a"]);
    assert_eq!(children_of(&forest, "a"), vec!["b"]);
    assert_eq!(children_of(&forest, "b"), vec!["c"]);
    assert_eq!(forest.depth(), 3);
}

#[test]
fn given_root_with_two_children_and_grandchild_when_organizing_then_nested() {
    let records = vec![
        MemberRecord::root("a"),
        MemberRecord::child_of("b", "a"),
        MemberRecord::child_of("c", "a"),
        MemberRecord::child_of("d", "b"),
    ];

    let forest = organize(&MemberIndex::build(&records));

    assert_eq!(ids(forest.root_records()), vec!["a"]);
    assert_eq!(children_of(&forest, "a"), vec!["b", "c"]);
    assert_eq!(children_of(&forest, "b"), vec!["d"]);
    assert_eq!(forest.reachable_count(), 4);
}

#[test]
fn given_empty_input_when_organizing_then_empty_forest() {
    let forest = organize(&MemberIndex::build(&[]));

    assert!(forest.is_empty());
    assert!(forest.roots().is_empty());
    assert!(forest.to_nodes().is_empty());
}

#[test]
fn given_siblings_when_organizing_then_children_keep_input_order() {
    let records = vec![
        MemberRecord::root("p"),
        MemberRecord::child_of("c3", "p"),
        MemberRecord::child_of("c1", "p"),
        MemberRecord::child_of("c2", "p"),
    ];

    let forest = organize(&MemberIndex::build(&records));

    assert_eq!(children_of(&forest, "p"), vec!["c3", "c1", "c2"]);
}

// ============================================================
// Structural Properties
// ============================================================

#[test]
fn given_family_fixture_when_organizing_then_every_member_appears_once() {
    let records = load_records("family.json");

    let forest = build_forest(&records, ReferencePolicy::Strict).unwrap();

    let mut seen = preorder(&forest);
    assert_eq!(seen, vec!["k1", "k2", "k3", "k5", "k6", "k4"]);
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), records.len());
    assert_eq!(forest.reachable_count(), records.len());
}

#[test]
fn given_family_fixture_when_organizing_then_roots_have_no_resolvable_parent() {
    let records = load_records("family.json");
    let index = MemberIndex::build(&records);

    let forest = organize(&index);

    for root in forest.root_records() {
        let parent = root.parent();
        assert!(parent.map(|p| !index.contains(p)).unwrap_or(true));
    }
    assert_eq!(ids(forest.root_records()), vec!["k1"]);
}

#[test]
fn given_family_fixture_when_organizing_then_each_child_sits_under_its_parent() {
    let records = load_records("family.json");

    let forest = organize(&MemberIndex::build(&records));

    for (_, node) in forest.iter() {
        for &child in &node.children {
            let child = forest.get_node(child).unwrap();
            assert_eq!(child.record.parent(), Some(&node.record.id));
        }
    }
}

#[test]
fn given_records_when_organizing_then_payload_is_carried_unchanged() {
    let records = load_records("family.json");

    let forest = organize(&MemberIndex::build(&records));

    for record in &records {
        let node = forest.find(&record.id).unwrap();
        assert_eq!(&node.record, record);
    }
    let k6 = forest.find(&MemberId::new("k6")).unwrap();
    assert_eq!(
        k6.record.attributes.extra.get("ageAtApplication"),
        Some(&serde_json::Value::from(17))
    );
}

#[test]
fn given_child_listed_before_parent_when_organizing_then_order_does_not_matter() {
    let mut records = load_records("family.json");
    records.reverse();

    let forest = build_forest(&records, ReferencePolicy::Strict).unwrap();

    assert_eq!(ids(forest.root_records()), vec!["k1"]);
    assert_eq!(forest.reachable_count(), 6);
    assert_eq!(forest.depth(), 3);
}

// ============================================================
// Reference Issues
// ============================================================

#[test]
fn given_dangling_parent_when_lenient_then_member_becomes_root() {
    let records = load_records("dangling.json");

    let forest = build_forest(&records, ReferencePolicy::Lenient).unwrap();

    assert_eq!(ids(forest.root_records()), vec!["x"]);
    assert_eq!(children_of(&forest, "x"), vec!["y"]);
}

#[test]
fn given_dangling_parent_when_strict_then_reports_unknown_parent() {
    let records = load_records("dangling.json");

    let result = build_forest(&records, ReferencePolicy::Strict);

    match result {
        Err(DomainError::InvalidReferences(issues)) => assert_eq!(
            issues,
            vec![ReferenceIssue::DanglingParent {
                id: MemberId::new("x"),
                parent_id: MemberId::new("missing"),
            }]
        ),
        other => panic!("expected InvalidReferences, got {:?}", other),
    }
}

#[test]
fn given_parent_cycle_when_lenient_then_cycle_members_unreachable() {
    let records = load_records("cycle.json");

    let forest = build_forest(&records, ReferencePolicy::Lenient).unwrap();

    assert_eq!(ids(forest.root_records()), vec!["r"]);
    assert_eq!(preorder(&forest), vec!["r", "s"]);
    assert_eq!(forest.reachable_count(), 2);
    assert_eq!(forest.len(), 4);
    assert_eq!(ids(forest.unreachable()), vec!["p", "q"]);
}

#[test]
fn given_parent_cycle_when_strict_then_names_cycle_members() {
    let records = load_records("cycle.json");

    let err = build_forest(&records, ReferencePolicy::Strict).unwrap_err();

    assert_eq!(
        err.to_string(),
        "invalid member references: members in a parent cycle, unreachable from any root: p, q"
    );
}

#[test]
fn given_descendants_of_cycle_when_strict_then_cycle_and_stranded_reported_apart() {
    // r -> p, p <-> q, s -> r, t is an unrelated root
    let records = vec![
        MemberRecord::root("t"),
        MemberRecord::child_of("r", "p"),
        MemberRecord::child_of("p", "q"),
        MemberRecord::child_of("q", "p"),
        MemberRecord::child_of("s", "r"),
    ];

    let result = build_forest(&records, ReferencePolicy::Strict);

    match result {
        Err(DomainError::InvalidReferences(issues)) => assert_eq!(
            issues,
            vec![
                ReferenceIssue::ParentCycle {
                    ids: vec![MemberId::new("p"), MemberId::new("q")],
                },
                ReferenceIssue::Stranded {
                    ids: vec![MemberId::new("r"), MemberId::new("s")],
                },
            ]
        ),
        other => panic!("expected InvalidReferences, got {:?}", other),
    }
}

#[test]
fn given_descendants_of_cycle_when_lenient_then_cycle_members_distinguished() {
    let records = vec![
        MemberRecord::root("t"),
        MemberRecord::child_of("r", "p"),
        MemberRecord::child_of("p", "q"),
        MemberRecord::child_of("q", "p"),
    ];

    let forest = build_forest(&records, ReferencePolicy::Lenient).unwrap();

    assert_eq!(preorder(&forest), vec!["t"]);
    assert_eq!(ids(forest.unreachable()), vec!["r", "p", "q"]);
    assert_eq!(ids(forest.cycle_members()), vec!["p", "q"]);
}

#[test]
fn given_duplicate_id_when_organizing_then_last_record_is_used_once() {
    let records = vec![
        MemberRecord::root("a"),
        MemberRecord::child_of("b", "a"),
        MemberRecord::child_of("b", "zz"),
    ];
    let index = MemberIndex::build(&records);

    let forest = organize(&index);

    // The surviving "b" points at an unknown parent and becomes a root
    assert_eq!(ids(forest.root_records()), vec!["a", "b"]);
    assert_eq!(forest.len(), 2);
    assert_eq!(
        find_reference_issues(&index, &forest),
        vec![
            ReferenceIssue::DuplicateId {
                id: MemberId::new("b")
            },
            ReferenceIssue::DanglingParent {
                id: MemberId::new("b"),
                parent_id: MemberId::new("zz"),
            },
        ]
    );
}

#[rstest]
#[case::clean(vec![MemberRecord::root("a"), MemberRecord::child_of("b", "a")], 0)]
#[case::self_parent(vec![MemberRecord::child_of("a", "a")], 1)]
#[case::dangling(vec![MemberRecord::child_of("a", "nobody")], 1)]
#[case::duplicate(vec![MemberRecord::root("a"), MemberRecord::root("a")], 1)]
#[case::two_issues(
    vec![MemberRecord::child_of("a", "a"), MemberRecord::child_of("b", "nobody")],
    2
)]
fn given_member_set_when_finding_issues_then_counts_match(
    #[case] records: Vec<MemberRecord>,
    #[case] expected: usize,
) {
    let index = MemberIndex::build(&records);
    let forest = organize(&index);

    let issues = find_reference_issues(&index, &forest);

    assert_eq!(issues.len(), expected, "issues: {:?}", issues);
    assert_eq!(
        organize_with_policy(&index, ReferencePolicy::Strict).is_ok(),
        expected == 0
    );
    assert!(organize_with_policy(&index, ReferencePolicy::Lenient).is_ok());
}

#[test]
fn given_empty_parent_id_when_organizing_then_treated_as_root() {
    let records: Vec<MemberRecord> =
        serde_json::from_str(r#"[{"id": "a", "parentId": ""}, {"id": "b", "parentId": "a"}]"#)
            .unwrap();

    let forest = build_forest(&records, ReferencePolicy::Strict).unwrap();

    assert_eq!(ids(forest.root_records()), vec!["a"]);
    assert_eq!(children_of(&forest, "a"), vec!["b"]);
}
