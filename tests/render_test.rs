//! Tests for member labels, terminal trees and numbered outlines

use warish::domain::{
    build_forest, label, outline, ForestRender, LivingStatus, MemberAttributes, MemberRecord,
    ReferencePolicy, RenderOptions,
};

fn member(id: &str, parent: Option<&str>, name: &str, relation: &str) -> MemberRecord {
    let record = match parent {
        Some(parent) => MemberRecord::child_of(id, parent),
        None => MemberRecord::root(id),
    };
    record.with_attributes(MemberAttributes::named(name).with_relation(relation))
}

fn small_family() -> Vec<MemberRecord> {
    let mut owner = member("o", None, "Karim", "deceased owner");
    owner.attributes.living_status = Some(LivingStatus::Deceased);
    vec![
        owner,
        member("s", Some("o"), "Rahim", "son"),
        member("d", Some("o"), "Salma", "daughter"),
        member("g", Some("s"), "Tanvir", "grandson"),
    ]
}

#[test]
fn given_options_when_labelling_then_status_and_id_follow_flags() {
    let records = small_family();
    let owner = &records[0];

    let plain = RenderOptions::default();
    let full = RenderOptions {
        show_ids: true,
        show_status: true,
    };

    assert_eq!(label(owner, &plain), "Karim (deceased owner)");
    assert_eq!(label(owner, &full), "Karim (deceased owner) [deceased] #o");
    assert_eq!(label(&MemberRecord::root("x"), &plain), "(unnamed)");
}

#[test]
fn given_forest_when_rendering_trees_then_one_tree_per_root() {
    let mut records = small_family();
    records.push(member("z", None, "Zainab", "niece"));
    let forest = build_forest(&records, ReferencePolicy::Strict).unwrap();

    let trees = forest.to_trees(&RenderOptions::default());

    assert_eq!(trees.len(), 2);
    let first = trees[0].to_string();
    assert!(first.starts_with("Karim (deceased owner)\n"));
    assert!(first.contains("├── Rahim (son)"));
    assert!(first.contains("│   └── Tanvir (grandson)"));
    assert!(first.contains("└── Salma (daughter)"));
    assert_eq!(trees[1].to_string(), "Zainab (niece)\n");
}

#[test]
fn given_forest_when_rendering_outline_then_numbers_follow_nesting() {
    let forest = build_forest(&small_family(), ReferencePolicy::Strict).unwrap();

    let text = outline(
        &forest,
        &RenderOptions {
            show_ids: false,
            show_status: true,
        },
    );

    assert_eq!(
        text,
        "1. Karim (deceased owner) [deceased]\n\
         \x20\x201.1. Rahim (son)\n\
         \x20\x20\x20\x201.1.1. Tanvir (grandson)\n\
         \x20\x201.2. Salma (daughter)\n"
    );
}

#[test]
fn given_empty_forest_when_rendering_then_nothing_is_produced() {
    let forest = build_forest(&[], ReferencePolicy::Strict).unwrap();

    assert!(forest.to_trees(&RenderOptions::default()).is_empty());
    assert_eq!(outline(&forest, &RenderOptions::default()), "");
}

#[test]
fn given_family_when_rendering_tree_text_then_matches_individual_trees() {
    let forest = build_forest(&small_family(), ReferencePolicy::Strict).unwrap();
    let options = RenderOptions::default();

    let text = forest.render_trees(&options).unwrap();

    let expected: String = forest
        .to_trees(&options)
        .iter()
        .map(|tree| tree.to_string())
        .collect();
    assert_eq!(text, expected);
    assert!(text.contains("Tanvir (grandson)"));
}

#[test]
fn given_only_parent_cycle_when_rendering_tree_text_then_none_despite_members() {
    let records = vec![
        member("p", Some("q"), "Rahim", "son"),
        member("q", Some("p"), "Salma", "daughter"),
    ];
    let forest = build_forest(&records, ReferencePolicy::Lenient).unwrap();

    assert!(!forest.is_empty());
    assert!(forest.roots().is_empty());
    assert_eq!(forest.render_trees(&RenderOptions::default()), None);
    assert_eq!(
        build_forest(&[], ReferencePolicy::Strict)
            .unwrap()
            .render_trees(&RenderOptions::default()),
        None
    );
}
