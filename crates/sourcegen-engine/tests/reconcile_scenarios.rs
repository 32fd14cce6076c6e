//! End-to-end reconciliation scenarios on in-memory documents

use pretty_assertions::assert_eq;
use serde_yaml::{Mapping, Value};
use sourcegen_core::{ColumnDescriptor, TableDescriptor};
use sourcegen_dbt::{Column, Source, SourceDocument, Table};
use sourcegen_engine::{merge_document, ChangeSet, MergeOptions, MergeTarget};

fn target(prune_tables: bool, prune_columns: bool) -> MergeTarget {
    MergeTarget::new("raw", "proj", "raw").with_options(MergeOptions {
        prune_absent_tables: prune_tables,
        prune_absent_columns: prune_columns,
    })
}

fn t1_snapshot() -> Vec<TableDescriptor> {
    vec![TableDescriptor::new("t1")
        .with_column(ColumnDescriptor::new("id", "INT64"))
        .with_column(ColumnDescriptor::new("name", "STRING"))]
}

fn pii_false() -> Mapping {
    Mapping::from_iter([(Value::String("pii".to_string()), Value::Bool(false))])
}

fn source_with(tables: Vec<Table>) -> SourceDocument {
    SourceDocument::new().with_sources(vec![Source::new("raw")
        .with_database("proj")
        .with_schema("raw")
        .with_tables(tables)])
}

#[test]
fn scenario_a_empty_prior_document() {
    let merged = merge_document(&t1_snapshot(), None, &target(false, false));

    assert_eq!(merged.version, 2);
    assert_eq!(merged.sources.len(), 1);

    let source = &merged.sources[0];
    assert_eq!(source.name, "raw");
    assert_eq!(source.table_names(), vec!["t1"]);

    let table = &source.tables[0];
    assert_eq!(table.column_names(), vec!["id", "name"]);
    for column in &table.columns {
        assert_eq!(column.description, "");
        assert!(column.meta.is_none());
        assert!(column.tests.is_none());
    }
    assert_eq!(table.columns[0].data_type.as_deref(), Some("INT64"));
    assert_eq!(table.columns[1].data_type.as_deref(), Some("STRING"));
}

#[test]
fn scenario_b_annotations_survive() {
    let prior = source_with(vec![Table::new("t1").with_columns(vec![Column::new("id")
        .with_description("Primary key")
        .with_meta(pii_false())])]);

    let merged = merge_document(&t1_snapshot(), Some(&prior), &target(false, false));
    let table = &merged.sources[0].tables[0];

    let id = table.find_column("id").unwrap();
    assert_eq!(id.description, "Primary key");
    assert_eq!(id.meta, Some(pii_false()));
    assert_eq!(id.data_type.as_deref(), Some("INT64"));

    let name = table.find_column("name").unwrap();
    assert_eq!(name.description, "");
    assert!(name.meta.is_none());
}

#[test]
fn scenario_c_orphan_table_kept_or_pruned() {
    let t2 = Table::new("t2")
        .with_description("Retired table")
        .with_columns(vec![Column::new("x").with_data_type("BOOL")]);
    let prior = source_with(vec![t2.clone(), Table::new("t1")]);

    let kept = merge_document(&t1_snapshot(), Some(&prior), &target(false, false));
    let source = &kept.sources[0];
    assert_eq!(source.table_names(), vec!["t1", "t2"]);
    assert_eq!(source.tables[1], t2);

    let pruned = merge_document(&t1_snapshot(), Some(&prior), &target(true, false));
    assert_eq!(pruned.sources[0].table_names(), vec!["t1"]);
}

#[test]
fn scenario_d_identifier_override_preserved() {
    let prior = source_with(vec![Table::new("t1").with_identifier("legacy_t1")]);

    let merged = merge_document(&t1_snapshot(), Some(&prior), &target(true, true));
    let table = &merged.sources[0].tables[0];

    assert_eq!(table.name, "t1");
    assert_eq!(table.identifier.as_deref(), Some("legacy_t1"));
    assert_eq!(table.column_names(), vec!["id", "name"]);
}

#[test]
fn reconciling_twice_is_idempotent() {
    let prior = source_with(vec![
        Table::new("t0").with_description("gone from warehouse"),
        Table::new("t1").with_columns(vec![
            Column::new("legacy").with_description("kept"),
            Column::new("id").with_description("Primary key").with_meta(pii_false()),
        ]),
    ]);
    let snapshot = t1_snapshot();

    for (prune_tables, prune_columns) in [(false, false), (true, false), (true, true)] {
        let target = target(prune_tables, prune_columns);
        let once = merge_document(&snapshot, Some(&prior), &target);
        let twice = merge_document(&snapshot, Some(&once), &target);
        assert_eq!(twice, once);
    }

    let fresh = merge_document(&snapshot, None, &target(false, false));
    assert_eq!(merge_document(&snapshot, Some(&fresh), &target(false, false)), fresh);
}

#[test]
fn table_order_follows_snapshot_then_orphans() {
    let prior = source_with(vec![
        Table::new("orphan_b"),
        Table::new("c"),
        Table::new("orphan_a"),
        Table::new("a"),
    ]);
    let snapshot = vec![
        TableDescriptor::new("a"),
        TableDescriptor::new("b"),
        TableDescriptor::new("c"),
    ];

    let merged = merge_document(&snapshot, Some(&prior), &target(false, false));
    assert_eq!(
        merged.sources[0].table_names(),
        vec!["a", "b", "c", "orphan_b", "orphan_a"]
    );
}

#[test]
fn table_level_annotations_preserved() {
    let tests = vec![Value::String("dbt_utils.recency".to_string())];
    let prior = source_with(vec![Table::new("t1")
        .with_description("Curated")
        .with_meta(pii_false())
        .with_tests(tests.clone())]);
    let snapshot = vec![t1_snapshot().remove(0).with_description("From warehouse")];

    let merged = merge_document(&snapshot, Some(&prior), &target(true, true));
    let table = &merged.sources[0].tables[0];
    assert_eq!(table.description, "Curated");
    assert_eq!(table.meta, Some(pii_false()));
    assert_eq!(table.tests, Some(tests));
}

#[test]
fn other_sources_pass_through_unchanged() {
    let stripe = Source::new("stripe")
        .with_schema("stripe_raw")
        .with_description("Payments")
        .with_tables(vec![Table::new("charges").with_columns(vec![Column::new("id")])]);
    let prior = SourceDocument {
        version: 2,
        sources: vec![
            Source::new("raw").with_schema("raw").with_tables(vec![Table::new("t1")]),
            stripe.clone(),
        ],
    };

    let merged = merge_document(&t1_snapshot(), Some(&prior), &target(true, true));
    assert_eq!(merged.sources.len(), 2);
    // Untouched sources come first, the merged one last
    assert_eq!(merged.sources[0], stripe);
    assert_eq!(merged.sources[1].name, "raw");
}

#[test]
fn empty_snapshot_with_pruning_clears_tables() {
    let prior = source_with(vec![Table::new("t1"), Table::new("t2")]);

    let kept = merge_document(&[], Some(&prior), &target(false, false));
    assert_eq!(kept.sources[0].table_names(), vec!["t1", "t2"]);

    let pruned = merge_document(&[], Some(&prior), &target(true, true));
    assert!(pruned.sources[0].tables.is_empty());
}

#[test]
fn change_set_reports_merge_effects() {
    let prior = source_with(vec![
        Table::new("t1").with_columns(vec![Column::new("id").with_data_type("STRING")]),
        Table::new("t9"),
    ]);
    let mut snapshot = t1_snapshot();
    snapshot.push(TableDescriptor::new("t3"));

    let merged = merge_document(&snapshot, Some(&prior), &target(true, true));
    let changes = ChangeSet::between(prior.sources.first(), &merged.sources[0]);

    assert_eq!(changes.added_tables, vec!["t3"]);
    assert_eq!(changes.removed_tables, vec!["t9"]);
    assert_eq!(changes.added_column_count(), 1);
    assert_eq!(changes.type_change_count(), 1);
}
