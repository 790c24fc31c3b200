//! Phase 3 tests: Text index, deduplication, and bulk loading.

use std::collections::BTreeMap;
use std::sync::Arc;

use semantic_tags::index::{AddOptions, IndexValidation, ItemUpdate, TextIndex};
use semantic_tags::schema::{FieldDocument, SchemaCatalog, ValueNode};
use semantic_tags::types::{content_hash, Descriptor, IndexedItem, Metadata, TagError};

fn catalog() -> Arc<SchemaCatalog> {
    let domain = FieldDocument::new(
        "v1",
        true,
        vec![
            ValueNode::branch("Science", vec![ValueNode::leaf("Biology"), ValueNode::leaf("Physics")]),
            ValueNode::leaf("Engineering"),
        ],
    );
    let intent = FieldDocument::new(
        "v1",
        true,
        vec![ValueNode::branch("Research", vec![ValueNode::leaf("Applied")])],
    );
    Arc::new(
        SchemaCatalog::builder()
            .field("v1", "domain", domain)
            .field("v1", "intent", intent)
            .build()
            .unwrap(),
    )
}

fn validated_index() -> TextIndex {
    TextIndex::with_validation(IndexValidation::new(catalog(), "v1"))
}

fn desc(domain: &str) -> Descriptor {
    Descriptor::builder().domain(domain).build().unwrap()
}

fn complete(domain: &str) -> Descriptor {
    Descriptor::builder().domain(domain).intent("Research → Applied").build().unwrap()
}

fn meta(key: &str, value: serde_json::Value) -> Metadata {
    let mut m = Metadata::new();
    m.insert(key.to_string(), value);
    m
}

fn ids(items: &[&IndexedItem]) -> Vec<String> {
    items.iter().map(|i| i.id.clone()).collect()
}

// ==================== Add / Get ====================

#[test]
fn test_add_generates_uuid() {
    let mut index = TextIndex::new();
    let id = index
        .add("hello", desc("Science"), Metadata::new(), AddOptions::default())
        .unwrap()
        .id
        .clone();

    assert_eq!(id.len(), 36);
    assert!(uuid::Uuid::parse_str(&id).is_ok());
    assert_eq!(index.len(), 1);
    assert!(index.contains(&id));

    let item = index.get(&id).unwrap();
    assert_eq!(item.text, "hello");
    assert_eq!(item.content_hash, content_hash("hello"));
    assert_eq!(item.created_at, item.updated_at);
}

#[test]
fn test_add_with_explicit_id() {
    let mut index = TextIndex::new();
    let item = index
        .add("hello", desc("Science"), meta("author", "alice".into()), AddOptions::with_id("a"))
        .unwrap();
    assert_eq!(item.id, "a");
    assert_eq!(item.metadata["author"], "alice");
    assert!(index.get("missing").is_none());
}

#[test]
fn test_duplicate_content_rejected() {
    let mut index = TextIndex::new();
    index.add("same text", desc("Science"), Metadata::new(), AddOptions::with_id("a")).unwrap();

    let err = index
        .add("same text", desc("Engineering"), Metadata::new(), AddOptions::with_id("b"))
        .unwrap_err();
    assert!(matches!(err, TagError::Indexing { .. }));
    assert_eq!(err.to_string(), "Indexing error: Duplicate content detected (existing id: a)");
    assert_eq!(index.len(), 1);
    assert!(!index.contains("b"));
}

#[test]
fn test_duplicate_content_allowed() {
    let mut index = TextIndex::new();
    index.add("same text", desc("Science"), Metadata::new(), AddOptions::with_id("a")).unwrap();
    index
        .add(
            "same text",
            desc("Engineering"),
            Metadata::new(),
            AddOptions::with_id("b").allow_duplicates(),
        )
        .unwrap();

    assert_eq!(index.len(), 2);
    assert_eq!(index.get("a").unwrap().field("domain"), Some("Science"));
    assert_eq!(index.get("b").unwrap().field("domain"), Some("Engineering"));
    assert_eq!(index.id_for_hash(&content_hash("same text")), Some("a"));
}

#[test]
fn test_removing_allowed_duplicate_keeps_original_protected() {
    let mut index = TextIndex::new();
    index.add("same text", desc("Science"), Metadata::new(), AddOptions::with_id("a")).unwrap();
    index
        .add("same text", desc("Science"), Metadata::new(), AddOptions::with_id("b").allow_duplicates())
        .unwrap();

    assert!(index.remove("b"));
    assert_eq!(index.id_for_hash(&content_hash("same text")), Some("a"));

    let third = index.add("same text", desc("Science"), Metadata::new(), AddOptions::with_id("c"));
    assert!(third.is_err());
    assert!(!index.contains("c"));
}

#[test]
fn test_removing_hash_owner_passes_hash_to_remaining_copy() {
    let mut index = TextIndex::new();
    index.add("same text", desc("Science"), Metadata::new(), AddOptions::with_id("a")).unwrap();
    index
        .add("same text", desc("Science"), Metadata::new(), AddOptions::with_id("b").allow_duplicates())
        .unwrap();

    assert!(index.remove("a"));
    assert_eq!(index.id_for_hash(&content_hash("same text")), Some("b"));

    let err = index
        .add("same text", desc("Science"), Metadata::new(), AddOptions::with_id("c"))
        .unwrap_err();
    assert_eq!(err.to_string(), "Indexing error: Duplicate content detected (existing id: b)");
}

#[test]
fn test_overwrite_same_id_keeps_position() {
    let mut index = TextIndex::new();
    index.add("first", desc("A"), Metadata::new(), AddOptions::with_id("a")).unwrap();
    index.add("one", desc("X"), Metadata::new(), AddOptions::with_id("x")).unwrap();
    index.add("last", desc("B"), Metadata::new(), AddOptions::with_id("b")).unwrap();

    index.add("two", desc("Y"), Metadata::new(), AddOptions::with_id("x")).unwrap();

    assert_eq!(index.len(), 3);
    assert_eq!(index.get("x").unwrap().text, "two");
    assert_eq!(index.id_for_hash(&content_hash("one")), None);
    assert_eq!(index.id_for_hash(&content_hash("two")), Some("x"));
    assert_eq!(ids(&index.get_all()), vec!["a", "x", "b"]);
}

#[test]
fn test_get_all_insertion_order() {
    let mut index = TextIndex::new();
    for (i, id) in ["c", "a", "b"].iter().enumerate() {
        index
            .add(format!("text {i}"), desc("A"), Metadata::new(), AddOptions::with_id(*id))
            .unwrap();
    }
    assert_eq!(ids(&index.get_all()), vec!["c", "a", "b"]);
    assert_eq!(index.snapshot().len(), 3);
}

// ==================== Validation ====================

#[test]
fn test_validation_on_add() {
    let mut index = validated_index();
    index
        .add("ok", complete("Science → Biology"), Metadata::new(), AddOptions::with_id("ok"))
        .unwrap();

    let err = index
        .add("bad", complete("Zoology"), Metadata::new(), AddOptions::with_id("bad"))
        .unwrap_err();
    assert!(matches!(err, TagError::Indexing { .. }));
    assert!(err.to_string().starts_with("Indexing error: Descriptor validation failed:"));
    match err {
        TagError::Indexing { errors, .. } => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].contains("Zoology"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = index
        .add("incomplete", desc("Science"), Metadata::new(), AddOptions::default())
        .unwrap_err();
    assert!(err.to_string().contains("Missing required fields: intent"));

    assert_eq!(index.len(), 1);
    assert!(index.validation().is_some());
}

#[test]
fn test_validation_can_be_disabled() {
    let mut index = validated_index();
    index.set_validation(None);
    index.add("anything", desc("Zoology"), Metadata::new(), AddOptions::default()).unwrap();
    assert_eq!(index.len(), 1);
}

// ==================== Update ====================

#[test]
fn test_update_missing_id() {
    let mut index = TextIndex::new();
    let result = index.update("nope", ItemUpdate::default().text("x")).unwrap();
    assert!(result.is_none());
}

#[test]
fn test_update_text_rehashes() {
    let mut index = TextIndex::new();
    index.add("old text", desc("A"), Metadata::new(), AddOptions::with_id("a")).unwrap();

    let item = index.update("a", ItemUpdate::default().text("new text")).unwrap().unwrap();
    assert_eq!(item.text, "new text");
    assert_eq!(item.content_hash, content_hash("new text"));
    assert!(item.updated_at >= item.created_at);

    assert_eq!(index.id_for_hash(&content_hash("new text")), Some("a"));
    assert_eq!(index.id_for_hash(&content_hash("old text")), None);

    // The old content is free to be indexed again.
    index.add("old text", desc("A"), Metadata::new(), AddOptions::with_id("b")).unwrap();
    assert_eq!(index.len(), 2);
}

#[test]
fn test_update_to_existing_text_keeps_original_owner() {
    let mut index = TextIndex::new();
    index.add("alpha", desc("A"), Metadata::new(), AddOptions::with_id("a")).unwrap();
    index.add("beta", desc("A"), Metadata::new(), AddOptions::with_id("b")).unwrap();

    index.update("b", ItemUpdate::default().text("alpha")).unwrap();
    assert_eq!(index.id_for_hash(&content_hash("alpha")), Some("a"));
    assert_eq!(index.id_for_hash(&content_hash("beta")), None);

    index.update("b", ItemUpdate::default().text("gamma")).unwrap();
    assert_eq!(index.id_for_hash(&content_hash("alpha")), Some("a"));
    assert_eq!(index.id_for_hash(&content_hash("gamma")), Some("b"));

    let err = index
        .add("alpha", desc("A"), Metadata::new(), AddOptions::with_id("c"))
        .unwrap_err();
    assert_eq!(err.to_string(), "Indexing error: Duplicate content detected (existing id: a)");
}

#[test]
fn test_update_descriptor_validated() {
    let mut index = validated_index();
    index
        .add("text", complete("Science"), Metadata::new(), AddOptions::with_id("a"))
        .unwrap();

    let err = index
        .update("a", ItemUpdate::default().text("changed").descriptor(complete("Zoology")))
        .unwrap_err();
    assert!(matches!(err, TagError::Indexing { .. }));

    let item = index.get("a").unwrap();
    assert_eq!(item.text, "text");
    assert_eq!(item.field("domain"), Some("Science"));

    let item = index
        .update("a", ItemUpdate::default().descriptor(complete("Engineering")))
        .unwrap()
        .unwrap();
    assert_eq!(item.field("domain"), Some("Engineering"));
}

#[test]
fn test_update_metadata_merges() {
    let mut index = TextIndex::new();
    index
        .add("text", desc("A"), meta("author", "alice".into()), AddOptions::with_id("a"))
        .unwrap();

    let mut extra = meta("year", 2024.into());
    extra.insert("author".into(), "bob".into());
    let item = index.update("a", ItemUpdate::default().metadata(extra)).unwrap().unwrap();

    assert_eq!(item.metadata.len(), 2);
    assert_eq!(item.metadata["author"], "bob");
    assert_eq!(item.metadata["year"], 2024);
}

// ==================== Remove / Clear ====================

#[test]
fn test_remove() {
    let mut index = TextIndex::new();
    index.add("text", desc("A"), Metadata::new(), AddOptions::with_id("a")).unwrap();

    assert!(index.remove("a"));
    assert!(!index.remove("a"));
    assert!(index.is_empty());
    assert_eq!(index.id_for_hash(&content_hash("text")), None);

    index.add("text", desc("A"), Metadata::new(), AddOptions::with_id("a2")).unwrap();
    assert_eq!(index.len(), 1);
}

#[test]
fn test_clear() {
    let mut index = TextIndex::new();
    index.add("one", desc("A"), Metadata::new(), AddOptions::default()).unwrap();
    index.add("two", desc("B"), Metadata::new(), AddOptions::default()).unwrap();
    index.clear();
    assert_eq!(index.len(), 0);
    assert!(index.get_all().is_empty());
    index.add("one", desc("A"), Metadata::new(), AddOptions::default()).unwrap();
}

// ==================== Filters ====================

fn filter_fixture() -> TextIndex {
    let mut index = TextIndex::new();
    let entries = [
        ("bio", "Science → Biology", "Neutral"),
        ("phys", "Science → Physics", "Formal"),
        ("sci", "Science", "Neutral"),
        ("fiction", "ScienceFiction", "Playful"),
        ("eng", "Engineering", "Formal"),
    ];
    for (id, domain, tone) in entries {
        let d = Descriptor::builder().domain(domain).tone(tone).build().unwrap();
        index.add(format!("text of {id}"), d, Metadata::new(), AddOptions::with_id(id)).unwrap();
    }
    index
}

#[test]
fn test_filter_by_field_exact() {
    let index = filter_fixture();
    assert_eq!(ids(&index.filter_by_field("domain", "Science")), vec!["sci"]);
    assert_eq!(ids(&index.filter_by_field("tone", "Formal")), vec!["phys", "eng"]);
    assert!(index.filter_by_field("audience", "Anyone").is_empty());
}

#[test]
fn test_filter_by_fields_all_must_match() {
    let index = filter_fixture();
    let mut filters = BTreeMap::new();
    filters.insert("domain".to_string(), "Science → Physics".to_string());
    filters.insert("tone".to_string(), "Formal".to_string());
    assert_eq!(ids(&index.filter_by_fields(&filters)), vec!["phys"]);

    filters.insert("tone".to_string(), "Neutral".to_string());
    assert!(index.filter_by_fields(&filters).is_empty());
}

#[test]
fn test_filter_by_prefix_respects_boundary() {
    let index = filter_fixture();
    assert_eq!(ids(&index.filter_by_prefix("domain", "Science")), vec!["bio", "phys", "sci"]);
    assert_eq!(ids(&index.filter_by_prefix("domain", "Science → Biology")), vec!["bio"]);
}

#[test]
fn test_get_field_values() {
    let index = filter_fixture();
    let tones: Vec<String> = index.get_field_values("tone").into_iter().collect();
    assert_eq!(tones, vec!["Formal", "Neutral", "Playful"]);
    assert!(index.get_field_values("audience").is_empty());
}

// ==================== Bulk Loading ====================

#[test]
fn test_from_items_trusted() {
    let a = IndexedItem::new("a", "same", desc("A"), Metadata::new());
    let b = IndexedItem::new("b", "same", desc("B"), Metadata::new());
    let index = TextIndex::from_items(vec![a, b], None);

    assert_eq!(index.len(), 2);
    assert_eq!(index.id_for_hash(&content_hash("same")), Some("b"));
}

#[test]
fn test_from_items_repeated_id_last_wins() {
    let first = IndexedItem::new("a", "first", desc("A"), Metadata::new());
    let second = IndexedItem::new("a", "second", desc("B"), Metadata::new());
    let index = TextIndex::from_items(vec![first, second], None);

    assert_eq!(index.len(), 1);
    assert_eq!(index.get("a").unwrap().text, "second");
    assert_eq!(index.id_for_hash(&content_hash("first")), None);
}

#[test]
fn test_from_items_fills_missing_hash() {
    let mut item = IndexedItem::new("a", "text", desc("A"), Metadata::new());
    item.content_hash.clear();
    let index = TextIndex::from_items(vec![item], None);
    assert_eq!(index.get("a").unwrap().content_hash, content_hash("text"));
}

#[test]
fn test_from_items_checked_rejects_duplicates() {
    let a = IndexedItem::new("a", "same", desc("A"), Metadata::new());
    let b = IndexedItem::new("b", "same", desc("B"), Metadata::new());
    let err = TextIndex::from_items_checked(vec![a.clone(), b], None).unwrap_err();
    assert!(err.to_string().contains("Duplicate content detected (existing id: a)"));

    let again = IndexedItem::new("a", "other", desc("A"), Metadata::new());
    let err = TextIndex::from_items_checked(vec![a, again], None).unwrap_err();
    assert!(err.to_string().contains("Duplicate id in input: a"));
}

#[test]
fn test_from_items_checked_validates() {
    let validation = IndexValidation::new(catalog(), "v1");
    let good = IndexedItem::new("a", "one", complete("Science"), Metadata::new());
    let bad = IndexedItem::new("b", "two", complete("Zoology"), Metadata::new());

    let index = TextIndex::from_items_checked(vec![good.clone()], Some(validation.clone())).unwrap();
    assert_eq!(index.len(), 1);

    let err = TextIndex::from_items_checked(vec![good, bad], Some(validation)).unwrap_err();
    assert!(matches!(err, TagError::Indexing { .. }));
}

#[test]
fn test_clone_is_independent() {
    let mut index = filter_fixture();
    let copy = index.clone();
    index.remove("bio");
    assert_eq!(index.len(), 4);
    assert_eq!(copy.len(), 5);
    assert!(copy.contains("bio"));
}
