//! Phase 1 tests: Normalization + descriptors.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use semantic_tags::normalize::{
    are_values_equivalent, get_depth, get_parent, get_path, get_root, is_descendant_or_self, is_hierarchical,
    normalize_descriptor, normalize_field_name, normalize_hierarchy_separator, normalize_json_value,
    normalize_value, normalize_whitespace,
};
use semantic_tags::types::{content_hash, Descriptor, IndexedItem, Metadata, TagError, HIERARCHY_SEPARATOR};

fn hash_of(descriptor: &Descriptor) -> u64 {
    let mut hasher = DefaultHasher::new();
    descriptor.hash(&mut hasher);
    hasher.finish()
}

// ==================== Field Names ====================

#[test]
fn test_field_name_lowercased() {
    assert_eq!(normalize_field_name("Domain"), "domain");
    assert_eq!(normalize_field_name("AUDIENCE"), "audience");
}

#[test]
fn test_field_name_separators_become_underscores() {
    assert_eq!(normalize_field_name("Target-Audience"), "target_audience");
    assert_eq!(normalize_field_name("reading level"), "reading_level");
    assert_eq!(normalize_field_name("Target-Audience Group"), "target_audience_group");
}

// ==================== Value Normalization ====================

#[test]
fn test_separator_equivalence() {
    let canonical = "Science → Biology";
    for input in [
        "Science->Biology",
        "Science -> Biology",
        "Science > Biology",
        "Science→Biology",
        "Science / Biology",
        "Science|Biology",
        "  Science   ->   Biology  ",
    ] {
        assert_eq!(normalize_value(input, true).unwrap(), canonical, "input: {input:?}");
    }
}

#[test]
fn test_arrow_not_translated_twice() {
    assert_eq!(normalize_hierarchy_separator("a->b"), "a → b");
    assert_eq!(normalize_value("a -> b -> c", true).unwrap(), "a → b → c");
}

#[test]
fn test_whitespace_collapsed() {
    assert_eq!(normalize_whitespace("  Hello   World  "), "Hello World");
    assert_eq!(normalize_whitespace("A  →   B"), "A → B");
    assert_eq!(normalize_value("Machine \t Learning", true).unwrap(), "Machine Learning");
}

#[test]
fn test_case_preserved() {
    assert_eq!(normalize_value("science -> BIOLOGY", true).unwrap(), "science → BIOLOGY");
}

#[test]
fn test_strict_empty_rejected() {
    let err = normalize_value("   ", true).unwrap_err();
    assert!(matches!(err, TagError::Normalization(_)));
    assert!(err.to_string().contains("empty string"));
}

#[test]
fn test_non_strict_empty_allowed() {
    assert_eq!(normalize_value("   ", false).unwrap(), "");
}

#[test]
fn test_non_string_json_rejected() {
    let err = normalize_json_value(&serde_json::json!(42), true).unwrap_err();
    assert_eq!(err.to_string(), "Normalization failed: Value must be string, got number");
    assert_eq!(
        normalize_json_value(&serde_json::json!("A>B"), true).unwrap(),
        "A → B"
    );
}

#[test]
fn test_normalization_idempotent() {
    for input in [
        "Science",
        "Science->Biology",
        " a / b | c > d ",
        "Research → Conceptual",
        "x    y   →z",
        "Documentation -> Tutorial",
    ] {
        let once = normalize_value(input, true).unwrap();
        let twice = normalize_value(&once, true).unwrap();
        assert_eq!(once, twice, "input: {input:?}");
    }
}

#[test]
fn test_values_equivalent() {
    assert!(are_values_equivalent("A->B", "A → B"));
    assert!(are_values_equivalent(" A ", "A"));
    assert!(!are_values_equivalent("A → B", "A → C"));
    assert!(!are_values_equivalent("a", "A"));
}

// ==================== Descriptor Maps ====================

#[test]
fn test_normalize_descriptor_keys_and_values() {
    let map = normalize_descriptor([("Domain", "Science->Physics"), ("Reading Level", " basic ")], true).unwrap();
    assert_eq!(map.get("domain").map(String::as_str), Some("Science → Physics"));
    assert_eq!(map.get("reading_level").map(String::as_str), Some("basic"));
}

#[test]
fn test_normalize_descriptor_collision_strict() {
    let err = normalize_descriptor([("Domain", "A"), ("domain", "B")], true).unwrap_err();
    assert!(matches!(err, TagError::Normalization(_)));
}

#[test]
fn test_normalize_descriptor_collision_lenient() {
    let map = normalize_descriptor([("Domain", "A"), ("domain", "B")], false).unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map["domain"], "B");
}

// ==================== Hierarchy Helpers ====================

#[test]
fn test_hierarchy_path_and_depth() {
    let value = "A → B → C";
    assert_eq!(get_path(value), vec!["A", "B", "C"]);
    assert_eq!(get_depth(value), 3);
    assert_eq!(get_depth("A"), 1);
    assert!(is_hierarchical(value));
    assert!(!is_hierarchical("A"));
}

#[test]
fn test_hierarchy_parent_and_root() {
    assert_eq!(get_parent("A → B → C").as_deref(), Some("A → B"));
    assert_eq!(get_parent("A"), None);
    assert_eq!(get_root("A → B → C"), "A");
    assert_eq!(get_root("A"), "A");
}

#[test]
fn test_descendant_boundary() {
    assert!(is_descendant_or_self("Science", "Science"));
    assert!(is_descendant_or_self("Science → Biology", "Science"));
    assert!(!is_descendant_or_self("ScienceFiction", "Science"));
    assert!(!is_descendant_or_self("Science", "Science → Biology"));
    assert_eq!(HIERARCHY_SEPARATOR, " → ");
}

// ==================== Descriptor ====================

#[test]
fn test_descriptor_builder_normalizes() {
    let d = Descriptor::builder()
        .domain("Science -> Biology")
        .intent("Research>Applied")
        .custom("Target-Audience", "  grad   students ")
        .build()
        .unwrap();

    assert_eq!(d.domain(), Some("Science → Biology"));
    assert_eq!(d.intent(), Some("Research → Applied"));
    assert_eq!(d.get_field("target_audience"), Some("grad students"));
    assert_eq!(d.get_field("DOMAIN"), Some("Science → Biology"));
    assert_eq!(d.tone(), None);
}

#[test]
fn test_descriptor_builder_last_value_wins() {
    let d = Descriptor::builder().domain("A").domain("B").build().unwrap();
    assert_eq!(d.domain(), Some("B"));
}

#[test]
fn test_descriptor_construction_atomic() {
    let err = Descriptor::from_pairs([("domain", "Science"), ("tone", "   ")]).unwrap_err();
    assert!(matches!(err, TagError::Normalization(_)));
}

#[test]
fn test_descriptor_filled_fields() {
    let d = Descriptor::from_pairs([("domain", "Science"), ("Custom Field", "x")]).unwrap();
    let expected: BTreeSet<String> = ["custom_field", "domain"].iter().map(|s| s.to_string()).collect();
    assert_eq!(d.filled_fields(), expected);
    assert_eq!(d.custom_fields().len(), 1);
}

#[test]
fn test_descriptor_set_and_clear_field() {
    let mut d = Descriptor::default();
    d.set_field("Tone", "Formal -> Academic").unwrap();
    assert_eq!(d.tone(), Some("Formal → Academic"));

    d.set_field("Source Type", "blog").unwrap();
    assert_eq!(d.get_field("source_type"), Some("blog"));

    assert!(d.set_field("tone", "  ").is_err());
    assert_eq!(d.tone(), Some("Formal → Academic"));

    assert_eq!(d.clear_field("tone").as_deref(), Some("Formal → Academic"));
    assert_eq!(d.tone(), None);
    assert_eq!(d.clear_field("missing"), None);
}

#[test]
fn test_descriptor_equality_order_independent() {
    let a = Descriptor::from_pairs([("domain", "A"), ("tone", "B"), ("x", "1")]).unwrap();
    let b = Descriptor::from_pairs([("x", "1"), ("tone", "B"), ("domain", "A")]).unwrap();
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));

    let c = Descriptor::from_pairs([("domain", "A"), ("tone", "C")]).unwrap();
    assert_ne!(a, c);
}

#[test]
fn test_descriptor_equal_after_normalization() {
    let a = Descriptor::from_pairs([("Domain", "Science->Biology")]).unwrap();
    let b = Descriptor::from_pairs([("domain", "Science → Biology")]).unwrap();
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
}

#[test]
fn test_descriptor_json() {
    let d = Descriptor::from_json_str(r#"{"Domain": "Science -> Physics", "tone": "Neutral"}"#).unwrap();
    assert_eq!(d.domain(), Some("Science → Physics"));
    assert_eq!(d.tone(), Some("Neutral"));

    let err = Descriptor::from_json_str(r#"{"domain": 3}"#).unwrap_err();
    assert!(matches!(err, TagError::Normalization(_)));

    let err = Descriptor::from_json_str(r#"["domain"]"#).unwrap_err();
    assert!(matches!(err, TagError::Normalization(_)));
}

#[test]
fn test_descriptor_serde_flat_map() {
    let d = Descriptor::builder().domain("A > B").tone("Neutral").build().unwrap();
    let json = serde_json::to_value(&d).unwrap();
    assert_eq!(json, serde_json::json!({"domain": "A → B", "tone": "Neutral"}));

    let parsed: Descriptor = serde_json::from_str(r#"{"Domain": "A->B", "tone": "Neutral"}"#).unwrap();
    assert_eq!(parsed, d);

    assert!(serde_json::from_str::<Descriptor>(r#"{"domain": ""}"#).is_err());
}

#[test]
fn test_descriptor_display() {
    let d = Descriptor::builder().tone("Neutral").domain("Science").custom("lang", "en").build().unwrap();
    assert_eq!(d.to_string(), "Descriptor(domain: Science, tone: Neutral, lang: en)");
}

// ==================== Indexed Items ====================

#[test]
fn test_content_hash_sha256_hex() {
    let hash = content_hash("hello");
    assert_eq!(hash.len(), 64);
    assert_eq!(hash, "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824");
    assert_eq!(content_hash("hello"), content_hash("hello"));
    assert_ne!(content_hash("hello"), content_hash("Hello"));
}

#[test]
fn test_indexed_item_new() {
    let item = IndexedItem::new("a", "some text", Descriptor::default(), Metadata::new());
    assert_eq!(item.id, "a");
    assert_eq!(item.content_hash, content_hash("some text"));
    assert_eq!(item.created_at, item.updated_at);
}

#[test]
fn test_indexed_item_json_without_hash() {
    let json = r#"{
        "id": "x",
        "text": "body",
        "descriptor": {"domain": "A->B"},
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    }"#;
    let item: IndexedItem = serde_json::from_str(json).unwrap();
    assert_eq!(item.field("domain"), Some("A → B"));
    assert!(item.metadata.is_empty());
    assert!(item.content_hash.is_empty());
}

// ==================== Errors ====================

#[test]
fn test_validation_error_display_lists_errors_then_warnings() {
    let err = TagError::Validation {
        message: "Descriptor is invalid".into(),
        errors: vec!["Missing required fields: intent".into()],
        warnings: vec!["Unknown fields will be ignored: colour".into()],
    };
    assert_eq!(
        err.to_string(),
        "Descriptor is invalid\n\nErrors:\n  • Missing required fields: intent\n\nWarnings:\n  • Unknown fields will be ignored: colour"
    );

    let bare = TagError::Validation {
        message: "Descriptor is invalid".into(),
        errors: Vec::new(),
        warnings: Vec::new(),
    };
    assert_eq!(bare.to_string(), "Descriptor is invalid");
}

#[test]
fn test_indexing_error_helper_has_no_validation_errors() {
    let err = TagError::indexing("No item with id x");
    assert_eq!(err.to_string(), "Indexing error: No item with id x");
    assert!(err.is_recoverable());
    assert!(matches!(err, TagError::Indexing { ref errors, .. } if errors.is_empty()));
}
