//! Criterion benchmarks for semantic-tags.

use criterion::{criterion_group, criterion_main, Criterion};
use rand::Rng;
use tempfile::NamedTempFile;

use semantic_tags::index::{AddOptions, IndexValidation, TextIndex};
use semantic_tags::normalize::normalize_value;
use semantic_tags::query::{Predicate, QueryBuilder};
use semantic_tags::schema::{FieldDocument, SchemaCatalog, ValueNode};
use semantic_tags::storage::{read_from_file, write_to_file, StorageFormat};
use semantic_tags::types::{Descriptor, IndexedItem, Metadata};

const DOMAINS: [&str; 6] = [
    "Science → Biology",
    "Science → Physics",
    "Science → Chemistry",
    "Science",
    "Engineering → Civil",
    "Engineering",
];
const INTENTS: [&str; 4] = ["Research → Conceptual", "Research → Applied", "Documentation → Tutorial", "Research"];
const TONES: [&str; 3] = ["Neutral", "Formal", "Playful"];

/// A catalog with `branches` top-level domains of `leaves` children each.
fn make_catalog(branches: usize, leaves: usize) -> SchemaCatalog {
    let domain_values = (0..branches)
        .map(|b| {
            let children = (0..leaves).map(|l| ValueNode::leaf(format!("Leaf {b}.{l}"))).collect();
            ValueNode::branch(format!("Branch {b}"), children)
        })
        .collect();
    let intent_values = vec![
        ValueNode::branch("Research", vec![ValueNode::leaf("Conceptual"), ValueNode::leaf("Applied")]),
        ValueNode::branch("Documentation", vec![ValueNode::leaf("Tutorial")]),
    ];
    SchemaCatalog::builder()
        .field("v1", "domain", FieldDocument::new("v1", true, domain_values))
        .field("v1", "intent", FieldDocument::new("v1", true, intent_values))
        .build()
        .unwrap()
}

/// Build a large index using the trusted bulk-load path.
fn make_large_index(item_count: usize) -> TextIndex {
    let mut rng = rand::thread_rng();
    let items: Vec<IndexedItem> = (0..item_count)
        .map(|i| {
            let descriptor = Descriptor::builder()
                .domain(DOMAINS[rng.gen_range(0..DOMAINS.len())])
                .intent(INTENTS[rng.gen_range(0..INTENTS.len())])
                .tone(TONES[i % TONES.len()])
                .build()
                .unwrap();
            let mut metadata = Metadata::new();
            metadata.insert("year".into(), (2000 + (i % 25) as i64).into());
            IndexedItem::new(format!("item_{i}"), format!("text body number {i}"), descriptor, metadata)
        })
        .collect();
    TextIndex::from_items(items, None)
}

fn bench_normalize_value(c: &mut Criterion) {
    c.bench_function("normalize_value_mixed_separators", |b| {
        b.iter(|| {
            let _ = normalize_value("  Science ->  Computer Science / Machine   Learning | NLP ", true);
        })
    });
}

fn bench_catalog_build(c: &mut Criterion) {
    c.bench_function("catalog_build_100x20", |b| {
        b.iter(|| {
            let _ = make_catalog(100, 20);
        })
    });
}

fn bench_validate_descriptor(c: &mut Criterion) {
    let catalog = make_catalog(100, 20);
    let descriptor = Descriptor::builder()
        .domain("Branch 42 → Leaf 42.7")
        .intent("Research → Applied")
        .build()
        .unwrap();

    c.bench_function("validate_complete_2k_values", |b| {
        b.iter(|| {
            let _ = descriptor.validate(&catalog, "v1", false);
        })
    });
}

fn bench_add_validated(c: &mut Criterion) {
    let catalog = std::sync::Arc::new(make_catalog(100, 20));
    let mut index = TextIndex::with_validation(IndexValidation::new(catalog, "v1"));
    let descriptor = Descriptor::builder()
        .domain("Branch 3 → Leaf 3.1")
        .intent("Research")
        .build()
        .unwrap();

    c.bench_function("add_validated_item", |b| {
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            let _ = index.add(
                format!("bench text {n}"),
                descriptor.clone(),
                Metadata::new(),
                AddOptions::default(),
            );
        })
    });
}

fn bench_hierarchy_query(c: &mut Criterion) {
    let index = make_large_index(100_000);

    c.bench_function("query_domain_under_100k", |b| {
        b.iter(|| {
            let _ = QueryBuilder::on(&index)
                .where_domain("Science")
                .where_intent("Research")
                .limit(50)
                .execute();
        })
    });
}

fn bench_sorted_query(c: &mut Criterion) {
    let index = make_large_index(100_000);

    c.bench_function("query_sorted_paged_100k", |b| {
        b.iter(|| {
            let _ = QueryBuilder::on(&index)
                .and_where(Predicate::metadata_equals("year", 2010) | Predicate::field_equals("tone", "Formal"))
                .order_by_created(true)
                .offset(100)
                .limit(20)
                .execute();
        })
    });
}

fn bench_write_file_10k(c: &mut Criterion) {
    let items = make_large_index(10_000).snapshot();

    c.bench_function("write_ndjson_10k", |b| {
        b.iter(|| {
            let tmp = NamedTempFile::new().unwrap();
            write_to_file(&items, StorageFormat::Ndjson, tmp.path()).unwrap();
        })
    });
}

fn bench_read_file_10k(c: &mut Criterion) {
    let items = make_large_index(10_000).snapshot();
    let tmp = NamedTempFile::new().unwrap();
    write_to_file(&items, StorageFormat::Json, tmp.path()).unwrap();

    c.bench_function("read_json_10k", |b| {
        b.iter(|| {
            let items = read_from_file(StorageFormat::Json, tmp.path()).unwrap();
            let _ = TextIndex::from_items(items, None);
        })
    });
}

criterion_group!(
    benches,
    bench_normalize_value,
    bench_catalog_build,
    bench_validate_descriptor,
    bench_add_validated,
    bench_hierarchy_query,
    bench_sorted_query,
    bench_write_file_10k,
    bench_read_file_10k,
);
criterion_main!(benches);
