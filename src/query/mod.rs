//! Predicate engine, fluent query builder, filter helpers, and explanations.

pub mod builder;
pub mod explain;
pub mod filter;
pub mod predicate;

pub use builder::{ItemCompare, QueryBuilder, QueryResult};
pub use explain::{
    compare_results, explain_match, explain_predicate_tree, explain_query, explain_result, field_distribution,
    summarize_results,
};
pub use filter::{
    filter_index, filter_items, find_by_author, find_by_domain, find_by_intent, find_recent, find_research_posts,
    find_tutorials, item_ids, search_text, Filter,
};
pub use predicate::{ItemTest, Predicate, TextMatcher};
