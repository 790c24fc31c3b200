//! Fluent query builder: predicate accumulation, ordering, and pagination.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::predicate::Predicate;
use crate::index::TextIndex;
use crate::types::{IndexedItem, TagError, TagResult};

/// Item comparator used for ordering.
pub type ItemCompare = Arc<dyn Fn(&IndexedItem, &IndexedItem) -> Ordering + Send + Sync>;

#[derive(Clone)]
struct SortSpec {
    label: String,
    compare: ItemCompare,
    descending: bool,
}

/// Result of [`QueryBuilder::execute`].
#[derive(Debug, Clone)]
pub struct QueryResult<'a> {
    /// The requested page of matching items.
    pub items: Vec<&'a IndexedItem>,
    /// Number of matching items before offset and limit were applied.
    pub total: usize,
    /// [`QueryBuilder::explain`] of the query that produced this result.
    pub query_explanation: String,
}

impl<'a> QueryResult<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &'a IndexedItem> + '_ {
        self.items.iter().copied()
    }

    pub fn ids(&self) -> Vec<&'a str> {
        self.items.iter().map(|item| item.id.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> IntoIterator for QueryResult<'a> {
    type Item = &'a IndexedItem;
    type IntoIter = std::vec::IntoIter<&'a IndexedItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Incrementally built query over a [`TextIndex`].
///
/// Execution always runs in the same order: fetch every item, filter,
/// record the total, sort, skip `offset`, truncate to `limit`.
#[derive(Clone, Default)]
pub struct QueryBuilder<'a> {
    index: Option<&'a TextIndex>,
    predicates: Vec<Predicate>,
    sort: Option<SortSpec>,
    offset: usize,
    limit: Option<usize>,
}

impl<'a> QueryBuilder<'a> {
    /// A query with no data source bound yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A query bound to an index.
    pub fn on(index: &'a TextIndex) -> Self {
        Self::new().from_index(index)
    }

    pub fn from_index(mut self, index: &'a TextIndex) -> Self {
        self.index = Some(index);
        self
    }

    pub fn where_field(self, field: &str, value: &str) -> Self {
        self.and_where(Predicate::field_equals(field, value))
    }

    pub fn where_field_in<I, S>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.and_where(Predicate::field_in(field, values))
    }

    pub fn where_field_starts_with(self, field: &str, prefix: &str) -> Self {
        self.and_where(Predicate::field_starts_with(field, prefix))
    }

    pub fn where_hierarchy(self, field: &str, path: &str, exact: bool) -> Self {
        self.and_where(Predicate::hierarchy_matches(field, path, exact))
    }

    pub fn where_hierarchy_depth(self, field: &str, min: Option<usize>, max: Option<usize>) -> Self {
        self.and_where(Predicate::hierarchy_depth(field, min, max))
    }

    /// Domain is `path` or beneath it.
    pub fn where_domain(self, path: &str) -> Self {
        self.where_hierarchy("domain", path, false)
    }

    /// Intent is `path` or beneath it.
    pub fn where_intent(self, path: &str) -> Self {
        self.where_hierarchy("intent", path, false)
    }

    /// Domain is exactly `path`; descendants do not match.
    pub fn where_domain_exact(self, path: &str) -> Self {
        self.where_hierarchy("domain", path, true)
    }

    pub fn where_intent_exact(self, path: &str) -> Self {
        self.where_hierarchy("intent", path, true)
    }

    pub fn where_tone(self, tone: &str) -> Self {
        self.where_field("tone", tone)
    }

    pub fn where_audience(self, audience: &str) -> Self {
        self.where_field("audience", audience)
    }

    pub fn where_stability(self, stability: &str) -> Self {
        self.where_field("stability", stability)
    }

    pub fn where_text_contains(self, needle: &str, case_sensitive: bool) -> Self {
        self.and_where(Predicate::text_contains(needle, case_sensitive))
    }

    pub fn where_text_matches<F>(self, matcher: F, description: &str) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.and_where(Predicate::text_matches(matcher, description))
    }

    pub fn where_metadata(self, key: &str, value: impl Into<Value>) -> Self {
        self.and_where(Predicate::metadata_equals(key, value))
    }

    pub fn where_metadata_exists(self, key: &str) -> Self {
        self.and_where(Predicate::metadata_exists(key))
    }

    pub fn where_created_after(self, at: DateTime<Utc>) -> Self {
        self.and_where(Predicate::created_after(at))
    }

    pub fn where_created_before(self, at: DateTime<Utc>) -> Self {
        self.and_where(Predicate::created_before(at))
    }

    pub fn where_updated_after(self, at: DateTime<Utc>) -> Self {
        self.and_where(Predicate::updated_after(at))
    }

    /// Add an arbitrary predicate.
    pub fn and_where(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Add an OR of the given predicates; nothing is added for an empty list.
    pub fn or_where(self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        let predicates: Vec<Predicate> = predicates.into_iter().collect();
        if predicates.is_empty() {
            return self;
        }
        self.and_where(Predicate::Or(predicates))
    }

    pub fn not_where(self, predicate: Predicate) -> Self {
        self.and_where(Predicate::negate(predicate))
    }

    /// Order by a comparator. `label` only feeds [`QueryBuilder::explain`].
    pub fn order_by<F>(mut self, label: &str, compare: F, descending: bool) -> Self
    where
        F: Fn(&IndexedItem, &IndexedItem) -> Ordering + Send + Sync + 'static,
    {
        self.sort = Some(SortSpec {
            label: label.to_string(),
            compare: Arc::new(compare),
            descending,
        });
        self
    }

    /// Order by a key extracted from each item.
    pub fn order_by_key<K, F>(self, label: &str, key: F, descending: bool) -> Self
    where
        K: Ord,
        F: Fn(&IndexedItem) -> K + Send + Sync + 'static,
    {
        self.order_by(label, move |a, b| key(a).cmp(&key(b)), descending)
    }

    pub fn order_by_created(self, descending: bool) -> Self {
        self.order_by_key("created_at", |item| item.created_at, descending)
    }

    pub fn order_by_updated(self, descending: bool) -> Self {
        self.order_by_key("updated_at", |item| item.updated_at, descending)
    }

    pub fn offset(mut self, n: usize) -> Self {
        self.offset = n;
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Drop predicates, ordering, and pagination. The bound index is kept.
    pub fn reset(mut self) -> Self {
        self.predicates.clear();
        self.sort = None;
        self.offset = 0;
        self.limit = None;
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// `None` for no predicates, the predicate itself for one, AND otherwise.
    pub fn build_predicate(&self) -> Option<Predicate> {
        match self.predicates.as_slice() {
            [] => None,
            [only] => Some(only.clone()),
            many => Some(Predicate::And(many.to_vec())),
        }
    }

    /// Run the query.
    pub fn execute(&self) -> TagResult<QueryResult<'a>> {
        let index = self
            .index
            .ok_or_else(|| TagError::Query("No index set. Use from_index() first.".to_string()))?;

        let mut items = index.get_all();
        if let Some(predicate) = self.build_predicate() {
            items.retain(|item| predicate.test(item));
        }
        let total = items.len();

        if let Some(sort) = &self.sort {
            if sort.descending {
                items.sort_by(|a, b| (sort.compare)(*b, *a));
            } else {
                items.sort_by(|a, b| (sort.compare)(*a, *b));
            }
        }
        if self.offset > 0 {
            items.drain(..self.offset.min(items.len()));
        }
        if let Some(limit) = self.limit {
            items.truncate(limit);
        }

        log::debug!("query matched {total} items, returning {}", items.len());
        Ok(QueryResult {
            items,
            total,
            query_explanation: self.explain(),
        })
    }

    /// Number of items in the executed page.
    pub fn count(&self) -> TagResult<usize> {
        Ok(self.execute()?.items.len())
    }

    pub fn first(&self) -> TagResult<Option<&'a IndexedItem>> {
        Ok(self.execute()?.items.first().copied())
    }

    pub fn exists(&self) -> TagResult<bool> {
        Ok(self.count()? > 0)
    }

    /// SQL-like summary of the query.
    pub fn explain(&self) -> String {
        let mut parts = Vec::new();
        if let Some(predicate) = self.build_predicate() {
            parts.push(format!("WHERE {}", predicate.explain()));
        }
        if let Some(sort) = &self.sort {
            let direction = if sort.descending { " DESC" } else { "" };
            parts.push(format!("ORDER BY {}{direction}", sort.label));
        }
        if self.offset > 0 {
            parts.push(format!("OFFSET {}", self.offset));
        }
        if let Some(limit) = self.limit {
            parts.push(format!("LIMIT {limit}"));
        }
        if parts.is_empty() {
            "SELECT all items".to_string()
        } else {
            format!("SELECT items {}", parts.join(" "))
        }
    }

    /// Distinct values of a field among all matching items, ignoring pagination.
    pub fn distinct_values(&self, field: &str) -> TagResult<BTreeSet<String>> {
        let result = self.clone().reset_pagination().execute()?;
        Ok(result
            .items
            .iter()
            .filter_map(|item| item.field(field))
            .map(str::to_string)
            .collect())
    }

    fn reset_pagination(mut self) -> Self {
        self.offset = 0;
        self.limit = None;
        self
    }
}

impl fmt::Debug for QueryBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("bound", &self.index.is_some())
            .field("query", &self.explain())
            .finish()
    }
}
