//! Convenience filters over item lists. No ordering or pagination; use
//! [`super::QueryBuilder`] for that.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::predicate::Predicate;
use crate::index::TextIndex;
use crate::types::IndexedItem;

/// Intent path that marks tutorial content.
pub const TUTORIAL_INTENT: &str = "Documentation → Tutorial";

/// Keep the items satisfying `predicate`, preserving order.
pub fn filter_items<'a>(items: &[&'a IndexedItem], predicate: &Predicate) -> Vec<&'a IndexedItem> {
    items.iter().copied().filter(|item| predicate.test(item)).collect()
}

/// Keep the index's items satisfying `predicate`, in insertion order.
pub fn filter_index<'a>(index: &'a TextIndex, predicate: &Predicate) -> Vec<&'a IndexedItem> {
    filter_items(&index.get_all(), predicate)
}

/// Fluent filter over a borrowed item list.
///
/// All predicates are combined with a single AND, even when there is only one.
#[derive(Debug, Clone, Default)]
pub struct Filter<'a> {
    items: Vec<&'a IndexedItem>,
    predicates: Vec<Predicate>,
}

impl<'a> Filter<'a> {
    pub fn new(items: Vec<&'a IndexedItem>) -> Self {
        Self {
            items,
            predicates: Vec::new(),
        }
    }

    pub fn from_index(index: &'a TextIndex) -> Self {
        Self::new(index.get_all())
    }

    pub fn with_items(mut self, items: Vec<&'a IndexedItem>) -> Self {
        self.items = items;
        self
    }

    pub fn where_field(self, field: &str, value: &str) -> Self {
        self.matching(Predicate::field_equals(field, value))
    }

    pub fn where_field_in<I, S>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.matching(Predicate::field_in(field, values))
    }

    pub fn where_domain(self, path: &str, exact: bool) -> Self {
        self.matching(Predicate::hierarchy_matches("domain", path, exact))
    }

    pub fn where_intent(self, path: &str, exact: bool) -> Self {
        self.matching(Predicate::hierarchy_matches("intent", path, exact))
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
        self.matching(Predicate::text_contains(needle, case_sensitive))
    }

    pub fn where_metadata(self, key: &str, value: impl Into<Value>) -> Self {
        self.matching(Predicate::metadata_equals(key, value))
    }

    pub fn where_created_after(self, at: DateTime<Utc>) -> Self {
        self.matching(Predicate::created_after(at))
    }

    pub fn where_created_before(self, at: DateTime<Utc>) -> Self {
        self.matching(Predicate::created_before(at))
    }

    /// Add an arbitrary predicate.
    pub fn matching(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// The combined AND, or `None` with no predicates.
    pub fn predicate(&self) -> Option<Predicate> {
        if self.predicates.is_empty() {
            return None;
        }
        Some(Predicate::And(self.predicates.clone()))
    }

    pub fn execute(&self) -> Vec<&'a IndexedItem> {
        match self.predicate() {
            None => self.items.clone(),
            Some(predicate) => filter_items(&self.items, &predicate),
        }
    }

    pub fn count(&self) -> usize {
        self.execute().len()
    }

    pub fn first(&self) -> Option<&'a IndexedItem> {
        self.execute().first().copied()
    }

    pub fn exists(&self) -> bool {
        self.count() > 0
    }

    pub fn explain(&self) -> String {
        match self.predicate() {
            None => "No filters applied".to_string(),
            Some(predicate) => predicate.explain(),
        }
    }
}

pub fn find_by_domain<'a>(items: &[&'a IndexedItem], domain: &str, exact: bool) -> Vec<&'a IndexedItem> {
    Filter::new(items.to_vec()).where_domain(domain, exact).execute()
}

pub fn find_by_intent<'a>(items: &[&'a IndexedItem], intent: &str, exact: bool) -> Vec<&'a IndexedItem> {
    Filter::new(items.to_vec()).where_intent(intent, exact).execute()
}

/// Items with a research intent, optionally narrowed by domain and stability.
pub fn find_research_posts<'a>(
    items: &[&'a IndexedItem],
    domain: Option<&str>,
    stability: Option<&str>,
) -> Vec<&'a IndexedItem> {
    let mut filter = Filter::new(items.to_vec()).where_intent("Research", false);
    if let Some(domain) = domain {
        filter = filter.where_domain(domain, false);
    }
    if let Some(stability) = stability {
        filter = filter.where_stability(stability);
    }
    filter.execute()
}

/// Tutorials, optionally narrowed by domain.
pub fn find_tutorials<'a>(items: &[&'a IndexedItem], domain: Option<&str>) -> Vec<&'a IndexedItem> {
    let mut filter = Filter::new(items.to_vec()).where_intent(TUTORIAL_INTENT, false);
    if let Some(domain) = domain {
        filter = filter.where_domain(domain, false);
    }
    filter.execute()
}

pub fn find_by_author<'a>(items: &[&'a IndexedItem], author: &str) -> Vec<&'a IndexedItem> {
    Filter::new(items.to_vec()).where_metadata("author", author).execute()
}

pub fn find_recent<'a>(items: &[&'a IndexedItem], since: DateTime<Utc>) -> Vec<&'a IndexedItem> {
    Filter::new(items.to_vec()).where_created_after(since).execute()
}

pub fn search_text<'a>(items: &[&'a IndexedItem], query: &str, case_sensitive: bool) -> Vec<&'a IndexedItem> {
    Filter::new(items.to_vec()).where_text_contains(query, case_sensitive).execute()
}

/// Ids of the given items, for set comparisons.
pub fn item_ids<'a>(items: &[&'a IndexedItem]) -> BTreeSet<&'a str> {
    items.iter().map(|item| item.id.as_str()).collect()
}
