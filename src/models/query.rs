// Query parameters shared by the resolver, the aggregates and the exports.

use chrono::{DateTime, Utc};

use super::Category;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// Only records strictly before this instant are considered. `None` is unbounded.
    pub before: Option<DateTime<Utc>>,
    /// Second boundary, only used by diffs (snapshot at `before` vs snapshot at `after`).
    pub after: Option<DateTime<Utc>>,
    /// Agent region tag. `None` or empty string means no tag filter.
    pub tag: Option<String>,
    /// `None` and `Some(Category::Other)` both keep every category.
    pub category: Option<Category>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before(mut self, before: DateTime<Utc>) -> Self {
        self.before = Some(before);
        self
    }

    pub fn after(mut self, after: DateTime<Utc>) -> Self {
        self.after = Some(after);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Tag filter with the empty string folded into "unfiltered".
    pub fn tag_filter(&self) -> Option<&str> {
        self.tag.as_deref().filter(|t| !t.is_empty())
    }

    /// Category filter with Other folded into "unfiltered".
    pub fn category_filter(&self) -> Option<Category> {
        self.category.filter(|c| *c != Category::Other)
    }
}
