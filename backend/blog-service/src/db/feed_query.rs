/// Feed query stages
///
/// A feed listing is the composition filter -> order -> count -> window.
/// Each stage is a plain value so the Postgres store can render it to SQL
/// and the in-memory store can apply it to a slice of posts, with the same
/// semantics in both.
use crate::config::FeedConfig;
use crate::error::{AppError, Result};
use crate::models::Post;
use std::cmp::Ordering;
use uuid::Uuid;

/// Which posts are visible to the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedFilter {
    /// Lowercased, trimmed search term. Never empty.
    search: Option<String>,
    author_id: Option<Uuid>,
}

impl FeedFilter {
    pub fn all() -> Self {
        Self::default()
    }

    /// Case-insensitive substring match on title or content. A blank term
    /// matches everything.
    pub fn with_search(mut self, term: Option<&str>) -> Self {
        self.search = term
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);
        self
    }

    pub fn by_author(mut self, author_id: Uuid) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn author_id(&self) -> Option<Uuid> {
        self.author_id
    }

    /// `ILIKE` pattern for the search term with `%`, `_` and `\` escaped,
    /// to be used with `ESCAPE '\'`.
    pub fn like_pattern(&self) -> Option<String> {
        self.search.as_ref().map(|term| {
            let mut pattern = String::with_capacity(term.len() + 2);
            pattern.push('%');
            for c in term.chars() {
                if matches!(c, '%' | '_' | '\\') {
                    pattern.push('\\');
                }
                pattern.push(c);
            }
            pattern.push('%');
            pattern
        })
    }

    pub fn matches(&self, post: &Post) -> bool {
        if let Some(author_id) = self.author_id {
            if post.author_id != author_id {
                return false;
            }
        }

        match &self.search {
            Some(term) => {
                post.title.to_lowercase().contains(term.as_str())
                    || post.content.to_lowercase().contains(term.as_str())
            }
            None => true,
        }
    }
}

/// Listing order. Only newest-first exists today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedOrder {
    #[default]
    NewestFirst,
}

impl FeedOrder {
    pub fn sql(&self) -> &'static str {
        match self {
            FeedOrder::NewestFirst => "p.created_at DESC, p.id DESC",
        }
    }

    pub fn compare(&self, a: &Post, b: &Post) -> Ordering {
        match self {
            FeedOrder::NewestFirst => b
                .created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id)),
        }
    }
}

/// Requested page window, already validated and clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: i64,
    limit: i64,
}

impl Pagination {
    /// Validate raw query values. Missing values fall back to page 1 and the
    /// configured default size; sizes above the configured maximum are clamped.
    pub fn from_request(page: Option<i64>, limit: Option<i64>, config: &FeedConfig) -> Result<Self> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(AppError::Validation("page must be at least 1".to_string()));
        }

        let limit = limit.unwrap_or(i64::from(config.default_page_size));
        if limit < 1 {
            return Err(AppError::Validation("limit must be at least 1".to_string()));
        }

        Ok(Self {
            page,
            limit: limit.min(i64::from(config.max_page_size)),
        })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// `ceil(total / limit)`, zero for an empty set.
    pub fn total_pages(&self, total_items: i64) -> i64 {
        if total_items <= 0 {
            0
        } else {
            (total_items + self.limit - 1) / self.limit
        }
    }

    /// Cut this page out of an already ordered slice.
    pub fn window<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        if start >= items.len() {
            return &[];
        }
        let end = start.saturating_add(self.limit as usize).min(items.len());
        &items[start..end]
    }
}

/// A complete feed request as handed to a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub filter: FeedFilter,
    pub order: FeedOrder,
    pub pagination: Pagination,
}
