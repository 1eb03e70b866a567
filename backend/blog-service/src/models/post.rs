use super::user::AuthorInfo;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A stored post with its engagement data.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub images: Vec<String>,
    pub views: i64,
    /// User ids, no duplicates.
    pub likes: Vec<Uuid>,
    /// Oldest first.
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn likes_count(&self) -> i64 {
        self.likes.len() as i64
    }

    pub fn comments_count(&self) -> i64 {
        self.comments.len() as i64
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Input for post creation. `author_id` always comes from the acting identity.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub images: Vec<String>,
}

/// Input for a comment append.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub author_id: Uuid,
    pub text: String,
}

/// Partial update of a post. `None` leaves the field untouched; `Some` replaces
/// it. Author and creation time are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub images: Option<Vec<String>>,
}

/// Post after an update, plus the image references the update dropped.
#[derive(Debug, Clone)]
pub struct PostUpdate {
    pub post: Post,
    pub replaced_images: Vec<String>,
}

/// Outcome of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggle {
    pub liked: bool,
    pub likes_count: i64,
}

/// Feed row as produced by the store: counts instead of raw engagement lists,
/// author still unresolved.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PostSummaryRecord {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub images: Vec<String>,
    pub views: i64,
    pub likes_count: i64,
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&Post> for PostSummaryRecord {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            title: post.title.clone(),
            content: post.content.clone(),
            images: post.images.clone(),
            views: post.views,
            likes_count: post.likes_count(),
            comments_count: post.comments_count(),
            created_at: post.created_at,
        }
    }
}

/// Public feed item.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub images: Vec<String>,
    pub author_id: Uuid,
    pub author: Option<AuthorInfo>,
    pub views: i64,
    pub likes_count: i64,
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
}

impl PostSummary {
    pub fn from_record(record: PostSummaryRecord, author: Option<AuthorInfo>) -> Self {
        Self {
            id: record.id,
            title: record.title,
            content: record.content,
            images: record.images,
            author_id: record.author_id,
            author,
            views: record.views,
            likes_count: record.likes_count,
            comments_count: record.comments_count,
            created_at: record.created_at,
        }
    }
}

/// Comment with its author resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author: Option<AuthorInfo>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Single-post view: everything about the post, author and commenters resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub images: Vec<String>,
    pub author_id: Uuid,
    pub author: Option<AuthorInfo>,
    pub views: i64,
    pub likes: Vec<Uuid>,
    pub likes_count: i64,
    pub comments: Vec<CommentView>,
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One page of an ordered listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage<T> {
    pub items: Vec<T>,
    pub total_items: i64,
    pub total_pages: i64,
    pub current_page: i64,
}
