/// Business logic layer for blog-service
///
/// - Feed service: paginated listing, single-post reads, "my posts"
/// - Post service: post lifecycle plus likes and comments
/// - Account service: signup, login, profile
pub mod accounts;
pub mod feed;
pub mod posts;

pub use accounts::{AccountService, AuthSession};
pub use feed::FeedService;
pub use posts::PostService;

use crate::db::UserStore;
use crate::error::Result;
use crate::models::{AuthorInfo, Comment, CommentView};
use std::collections::HashMap;
use uuid::Uuid;

/// Look up display data for a set of authors in one store call.
pub(crate) async fn resolve_authors(
    users: &dyn UserStore,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, AuthorInfo>> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();

    let profiles = users.find_profiles(&ids).await?;
    Ok(profiles.into_iter().map(|a| (a.id, a)).collect())
}

pub(crate) async fn resolve_comments(
    users: &dyn UserStore,
    comments: Vec<Comment>,
) -> Result<Vec<CommentView>> {
    let authors = resolve_authors(users, comments.iter().map(|c| c.author_id)).await?;
    Ok(comment_views(comments, &authors))
}

/// Attach already-resolved author data to each comment.
pub(crate) fn comment_views(
    comments: Vec<Comment>,
    authors: &HashMap<Uuid, AuthorInfo>,
) -> Vec<CommentView> {
    comments
        .into_iter()
        .map(|c| CommentView {
            id: c.id,
            author_id: c.author_id,
            author: authors.get(&c.author_id).cloned(),
            text: c.text,
            created_at: c.created_at,
        })
        .collect()
}
