/// Post service - post lifecycle and engagement
///
/// Every mutation here goes through one atomic store primitive. Ownership is
/// checked against the stored post; the acting user id always comes from the
/// authenticated request, never from client input.
use crate::config::FeedConfig;
use crate::db::{PostStore, UserStore};
use crate::error::{AppError, Result};
use crate::middleware::permissions::{check_post_deletion, check_post_update};
use crate::models::{CommentView, LikeToggle, NewComment, NewPost, Post, PostPatch, PostUpdate};
use std::sync::Arc;
use uuid::Uuid;

use super::resolve_comments;

pub struct PostService {
    posts: Arc<dyn PostStore>,
    users: Arc<dyn UserStore>,
    config: FeedConfig,
}

fn post_not_found() -> AppError {
    AppError::NotFound("Post not found".to_string())
}

/// Trimmed value if non-blank.
fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

impl PostService {
    pub fn new(posts: Arc<dyn PostStore>, users: Arc<dyn UserStore>, config: FeedConfig) -> Self {
        Self {
            posts,
            users,
            config,
        }
    }

    /// Create a new post owned by `author_id`
    pub async fn create_post(
        &self,
        author_id: Uuid,
        title: &str,
        content: &str,
        images: Vec<String>,
    ) -> Result<Post> {
        let (Some(title), Some(_)) = (non_blank(title), non_blank(content)) else {
            return Err(AppError::Validation(
                "Title and content are required".to_string(),
            ));
        };

        let post = self
            .posts
            .insert_post(NewPost {
                author_id,
                title: title.to_string(),
                content: content.to_string(),
                images,
            })
            .await?;

        tracing::info!(post_id = %post.id, user_id = %author_id, "post created");
        Ok(post)
    }

    /// Apply `patch` to a post owned by `user_id`. Image references dropped
    /// by the update are returned for cleanup.
    pub async fn update_post(&self, post_id: Uuid, user_id: Uuid, patch: PostPatch) -> Result<PostUpdate> {
        let existing = self.posts.find_post(post_id).await?.ok_or_else(|| {
            tracing::warn!(%post_id, %user_id, "update of missing post");
            post_not_found()
        })?;

        if let Err(err) = check_post_update(user_id, &existing) {
            tracing::warn!(%post_id, %user_id, owner_id = %existing.author_id, "update denied: not the owner");
            return Err(err);
        }

        let patch = normalize_patch(patch)?;
        let update = self
            .posts
            .update_post(post_id, &patch)
            .await?
            .ok_or_else(post_not_found)?;

        tracing::info!(%post_id, %user_id, replaced_images = update.replaced_images.len(), "post updated");
        Ok(update)
    }

    /// Delete a post owned by `user_id`, returning what was removed
    pub async fn delete_post(&self, post_id: Uuid, user_id: Uuid) -> Result<Post> {
        let existing = self.posts.find_post(post_id).await?.ok_or_else(|| {
            tracing::warn!(%post_id, %user_id, "delete of missing post");
            post_not_found()
        })?;

        if let Err(err) = check_post_deletion(user_id, &existing) {
            tracing::warn!(%post_id, %user_id, owner_id = %existing.author_id, "delete denied: not the owner");
            return Err(err);
        }

        if !self.posts.delete_post(post_id).await? {
            return Err(post_not_found());
        }

        tracing::info!(%post_id, %user_id, "post deleted");
        Ok(existing)
    }

    /// Like if not yet liked by `user_id`, unlike otherwise
    pub async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<LikeToggle> {
        let toggle = self
            .posts
            .toggle_like(post_id, user_id)
            .await?
            .ok_or_else(post_not_found)?;

        tracing::debug!(%post_id, %user_id, liked = toggle.liked, likes = toggle.likes_count, "like toggled");
        Ok(toggle)
    }

    /// Append a comment and return the post's full comment thread
    pub async fn add_comment(&self, post_id: Uuid, user_id: Uuid, text: &str) -> Result<Vec<CommentView>> {
        let text = non_blank(text)
            .ok_or_else(|| AppError::Validation("Comment text is required".to_string()))?;
        if text.chars().count() > self.config.comment_max_length {
            return Err(AppError::Validation(format!(
                "Comment must be at most {} characters",
                self.config.comment_max_length
            )));
        }

        let comments = self
            .posts
            .append_comment(
                post_id,
                NewComment {
                    author_id: user_id,
                    text: text.to_string(),
                },
            )
            .await?
            .ok_or_else(post_not_found)?;

        tracing::info!(%post_id, %user_id, comments = comments.len(), "comment added");
        resolve_comments(self.users.as_ref(), comments).await
    }
}

/// Trim a present title and reject blank present fields.
fn normalize_patch(patch: PostPatch) -> Result<PostPatch> {
    let title = match patch.title {
        Some(title) => Some(
            non_blank(&title)
                .ok_or_else(|| AppError::Validation("Title cannot be empty".to_string()))?
                .to_string(),
        ),
        None => None,
    };

    if let Some(content) = &patch.content {
        if non_blank(content).is_none() {
            return Err(AppError::Validation("Content cannot be empty".to_string()));
        }
    }

    Ok(PostPatch {
        title,
        content: patch.content,
        images: patch.images,
    })
}
