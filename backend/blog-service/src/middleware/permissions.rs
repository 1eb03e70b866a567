/// Ownership checks for posts
///
/// Only the author of a post may edit or delete it. A failed check is a
/// `Forbidden` error, never a `NotFound`.
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::Post;

/// Check if a user owns a post
pub fn check_post_ownership(user_id: Uuid, post: &Post) -> Result<()> {
    if post.author_id == user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Not authorized to modify this post".to_string(),
        ))
    }
}

/// Verify user may update a post
pub fn check_post_update(user_id: Uuid, post: &Post) -> Result<()> {
    check_post_ownership(user_id, post)
}

/// Verify user may delete a post
pub fn check_post_deletion(user_id: Uuid, post: &Post) -> Result<()> {
    check_post_ownership(user_id, post)
}
