use crate::error::Result;
use crate::models::LikeToggle;
use sqlx::PgPool;
use uuid::Uuid;

/// Flip a user's like on a post.
///
/// The post row is locked with `FOR UPDATE` for the duration of the
/// transaction, so concurrent toggles on the same post are serialized and the
/// returned count always reflects this toggle. Returns `None` if the post does
/// not exist.
pub async fn toggle_like(pool: &PgPool, post_id: Uuid, user_id: Uuid) -> Result<Option<LikeToggle>> {
    let mut tx = pool.begin().await?;

    let locked = sqlx::query_scalar::<_, Uuid>("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?;
    if locked.is_none() {
        tx.rollback().await?;
        return Ok(None);
    }

    let removed = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
        .bind(post_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let liked = if removed > 0 {
        false
    } else {
        sqlx::query("INSERT INTO post_likes (post_id, user_id) VALUES ($1, $2)")
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        true
    };

    let likes_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post_likes WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&mut *tx)
            .await?;

    tx.commit().await?;

    Ok(Some(LikeToggle { liked, likes_count }))
}
