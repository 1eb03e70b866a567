use crate::error::Result;
use crate::models::{Comment, NewComment};
use sqlx::PgPool;
use uuid::Uuid;

const POST_FOREIGN_KEY: &str = "post_comments_post_id_fkey";

/// Append a comment to a post in one statement.
/// Returns `None` (nothing inserted) if the post does not exist, including
/// when it is deleted between the existence check and the insert.
pub async fn create_comment(
    pool: &PgPool,
    post_id: Uuid,
    comment: &NewComment,
) -> Result<Option<Comment>> {
    let created = sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO post_comments (id, post_id, author_id, text)
        SELECT $1, $2, $3, $4
        WHERE EXISTS (SELECT 1 FROM posts WHERE id = $2)
        RETURNING id, author_id, text, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(post_id)
    .bind(comment.author_id)
    .bind(&comment.text)
    .fetch_optional(pool)
    .await;

    match created {
        Ok(created) => Ok(created),
        Err(sqlx::Error::Database(db_err))
            if db_err.is_foreign_key_violation() && db_err.constraint() == Some(POST_FOREIGN_KEY) =>
        {
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// All comments on a post in insertion order
pub async fn find_comments_by_post(pool: &PgPool, post_id: Uuid) -> Result<Vec<Comment>> {
    let comments = sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, author_id, text, created_at
        FROM post_comments
        WHERE post_id = $1
        ORDER BY seq ASC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    Ok(comments)
}
