use super::feed_query::{FeedFilter, FeedQuery};
use crate::error::Result;
use crate::models::{Comment, NewPost, Post, PostPatch, PostSummaryRecord, PostUpdate};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

const POST_COLUMNS: &str = "id, author_id, title, content, images, views, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    author_id: Uuid,
    title: String,
    content: String,
    images: Vec<String>,
    views: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PostRow {
    fn into_post(self, likes: Vec<Uuid>, comments: Vec<Comment>) -> Post {
        Post {
            id: self.id,
            author_id: self.author_id,
            title: self.title,
            content: self.content,
            images: self.images,
            views: self.views,
            likes,
            comments,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LikeRow {
    post_id: Uuid,
    user_id: Uuid,
}

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    post_id: Uuid,
    #[sqlx(flatten)]
    comment: Comment,
}

/// Create a new post with no engagement yet
pub async fn create_post(pool: &PgPool, new: &NewPost) -> Result<Post> {
    let row = sqlx::query_as::<_, PostRow>(&format!(
        r#"
        INSERT INTO posts (id, author_id, title, content, images)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {POST_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(new.author_id)
    .bind(&new.title)
    .bind(&new.content)
    .bind(&new.images)
    .fetch_one(pool)
    .await?;

    Ok(row.into_post(Vec::new(), Vec::new()))
}

/// Find a post by ID with its likes and comments
pub async fn find_post_by_id(pool: &PgPool, post_id: Uuid) -> Result<Option<Post>> {
    let row = sqlx::query_as::<_, PostRow>(&format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
    ))
    .bind(post_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(attach_engagement(pool, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

/// Find all posts by an author, newest first
pub async fn find_posts_by_author(pool: &PgPool, author_id: Uuid) -> Result<Vec<Post>> {
    let rows = sqlx::query_as::<_, PostRow>(&format!(
        r#"
        SELECT {POST_COLUMNS}
        FROM posts
        WHERE author_id = $1
        ORDER BY created_at DESC, id DESC
        "#
    ))
    .bind(author_id)
    .fetch_all(pool)
    .await?;

    attach_engagement(pool, rows).await
}

/// Add one view. Returns `false` when the post does not exist.
pub async fn increment_views(pool: &PgPool, post_id: Uuid) -> Result<bool> {
    let result = sqlx::query("UPDATE posts SET views = views + 1 WHERE id = $1")
        .bind(post_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Apply a partial update; absent fields keep their value
pub async fn update_post(
    pool: &PgPool,
    post_id: Uuid,
    patch: &PostPatch,
) -> Result<Option<PostUpdate>> {
    // The CTE locks the row, so `previous.images` is the set this update replaced.
    let previous = sqlx::query_scalar::<_, Vec<String>>(
        r#"
        WITH previous AS (
            SELECT id, images FROM posts WHERE id = $1 FOR UPDATE
        )
        UPDATE posts p
        SET title = COALESCE($2, p.title),
            content = COALESCE($3, p.content),
            images = COALESCE($4, p.images),
            updated_at = NOW()
        FROM previous
        WHERE p.id = previous.id
        RETURNING previous.images
        "#,
    )
    .bind(post_id)
    .bind(patch.title.as_deref())
    .bind(patch.content.as_deref())
    .bind(patch.images.as_ref())
    .fetch_optional(pool)
    .await?;

    let Some(previous) = previous else {
        return Ok(None);
    };
    let replaced_images = if patch.images.is_some() {
        previous
    } else {
        Vec::new()
    };

    Ok(find_post_by_id(pool, post_id)
        .await?
        .map(|post| PostUpdate {
            post,
            replaced_images,
        }))
}

/// Delete a post. Likes and comments go with it through `ON DELETE CASCADE`.
pub async fn delete_post(pool: &PgPool, post_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Count posts matching the filter
pub async fn count_posts(pool: &PgPool, filter: &FeedFilter) -> Result<i64> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM posts p");
    push_filter(&mut builder, filter);

    let count = builder.build_query_scalar::<i64>().fetch_one(pool).await?;
    Ok(count)
}

/// One page of the feed with like and comment counts projected
pub async fn list_posts(pool: &PgPool, query: &FeedQuery) -> Result<Vec<PostSummaryRecord>> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        r#"
        SELECT p.id, p.author_id, p.title, p.content, p.images, p.views,
               (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id) AS likes_count,
               (SELECT COUNT(*) FROM post_comments c WHERE c.post_id = p.id) AS comments_count,
               p.created_at
        FROM posts p
        "#,
    );
    push_filter(&mut builder, &query.filter);
    builder.push(" ORDER BY ");
    builder.push(query.order.sql());
    builder.push(" LIMIT ");
    builder.push_bind(query.pagination.limit());
    builder.push(" OFFSET ");
    builder.push_bind(query.pagination.offset());

    let records = builder
        .build_query_as::<PostSummaryRecord>()
        .fetch_all(pool)
        .await?;
    Ok(records)
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &FeedFilter) {
    builder.push(" WHERE TRUE");

    if let Some(author_id) = filter.author_id() {
        builder.push(" AND p.author_id = ");
        builder.push_bind(author_id);
    }

    if let Some(pattern) = filter.like_pattern() {
        builder.push(" AND (p.title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(r" ESCAPE '\' OR p.content ILIKE ");
        builder.push_bind(pattern);
        builder.push(r" ESCAPE '\')");
    }
}

async fn attach_engagement(pool: &PgPool, rows: Vec<PostRow>) -> Result<Vec<Post>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

    let like_rows = sqlx::query_as::<_, LikeRow>(
        r#"
        SELECT post_id, user_id
        FROM post_likes
        WHERE post_id = ANY($1)
        ORDER BY created_at ASC, user_id ASC
        "#,
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let comment_rows = sqlx::query_as::<_, CommentRow>(
        r#"
        SELECT post_id, id, author_id, text, created_at
        FROM post_comments
        WHERE post_id = ANY($1)
        ORDER BY seq ASC
        "#,
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut likes: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for row in like_rows {
        likes.entry(row.post_id).or_default().push(row.user_id);
    }

    let mut comments: HashMap<Uuid, Vec<Comment>> = HashMap::new();
    for row in comment_rows {
        comments.entry(row.post_id).or_default().push(row.comment);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let post_likes = likes.remove(&row.id).unwrap_or_default();
            let post_comments = comments.remove(&row.id).unwrap_or_default();
            row.into_post(post_likes, post_comments)
        })
        .collect())
}
