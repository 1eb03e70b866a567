/// Storage layer
///
/// Services talk to two traits, [`PostStore`] and [`UserStore`]. The
/// Postgres implementation lives in the `*_repo` modules; [`memory`] holds an
/// in-process implementation used by tests and by `STORAGE_BACKEND=memory`.
///
/// Every engagement mutation is a single atomic store primitive. Callers
/// never read a post, modify it and write it back.
pub mod comment_repo;
pub mod feed_query;
pub mod like_repo;
pub mod memory;
pub mod post_repo;
pub mod user_repo;

use crate::error::Result;
use crate::models::{
    AuthorInfo, Comment, LikeToggle, NewComment, NewPost, NewUser, Post, PostPatch,
    PostSummaryRecord, PostUpdate, User,
};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

pub use feed_query::{FeedFilter, FeedOrder, FeedQuery, Pagination};
pub use memory::InMemoryStore;

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert_post(&self, new: NewPost) -> Result<Post>;

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>>;

    /// Atomically add one view and return the updated post.
    async fn record_view(&self, post_id: Uuid) -> Result<Option<Post>>;

    /// Apply `patch` under the post's row lock. When the patch carries
    /// images, the previous set is returned as `replaced_images`.
    async fn update_post(&self, post_id: Uuid, patch: &PostPatch) -> Result<Option<PostUpdate>>;

    /// Delete a post together with its likes and comments. Returns `false`
    /// when nothing was deleted.
    async fn delete_post(&self, post_id: Uuid) -> Result<bool>;

    async fn count_posts(&self, filter: &FeedFilter) -> Result<i64>;

    async fn list_posts(&self, query: &FeedQuery) -> Result<Vec<PostSummaryRecord>>;

    /// All posts of one author, newest first, engagement included.
    async fn posts_by_author(&self, author_id: Uuid) -> Result<Vec<Post>>;

    /// Flip `user_id`'s membership in the post's like set. Serialized per
    /// post. `None` when the post does not exist.
    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<LikeToggle>>;

    /// Append a comment and return the full list, oldest first. `None` when
    /// the post does not exist.
    async fn append_comment(
        &self,
        post_id: Uuid,
        comment: NewComment,
    ) -> Result<Option<Vec<Comment>>>;

    async fn ping(&self) -> Result<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn insert_user(&self, new: NewUser) -> Result<User>;

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>>;

    /// `email` must already be lowercased.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Batched author lookup for feed joins. Unknown ids are skipped.
    async fn find_profiles(&self, user_ids: &[Uuid]) -> Result<Vec<AuthorInfo>>;

    async fn set_profile_picture(&self, user_id: Uuid, picture: &str) -> Result<Option<User>>;
}

/// Postgres-backed store. Cheap to clone; all clones share the pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn insert_post(&self, new: NewPost) -> Result<Post> {
        post_repo::create_post(&self.pool, &new).await
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        post_repo::find_post_by_id(&self.pool, post_id).await
    }

    async fn record_view(&self, post_id: Uuid) -> Result<Option<Post>> {
        if !post_repo::increment_views(&self.pool, post_id).await? {
            return Ok(None);
        }
        post_repo::find_post_by_id(&self.pool, post_id).await
    }

    async fn update_post(&self, post_id: Uuid, patch: &PostPatch) -> Result<Option<PostUpdate>> {
        post_repo::update_post(&self.pool, post_id, patch).await
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
        post_repo::delete_post(&self.pool, post_id).await
    }

    async fn count_posts(&self, filter: &FeedFilter) -> Result<i64> {
        post_repo::count_posts(&self.pool, filter).await
    }

    async fn list_posts(&self, query: &FeedQuery) -> Result<Vec<PostSummaryRecord>> {
        post_repo::list_posts(&self.pool, query).await
    }

    async fn posts_by_author(&self, author_id: Uuid) -> Result<Vec<Post>> {
        post_repo::find_posts_by_author(&self.pool, author_id).await
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<LikeToggle>> {
        like_repo::toggle_like(&self.pool, post_id, user_id).await
    }

    async fn append_comment(
        &self,
        post_id: Uuid,
        comment: NewComment,
    ) -> Result<Option<Vec<Comment>>> {
        if comment_repo::create_comment(&self.pool, post_id, &comment)
            .await?
            .is_none()
        {
            return Ok(None);
        }
        comment_repo::find_comments_by_post(&self.pool, post_id)
            .await
            .map(Some)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, new: NewUser) -> Result<User> {
        user_repo::create_user(&self.pool, &new).await
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        user_repo::find_user_by_id(&self.pool, user_id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        user_repo::find_user_by_email(&self.pool, email).await
    }

    async fn find_profiles(&self, user_ids: &[Uuid]) -> Result<Vec<AuthorInfo>> {
        user_repo::find_profiles(&self.pool, user_ids).await
    }

    async fn set_profile_picture(&self, user_id: Uuid, picture: &str) -> Result<Option<User>> {
        user_repo::update_profile_picture(&self.pool, user_id, picture).await
    }
}
