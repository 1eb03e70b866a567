/// In-process store
///
/// Holds users and posts behind a single `tokio::sync::RwLock`. Every
/// mutation happens under the write lock, which gives the same per-post
/// atomicity the Postgres store gets from row locks.
use super::feed_query::{FeedFilter, FeedQuery};
use super::{PostStore, UserStore};
use crate::error::{AppError, Result};
use crate::models::{
    AuthorInfo, Comment, LikeToggle, NewComment, NewPost, NewUser, Post, PostPatch,
    PostSummaryRecord, PostUpdate, User,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, Post>,
}

impl State {
    fn filtered<'a>(&'a self, filter: &'a FeedFilter) -> impl Iterator<Item = &'a Post> + 'a {
        self.posts.values().filter(move |p| filter.matches(p))
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop an account while leaving its posts behind. Postgres cascades
    /// instead; this exists to exercise dangling author references.
    pub async fn remove_user(&self, user_id: Uuid) -> bool {
        self.state.write().await.users.remove(&user_id).is_some()
    }

    pub async fn post_count(&self) -> usize {
        self.state.read().await.posts.len()
    }
}

#[async_trait]
impl PostStore for InMemoryStore {
    async fn insert_post(&self, new: NewPost) -> Result<Post> {
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            author_id: new.author_id,
            title: new.title,
            content: new.content,
            images: new.images,
            views: 0,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.state.write().await.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_post(&self, post_id: Uuid) -> Result<Option<Post>> {
        Ok(self.state.read().await.posts.get(&post_id).cloned())
    }

    async fn record_view(&self, post_id: Uuid) -> Result<Option<Post>> {
        let mut state = self.state.write().await;
        Ok(state.posts.get_mut(&post_id).map(|post| {
            post.views += 1;
            post.clone()
        }))
    }

    async fn update_post(&self, post_id: Uuid, patch: &PostPatch) -> Result<Option<PostUpdate>> {
        let mut state = self.state.write().await;
        let Some(post) = state.posts.get_mut(&post_id) else {
            return Ok(None);
        };

        if let Some(title) = &patch.title {
            post.title = title.clone();
        }
        if let Some(content) = &patch.content {
            post.content = content.clone();
        }
        let replaced_images = match &patch.images {
            Some(images) => std::mem::replace(&mut post.images, images.clone()),
            None => Vec::new(),
        };
        post.updated_at = Utc::now();

        Ok(Some(PostUpdate {
            post: post.clone(),
            replaced_images,
        }))
    }

    async fn delete_post(&self, post_id: Uuid) -> Result<bool> {
        Ok(self.state.write().await.posts.remove(&post_id).is_some())
    }

    async fn count_posts(&self, filter: &FeedFilter) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state.filtered(filter).count() as i64)
    }

    async fn list_posts(&self, query: &FeedQuery) -> Result<Vec<PostSummaryRecord>> {
        let state = self.state.read().await;
        let mut matching: Vec<&Post> = state.filtered(&query.filter).collect();
        matching.sort_by(|a, b| query.order.compare(a, b));

        Ok(query
            .pagination
            .window(&matching)
            .iter()
            .map(|post| PostSummaryRecord::from(*post))
            .collect())
    }

    async fn posts_by_author(&self, author_id: Uuid) -> Result<Vec<Post>> {
        let state = self.state.read().await;
        let filter = FeedFilter::all().by_author(author_id);
        let order = super::FeedOrder::NewestFirst;

        let mut posts: Vec<Post> = state.filtered(&filter).cloned().collect();
        posts.sort_by(|a, b| order.compare(a, b));
        Ok(posts)
    }

    async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<LikeToggle>> {
        let mut state = self.state.write().await;
        let Some(post) = state.posts.get_mut(&post_id) else {
            return Ok(None);
        };

        let liked = match post.likes.iter().position(|id| *id == user_id) {
            Some(index) => {
                post.likes.remove(index);
                false
            }
            None => {
                post.likes.push(user_id);
                true
            }
        };

        Ok(Some(LikeToggle {
            liked,
            likes_count: post.likes_count(),
        }))
    }

    async fn append_comment(
        &self,
        post_id: Uuid,
        comment: NewComment,
    ) -> Result<Option<Vec<Comment>>> {
        let mut state = self.state.write().await;
        let Some(post) = state.posts.get_mut(&post_id) else {
            return Ok(None);
        };

        post.comments.push(Comment {
            id: Uuid::new_v4(),
            author_id: comment.author_id,
            text: comment.text,
            created_at: Utc::now(),
        });
        Ok(Some(post.comments.clone()))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, new: NewUser) -> Result<User> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == new.email) {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            password_hash: new.password_hash,
            profile_picture: None,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_profiles(&self, user_ids: &[Uuid]) -> Result<Vec<AuthorInfo>> {
        let state = self.state.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| state.users.get(id))
            .map(User::author_info)
            .collect())
    }

    async fn set_profile_picture(&self, user_id: Uuid, picture: &str) -> Result<Option<User>> {
        let mut state = self.state.write().await;
        Ok(state.users.get_mut(&user_id).map(|user| {
            user.profile_picture = Some(picture.to_string());
            user.clone()
        }))
    }
}
