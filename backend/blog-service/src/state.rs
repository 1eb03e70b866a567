/// Shared application state
///
/// Built once in `main` (or by a test) and registered as `web::Data`. Services
/// are cheap per-request views over the shared store handles.
use crate::config::FeedConfig;
use crate::db::{InMemoryStore, PgStore, PostStore, UserStore};
use crate::services::{AccountService, FeedService, PostService};
use crate::uploads::UploadStore;
use crypto_core::JwtKeys;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostStore>,
    pub users: Arc<dyn UserStore>,
    pub jwt: JwtKeys,
    pub uploads: UploadStore,
    pub feed: FeedConfig,
}

impl AppState {
    pub fn new(
        posts: Arc<dyn PostStore>,
        users: Arc<dyn UserStore>,
        jwt: JwtKeys,
        uploads: UploadStore,
        feed: FeedConfig,
    ) -> Self {
        Self {
            posts,
            users,
            jwt,
            uploads,
            feed,
        }
    }

    pub fn with_postgres(store: PgStore, jwt: JwtKeys, uploads: UploadStore, feed: FeedConfig) -> Self {
        let store = Arc::new(store);
        Self::new(store.clone(), store, jwt, uploads, feed)
    }

    pub fn with_memory(store: Arc<InMemoryStore>, jwt: JwtKeys, uploads: UploadStore, feed: FeedConfig) -> Self {
        Self::new(store.clone(), store, jwt, uploads, feed)
    }

    pub fn feed_service(&self) -> FeedService {
        FeedService::new(self.posts.clone(), self.users.clone(), self.feed)
    }

    pub fn post_service(&self) -> PostService {
        PostService::new(self.posts.clone(), self.users.clone(), self.feed)
    }

    pub fn account_service(&self) -> AccountService {
        AccountService::new(self.users.clone(), self.jwt.clone())
    }
}
