/// Feed service - read side of posts
use crate::config::FeedConfig;
use crate::db::{FeedFilter, FeedOrder, FeedQuery, Pagination, PostStore, UserStore};
use crate::error::{AppError, Result};
use crate::models::{FeedPage, Post, PostDetail, PostSummary};
use std::sync::Arc;
use uuid::Uuid;

use super::{comment_views, resolve_authors};

pub struct FeedService {
    posts: Arc<dyn PostStore>,
    users: Arc<dyn UserStore>,
    config: FeedConfig,
}

impl FeedService {
    pub fn new(posts: Arc<dyn PostStore>, users: Arc<dyn UserStore>, config: FeedConfig) -> Self {
        Self {
            posts,
            users,
            config,
        }
    }

    /// Newest-first page of posts, optionally narrowed by a search term.
    pub async fn list_posts(
        &self,
        page: Option<i64>,
        limit: Option<i64>,
        search: Option<&str>,
    ) -> Result<FeedPage<PostSummary>> {
        let query = FeedQuery {
            filter: FeedFilter::all().with_search(search),
            order: FeedOrder::NewestFirst,
            pagination: Pagination::from_request(page, limit, &self.config)?,
        };

        let total_items = self.posts.count_posts(&query.filter).await?;
        let records = if query.pagination.offset() < total_items {
            self.posts.list_posts(&query).await?
        } else {
            Vec::new()
        };

        let authors = resolve_authors(self.users.as_ref(), records.iter().map(|r| r.author_id)).await?;
        let items = records
            .into_iter()
            .map(|record| {
                let author = authors.get(&record.author_id).cloned();
                PostSummary::from_record(record, author)
            })
            .collect();

        Ok(FeedPage {
            items,
            total_items,
            total_pages: query.pagination.total_pages(total_items),
            current_page: query.pagination.page(),
        })
    }

    /// Count a view and return the post with authors resolved.
    pub async fn get_post(&self, post_id: Uuid) -> Result<PostDetail> {
        let post = self
            .posts
            .record_view(post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        self.details(vec![post])
            .await?
            .pop()
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
    }

    /// Every post of `author_id`, newest first.
    pub async fn list_my_posts(&self, author_id: Uuid) -> Result<Vec<PostDetail>> {
        let posts = self.posts.posts_by_author(author_id).await?;
        self.details(posts).await
    }

    /// Full views of `posts`, resolving post and comment authors in one lookup.
    async fn details(&self, posts: Vec<Post>) -> Result<Vec<PostDetail>> {
        let author_ids = posts.iter().flat_map(|post| {
            std::iter::once(post.author_id).chain(post.comments.iter().map(|c| c.author_id))
        });
        let authors = resolve_authors(self.users.as_ref(), author_ids).await?;

        Ok(posts
            .into_iter()
            .map(|post| {
                let likes_count = post.likes_count();
                let comments_count = post.comments_count();

                PostDetail {
                    id: post.id,
                    title: post.title,
                    content: post.content,
                    images: post.images,
                    author_id: post.author_id,
                    author: authors.get(&post.author_id).cloned(),
                    views: post.views,
                    likes: post.likes,
                    likes_count,
                    comments: comment_views(post.comments, &authors),
                    comments_count,
                    created_at: post.created_at,
                    updated_at: post.updated_at,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;
    use crate::models::{AuthorInfo, NewComment, NewPost, NewUser, User};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts author lookups made against the wrapped store.
    struct CountingUsers {
        inner: Arc<InMemoryStore>,
        profile_lookups: AtomicUsize,
    }

    #[async_trait]
    impl UserStore for CountingUsers {
        async fn insert_user(&self, new: NewUser) -> Result<User> {
            self.inner.insert_user(new).await
        }

        async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
            self.inner.find_by_id(user_id).await
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
            self.inner.find_by_email(email).await
        }

        async fn find_profiles(&self, user_ids: &[Uuid]) -> Result<Vec<AuthorInfo>> {
            self.profile_lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.find_profiles(user_ids).await
        }

        async fn set_profile_picture(&self, user_id: Uuid, picture: &str) -> Result<Option<User>> {
            self.inner.set_profile_picture(user_id, picture).await
        }
    }

    async fn setup() -> (Arc<InMemoryStore>, FeedService, Uuid) {
        let store = Arc::new(InMemoryStore::new());
        let user = store
            .insert_user(NewUser {
                first_name: "Grace".into(),
                last_name: "Hopper".into(),
                email: "grace@example.com".into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();
        let service = FeedService::new(store.clone(), store.clone(), FeedConfig::default());
        (store, service, user.id)
    }

    async fn seed(store: &InMemoryStore, author_id: Uuid, titles: &[&str]) {
        for title in titles {
            store
                .insert_post(NewPost {
                    author_id,
                    title: title.to_string(),
                    content: "some content".into(),
                    images: vec![],
                })
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_pages_partition_the_feed() {
        let (store, service, author) = setup().await;
        let titles: Vec<String> = (0..23).map(|i| format!("post {}", i)).collect();
        let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        seed(&store, author, &refs).await;

        let first = service.list_posts(Some(1), Some(10), None).await.unwrap();
        assert_eq!(first.total_items, 23);
        assert_eq!(first.total_pages, 3);

        let mut seen = HashSet::new();
        let mut count = 0;
        for page in 1..=first.total_pages {
            let result = service.list_posts(Some(page), Some(10), None).await.unwrap();
            for item in result.items {
                count += 1;
                assert!(seen.insert(item.id), "duplicate across pages");
                assert_eq!(item.author.as_ref().unwrap().name, "Grace Hopper");
            }
        }
        assert_eq!(count, 23);
    }

    #[tokio::test]
    async fn test_page_beyond_total_is_empty() {
        let (store, service, author) = setup().await;
        seed(&store, author, &["a", "b", "c"]).await;

        let page = service.list_posts(Some(9), Some(2), None).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.current_page, 9);
    }

    #[tokio::test]
    async fn test_search_without_match() {
        let (store, service, author) = setup().await;
        seed(&store, author, &["Rust tips", "Cooking"]).await;

        let page = service.list_posts(None, None, Some("zzz")).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 0);
        assert_eq!(page.total_pages, 0);

        let page = service.list_posts(None, None, Some("rust")).await.unwrap();
        assert_eq!(page.total_items, 1);
        assert_eq!(page.items[0].title, "Rust tips");
    }

    #[tokio::test]
    async fn test_each_read_counts_a_view() {
        let (store, service, author) = setup().await;
        seed(&store, author, &["viewed"]).await;
        let id = store.posts_by_author(author).await.unwrap()[0].id;

        service.get_post(id).await.unwrap();
        let second = service.get_post(id).await.unwrap();
        assert_eq!(second.views, 2);
    }

    #[tokio::test]
    async fn test_unknown_post_is_not_found() {
        let (_store, service, _author) = setup().await;
        assert!(matches!(
            service.get_post(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_dangling_author_renders_without_profile() {
        let (store, service, author) = setup().await;
        seed(&store, author, &["orphan"]).await;
        store.remove_user(author).await;

        let page = service.list_posts(None, None, None).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(page.items[0].author.is_none());
    }

    #[tokio::test]
    async fn test_my_posts_only_lists_own() {
        let (store, service, author) = setup().await;
        seed(&store, author, &["mine 1", "mine 2"]).await;
        seed(&store, Uuid::new_v4(), &["theirs"]).await;

        let mine = service.list_my_posts(author).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|p| p.author_id == author));
        assert!(mine[0].created_at >= mine[1].created_at);
    }

    #[tokio::test]
    async fn test_my_posts_resolve_authors_in_one_lookup() {
        let (store, _service, author) = setup().await;
        let commenter = store
            .insert_user(NewUser {
                first_name: "Alan".into(),
                last_name: "Turing".into(),
                email: "alan@example.com".into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap()
            .id;
        let titles: Vec<String> = (0..40).map(|i| format!("post {}", i)).collect();
        let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        seed(&store, author, &refs).await;
        for post in store.posts_by_author(author).await.unwrap() {
            store
                .append_comment(
                    post.id,
                    NewComment {
                        author_id: commenter,
                        text: "nice".into(),
                    },
                )
                .await
                .unwrap();
        }

        let users = Arc::new(CountingUsers {
            inner: store.clone(),
            profile_lookups: AtomicUsize::new(0),
        });
        let service = FeedService::new(store.clone(), users.clone(), FeedConfig::default());

        let mine = service.list_my_posts(author).await.unwrap();
        assert_eq!(mine.len(), 40);
        assert_eq!(users.profile_lookups.load(Ordering::SeqCst), 1);
        assert!(mine.iter().all(|p| {
            p.author.as_ref().map(|a| a.name.as_str()) == Some("Grace Hopper")
                && p.comments[0].author.as_ref().map(|a| a.name.as_str()) == Some("Alan Turing")
        }));
    }
}
