/// Post handlers - feed reads and post lifecycle
use crate::error::Result;
use crate::middleware::AuthenticatedUser;
use crate::models::{Post, PostDetail, PostPatch, PostSummary};
use crate::state::AppState;
use crate::uploads::MAX_POST_IMAGES;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const IMAGES_FIELD: &str = "images";
const POST_TEXT_FIELDS: &[&str] = &["title", "content"];

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsResponse {
    pub posts: Vec<PostSummary>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_posts: i64,
}

#[derive(Debug, Serialize)]
pub struct UpdatePostResponse {
    pub message: &'static str,
    pub post: Post,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// GET /api/posts
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<ListPostsQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let page = state
        .feed_service()
        .list_posts(query.page, query.limit, query.search.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(ListPostsResponse {
        posts: page.items,
        current_page: page.current_page,
        total_pages: page.total_pages,
        total_posts: page.total_items,
    }))
}

/// GET /api/posts/my-posts
pub async fn list_my_posts(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let posts: Vec<PostDetail> = state.feed_service().list_my_posts(user.id).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/posts/{id}
pub async fn get_post(state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse> {
    let post = state.feed_service().get_post(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// POST /api/posts (multipart: title, content, images)
pub async fn create_post(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    payload: Multipart,
) -> Result<HttpResponse> {
    let form = state
        .uploads
        .read_form(payload, POST_TEXT_FIELDS, IMAGES_FIELD, MAX_POST_IMAGES)
        .await?;

    let result = state
        .post_service()
        .create_post(
            user.id,
            form.field("title").unwrap_or_default(),
            form.field("content").unwrap_or_default(),
            form.files.clone(),
        )
        .await;

    match result {
        Ok(post) => Ok(HttpResponse::Created().json(post)),
        Err(err) => {
            state.uploads.remove_all(&form.files).await;
            Err(err)
        }
    }
}

/// PUT /api/posts/{id} (multipart; any new images replace the old set)
pub async fn update_post(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();
    let form = state
        .uploads
        .read_form(payload, POST_TEXT_FIELDS, IMAGES_FIELD, MAX_POST_IMAGES)
        .await?;

    let patch = PostPatch {
        title: form.field("title").map(str::to_string),
        content: form.field("content").map(str::to_string),
        images: (!form.files.is_empty()).then(|| form.files.clone()),
    };

    match state.post_service().update_post(post_id, user.id, patch).await {
        Ok(update) => {
            state.uploads.remove_all(&update.replaced_images).await;
            Ok(HttpResponse::Ok().json(UpdatePostResponse {
                message: "Post updated successfully",
                post: update.post,
            }))
        }
        Err(err) => {
            state.uploads.remove_all(&form.files).await;
            Err(err)
        }
    }
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let deleted = state
        .post_service()
        .delete_post(path.into_inner(), user.id)
        .await?;
    state.uploads.remove_all(&deleted.images).await;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Post deleted successfully",
    }))
}
