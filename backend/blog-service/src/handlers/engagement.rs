/// Engagement handlers - likes and comments
use crate::error::Result;
use crate::middleware::AuthenticatedUser;
use crate::models::CommentView;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct AddCommentRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddCommentResponse {
    pub message: &'static str,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleLikeResponse {
    pub message: &'static str,
    pub likes_count: i64,
    pub liked_by_user: bool,
}

/// POST /api/posts/{id}/comments
pub async fn add_comment(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    body: web::Json<AddCommentRequest>,
) -> Result<HttpResponse> {
    let text = body.into_inner().text.unwrap_or_default();
    let comments = state
        .post_service()
        .add_comment(path.into_inner(), user.id, &text)
        .await?;

    Ok(HttpResponse::Created().json(AddCommentResponse {
        message: "Comment added",
        comments,
    }))
}

/// POST /api/posts/{id}/like
pub async fn toggle_like(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let toggle = state
        .post_service()
        .toggle_like(path.into_inner(), user.id)
        .await?;

    Ok(HttpResponse::Ok().json(ToggleLikeResponse {
        message: if toggle.liked {
            "Post liked"
        } else {
            "Post unliked"
        },
        likes_count: toggle.likes_count,
        liked_by_user: toggle.liked,
    }))
}
