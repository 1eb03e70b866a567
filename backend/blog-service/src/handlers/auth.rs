/// Account handlers - signup, login, profile
use crate::error::{AppError, Result};
use crate::middleware::AuthenticatedUser;
use crate::models::UserProfile;
use crate::state::AppState;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use validator::Validate;

const PROFILE_PICTURE_FIELD: &str = "profilePicture";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "is required"))]
    pub last_name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub message: &'static str,
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePictureResponse {
    pub message: &'static str,
    pub profile_picture: String,
}

/// POST /api/auth/signup
pub async fn signup(
    state: web::Data<AppState>,
    body: web::Json<SignupRequest>,
) -> Result<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    let session = state
        .account_service()
        .signup(&req.first_name, &req.last_name, &req.email, &req.password)
        .await?;

    Ok(HttpResponse::Created().json(SessionResponse {
        message: "User registered successfully",
        token: session.token,
        user: session.user,
    }))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let req = body.into_inner();
    req.validate()?;

    let session = state
        .account_service()
        .login(&req.email, &req.password)
        .await?;

    Ok(HttpResponse::Ok().json(SessionResponse {
        message: "Login successful",
        token: session.token,
        user: session.user,
    }))
}

/// GET /api/auth/profile
pub async fn profile(state: web::Data<AppState>, user: AuthenticatedUser) -> Result<HttpResponse> {
    let profile = state.account_service().profile(user.id).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// PUT /api/auth/profile-picture (multipart field `profilePicture`)
pub async fn update_profile_picture(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    payload: Multipart,
) -> Result<HttpResponse> {
    let form = state
        .uploads
        .read_form(payload, &[], PROFILE_PICTURE_FIELD, 1)
        .await?;
    let Some(picture) = form.files.first() else {
        return Err(AppError::Validation("No file uploaded".to_string()));
    };

    match state
        .account_service()
        .set_profile_picture(user.id, picture)
        .await
    {
        Ok(profile) => Ok(HttpResponse::Ok().json(ProfilePictureResponse {
            message: "Profile picture updated",
            profile_picture: profile.profile_picture,
        })),
        Err(err) => {
            state.uploads.remove_all(&form.files).await;
            Err(err)
        }
    }
}
