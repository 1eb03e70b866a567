/// Serves stored upload files
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::uploads::content_type_for;
use actix_web::{http::header, web, HttpResponse};
use std::io::ErrorKind;

fn file_not_found() -> AppError {
    AppError::NotFound("File not found".to_string())
}

/// GET /uploads/{name}
pub async fn serve_upload(state: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse> {
    let name = path.into_inner();
    let file_path = state.uploads.resolve(&name).ok_or_else(file_not_found)?;

    let bytes = match tokio::fs::read(&file_path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(file_not_found()),
        Err(e) => return Err(e.into()),
    };

    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&name))
        .insert_header((header::CACHE_CONTROL, "public, max-age=86400"))
        .body(bytes))
}
