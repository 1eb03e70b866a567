/// HTTP middleware utilities for blog-service
///
/// Bearer-token authentication comes in two shapes sharing one gate
/// ([`authenticate`]): the [`JwtAuthMiddleware`] for scopes where every route
/// is protected, and the [`AuthenticatedUser`] extractor for protected
/// handlers that sit next to public ones on the same resource.
pub mod permissions;

pub use permissions::*;

use crate::error::AppError;
use crate::state::AppState;
use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use crypto_core::TokenError;
use futures::future::LocalBoxFuture;
use serde::Serialize;
use std::future::{ready, Ready};
use std::rc::Rc;
use uuid::Uuid;

/// The acting identity, resolved from a valid bearer token.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub profile_picture: String,
}

fn no_token() -> AppError {
    AppError::Unauthorized("Not authorized, no token".to_string())
}

fn token_failed() -> AppError {
    AppError::Unauthorized("Not authorized, token failed".to_string())
}

/// `Authorization: Bearer <token>` with a non-empty token.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the request's bearer token to an existing user.
///
/// - no token: `Unauthorized("... no token")`
/// - bad signature, expired, malformed subject: `Unauthorized("... token failed")`
/// - valid token for a deleted user: `NotFound("User not found")`
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthenticatedUser, AppError> {
    let token = bearer_token(headers).ok_or_else(no_token)?;

    let user_id = state.jwt.user_id(token).map_err(|err| {
        match err {
            TokenError::Expired => tracing::debug!("rejected expired token"),
            other => tracing::debug!(error = %other, "rejected token"),
        }
        token_failed()
    })?;

    let user = state.users.find_by_id(user_id).await?.ok_or_else(|| {
        tracing::warn!(%user_id, "token for unknown user");
        AppError::NotFound("User not found".to_string())
    })?;

    let profile = user.profile();
    Ok(AuthenticatedUser {
        id: profile.id,
        first_name: profile.first_name,
        last_name: profile.last_name,
        email: profile.email,
        profile_picture: profile.profile_picture,
    })
}

fn app_state(data: Option<&web::Data<AppState>>) -> Result<web::Data<AppState>, AppError> {
    data.cloned()
        .ok_or_else(|| AppError::Internal("application state not configured".to_string()))
}

/// Actix middleware that answers requests without a valid bearer token with
/// the gate's error response and otherwise stores the [`AuthenticatedUser`]
/// in the request extensions.
pub struct JwtAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let outcome = match app_state(req.app_data::<web::Data<AppState>>()) {
                Ok(state) => authenticate(&state, req.headers()).await,
                Err(err) => Err(err),
            };

            match outcome {
                Ok(user) => {
                    req.extensions_mut().insert(user);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                Err(err) => Ok(req.error_response(err).map_into_right_body()),
            }
        })
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(user) = req.extensions().get::<AuthenticatedUser>().cloned() {
            return Box::pin(ready(Ok(user)));
        }

        let state = app_state(req.app_data::<web::Data<AppState>>());
        let headers = req.headers().clone();
        Box::pin(async move {
            let state = state?;
            authenticate(&state, &headers).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
