/// Account service - signup, login and profile data
use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::models::{NewUser, UserProfile};
use crypto_core::{hash_password, verify_password, JwtKeys};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// A freshly authenticated user with a bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: UserProfile,
    pub token: String,
}

pub struct AccountService {
    users: Arc<dyn UserStore>,
    jwt: JwtKeys,
}

fn invalid_credentials() -> AppError {
    AppError::Validation("Invalid credentials".to_string())
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

impl AccountService {
    pub fn new(users: Arc<dyn UserStore>, jwt: JwtKeys) -> Self {
        Self { users, jwt }
    }

    /// Register a new account and sign it in
    pub async fn signup(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession> {
        let email = email.trim().to_lowercase();
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(format!("password hashing task failed: {}", e)))??;

        let user = self
            .users
            .insert_user(NewUser {
                first_name: first_name.trim().to_string(),
                last_name: last_name.trim().to_string(),
                email,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, "account created");
        self.session(user.profile())
    }

    /// Exchange email and password for a token. Unknown email and wrong
    /// password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let email = email.trim().to_lowercase();
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(invalid_credentials)?;

        let password = password.to_string();
        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("password check task failed: {}", e)))??;

        if !matches {
            tracing::warn!(user_id = %user.id, "login rejected: wrong password");
            return Err(invalid_credentials());
        }

        tracing::info!(user_id = %user.id, "login succeeded");
        self.session(user.profile())
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(|u| u.profile())
            .ok_or_else(user_not_found)
    }

    pub async fn set_profile_picture(&self, user_id: Uuid, picture: &str) -> Result<UserProfile> {
        let user = self
            .users
            .set_profile_picture(user_id, picture)
            .await?
            .ok_or_else(user_not_found)?;

        tracing::info!(%user_id, "profile picture updated");
        Ok(user.profile())
    }

    fn session(&self, user: UserProfile) -> Result<AuthSession> {
        let token = self
            .jwt
            .issue(user.id)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(AuthSession { user, token })
    }
}
