use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Avatar shown for accounts that never uploaded one.
pub const DEFAULT_PROFILE_PICTURE: &str = "https://via.placeholder.com/100/A78BFA/FFFFFF?text=P";

/// Stored account. Never serialized directly: it carries the password hash.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            profile_picture: self
                .profile_picture
                .clone()
                .unwrap_or_else(|| DEFAULT_PROFILE_PICTURE.to_string()),
            created_at: self.created_at,
        }
    }

    pub fn author_info(&self) -> AuthorInfo {
        AuthorInfo::new(
            self.id,
            self.first_name.clone(),
            self.last_name.clone(),
            self.profile_picture.clone(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    /// Already lowercased.
    pub email: String,
    pub password_hash: String,
}

/// What the account owner sees about themselves.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub profile_picture: String,
    pub created_at: DateTime<Utc>,
}

/// What everyone else sees about an author.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorInfo {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub name: String,
    pub profile_picture: String,
}

impl AuthorInfo {
    pub fn new(
        id: Uuid,
        first_name: String,
        last_name: String,
        profile_picture: Option<String>,
    ) -> Self {
        let name = format!("{} {}", first_name, last_name);
        Self {
            id,
            first_name,
            last_name,
            name,
            profile_picture: profile_picture.unwrap_or_else(|| DEFAULT_PROFILE_PICTURE.to_string()),
        }
    }
}
