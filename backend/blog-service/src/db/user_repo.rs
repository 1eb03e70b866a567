use crate::error::{AppError, Result};
use crate::models::{AuthorInfo, NewUser, User};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, first_name, last_name, email, password_hash, profile_picture, created_at";

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    profile_picture: Option<String>,
}

/// Create an account. A taken email surfaces as `Conflict`.
pub async fn create_user(pool: &PgPool, new: &NewUser) -> Result<User> {
    let result = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (id, first_name, last_name, email, password_hash)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&new.first_name)
    .bind(&new.last_name)
    .bind(&new.email)
    .bind(&new.password_hash)
    .fetch_one(pool)
    .await;

    match result {
        Ok(user) => Ok(user),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(AppError::Conflict("User already exists".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn find_user_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let user =
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(pool)
            .await?;

    Ok(user)
}

/// Batch lookup of author display data
pub async fn find_profiles(pool: &PgPool, user_ids: &[Uuid]) -> Result<Vec<AuthorInfo>> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, ProfileRow>(
        r#"
        SELECT id, first_name, last_name, profile_picture
        FROM users
        WHERE id = ANY($1)
        "#,
    )
    .bind(user_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| AuthorInfo::new(r.id, r.first_name, r.last_name, r.profile_picture))
        .collect())
}

pub async fn update_profile_picture(
    pool: &PgPool,
    user_id: Uuid,
    picture: &str,
) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET profile_picture = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(user_id)
    .bind(picture)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}
