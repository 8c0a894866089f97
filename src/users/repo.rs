use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Marketplace role of an account. `Unset` covers accounts that registered
/// but have not picked a side yet (e.g. via federated sign-in).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_type", rename_all = "lowercase")]
pub enum UserType {
    Homeowner,
    Professional,
    Supplier,
    Unset,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub user_type: UserType,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub profile_picture_url: String,
    pub cover_picture_url: String,
    pub is_verified: bool,
    pub created_at: OffsetDateTime,
}

/// Insert payload for a new account.
pub struct NewUser<'a> {
    pub user_type: UserType,
    pub name: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: Option<&'a str>,
    pub profile_picture_url: &'a str,
    pub cover_picture_url: &'a str,
}

const USER_COLUMNS: &str = "id, user_type, name, username, email, password_hash, google_id, \
                            profile_picture_url, cover_picture_url, is_verified, created_at";

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_google_id(db: &PgPool, google_id: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE google_id = $1"
        ))
        .bind(google_id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Insert a new account. Email uniqueness is pre-checked by the caller;
    /// the unique index only backstops the race window.
    pub async fn create(db: &PgPool, new: NewUser<'_>) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users \
             (user_type, name, username, email, password_hash, profile_picture_url, \
              cover_picture_url, is_verified) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(new.user_type)
        .bind(new.name)
        .bind(new.username)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.profile_picture_url)
        .bind(new.cover_picture_url)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn update_user_type(
        db: &PgPool,
        id: Uuid,
        user_type: UserType,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET user_type = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(user_type)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn update_name(db: &PgPool, id: Uuid, name: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET name = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn set_profile_picture(
        db: &PgPool,
        id: Uuid,
        url: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET profile_picture_url = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(url)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn set_cover_picture(
        db: &PgPool,
        id: Uuid,
        url: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET cover_picture_url = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(url)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }
}
