use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// One live verification code per email. Re-issuing overwrites in place;
/// records are not purged after expiry.
#[derive(Debug, Clone, FromRow)]
pub struct VerificationRecord {
    pub email: String,
    pub code: String,
    pub expires_at: OffsetDateTime,
}

pub async fn upsert(
    db: &PgPool,
    email: &str,
    code: &str,
    expires_at: OffsetDateTime,
) -> anyhow::Result<VerificationRecord> {
    let record = sqlx::query_as::<_, VerificationRecord>(
        r#"
        INSERT INTO email_verifications (email, code, expires_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE SET code = $2, expires_at = $3
        RETURNING email, code, expires_at
        "#,
    )
    .bind(email)
    .bind(code)
    .bind(expires_at)
    .fetch_one(db)
    .await?;
    Ok(record)
}

pub async fn find_by_email(
    db: &PgPool,
    email: &str,
) -> anyhow::Result<Option<VerificationRecord>> {
    let record = sqlx::query_as::<_, VerificationRecord>(
        r#"
        SELECT email, code, expires_at
        FROM email_verifications
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(db)
    .await?;
    Ok(record)
}
