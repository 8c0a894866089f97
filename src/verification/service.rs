use rand::Rng;
use sqlx::PgPool;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;

use super::repo::{self, VerificationRecord};

pub const CODE_LENGTH: usize = 6;
pub const CODE_TTL_MINUTES: i64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("no verification code for this email")]
    NotFound,
    #[error("invalid verification code")]
    InvalidCode,
    #[error("verification code expired")]
    Expired,
}

fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    let code: u32 = rng.gen_range(0..1_000_000);
    format!("{:06}", code)
}

/// Issue a fresh code for `email`, overwriting any live record. Delivery of
/// the code (email dispatch) is an external collaborator.
pub async fn issue(db: &PgPool, email: &str) -> anyhow::Result<VerificationRecord> {
    let code = generate_code();
    let expires_at = OffsetDateTime::now_utc() + Duration::minutes(CODE_TTL_MINUTES);
    let record = repo::upsert(db, email, &code, expires_at).await?;
    debug!(email = %email, expires_at = %record.expires_at, "verification code issued");
    Ok(record)
}

pub async fn verify(db: &PgPool, email: &str, submitted: &str) -> anyhow::Result<Result<(), VerifyError>> {
    let Some(record) = repo::find_by_email(db, email).await? else {
        return Ok(Err(VerifyError::NotFound));
    };
    Ok(record.check(submitted, OffsetDateTime::now_utc()))
}

impl VerificationRecord {
    /// Equality is checked before expiry: a wrong code is always
    /// `InvalidCode`, even when the record has also lapsed.
    pub fn check(&self, submitted: &str, now: OffsetDateTime) -> Result<(), VerifyError> {
        if self.code != submitted {
            return Err(VerifyError::InvalidCode);
        }
        if now >= self.expires_at {
            return Err(VerifyError::Expired);
        }
        Ok(())
    }
}
