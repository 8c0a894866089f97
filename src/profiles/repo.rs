use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Role extension for professionals. `portfolio` is display-ordered; every
/// mutation preserves the relative order of surviving entries.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Professional {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service_type: String,
    pub years_experience: i32,
    pub bio: String,
    pub certifications: String,
    pub portfolio_link: Option<String>,
    pub portfolio: Vec<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_name: String,
    pub contact_info: String,
    pub additional_details: String,
    pub created_at: OffsetDateTime,
}

pub struct NewProfessional<'a> {
    pub user_id: Uuid,
    pub service_type: &'a str,
    pub years_experience: i32,
    pub bio: &'a str,
    pub certifications: &'a str,
    pub portfolio_link: Option<&'a str>,
}

pub struct NewSupplier<'a> {
    pub user_id: Uuid,
    pub business_name: &'a str,
    pub contact_info: &'a str,
    pub additional_details: &'a str,
}

const PROFESSIONAL_COLUMNS: &str = "id, user_id, service_type, years_experience, bio, \
                                    certifications, portfolio_link, portfolio, created_at";

const SUPPLIER_COLUMNS: &str =
    "id, user_id, business_name, contact_info, additional_details, created_at";

pub async fn create_professional(
    db: &PgPool,
    new: NewProfessional<'_>,
) -> anyhow::Result<Professional> {
    let row = sqlx::query_as::<_, Professional>(&format!(
        "INSERT INTO professionals \
         (user_id, service_type, years_experience, bio, certifications, portfolio_link) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {PROFESSIONAL_COLUMNS}"
    ))
    .bind(new.user_id)
    .bind(new.service_type)
    .bind(new.years_experience)
    .bind(new.bio)
    .bind(new.certifications)
    .bind(new.portfolio_link)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn find_professional_by_user(
    db: &PgPool,
    user_id: Uuid,
) -> anyhow::Result<Option<Professional>> {
    let row = sqlx::query_as::<_, Professional>(&format!(
        "SELECT {PROFESSIONAL_COLUMNS} FROM professionals WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Replace the whole portfolio sequence. Concurrent writers race
/// last-write-wins; there is no optimistic-concurrency check.
pub async fn set_portfolio(
    db: &PgPool,
    user_id: Uuid,
    portfolio: &[String],
) -> anyhow::Result<Option<Vec<String>>> {
    let row: Option<(Vec<String>,)> = sqlx::query_as(
        "UPDATE professionals SET portfolio = $2 WHERE user_id = $1 RETURNING portfolio",
    )
    .bind(user_id)
    .bind(portfolio)
    .fetch_optional(db)
    .await?;
    Ok(row.map(|(p,)| p))
}

pub async fn set_service_type(
    db: &PgPool,
    user_id: Uuid,
    value: &str,
) -> anyhow::Result<Option<Professional>> {
    let row = sqlx::query_as::<_, Professional>(&format!(
        "UPDATE professionals SET service_type = $2 WHERE user_id = $1 \
         RETURNING {PROFESSIONAL_COLUMNS}"
    ))
    .bind(user_id)
    .bind(value)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn set_bio(
    db: &PgPool,
    user_id: Uuid,
    value: &str,
) -> anyhow::Result<Option<Professional>> {
    let row = sqlx::query_as::<_, Professional>(&format!(
        "UPDATE professionals SET bio = $2 WHERE user_id = $1 RETURNING {PROFESSIONAL_COLUMNS}"
    ))
    .bind(user_id)
    .bind(value)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn set_certifications(
    db: &PgPool,
    user_id: Uuid,
    value: &str,
) -> anyhow::Result<Option<Professional>> {
    let row = sqlx::query_as::<_, Professional>(&format!(
        "UPDATE professionals SET certifications = $2 WHERE user_id = $1 \
         RETURNING {PROFESSIONAL_COLUMNS}"
    ))
    .bind(user_id)
    .bind(value)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn create_supplier(db: &PgPool, new: NewSupplier<'_>) -> anyhow::Result<Supplier> {
    let row = sqlx::query_as::<_, Supplier>(&format!(
        "INSERT INTO suppliers (user_id, business_name, contact_info, additional_details) \
         VALUES ($1, $2, $3, $4) \
         RETURNING {SUPPLIER_COLUMNS}"
    ))
    .bind(new.user_id)
    .bind(new.business_name)
    .bind(new.contact_info)
    .bind(new.additional_details)
    .fetch_one(db)
    .await?;
    Ok(row)
}

pub async fn find_supplier_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Supplier>> {
    let row = sqlx::query_as::<_, Supplier>(&format!(
        "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}
