use axum::{
    extract::{DefaultBodyLimit, FromRef, Multipart, Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{AuthResponse, TokenUser},
        extractors::AuthUser,
        jwt::JwtKeys,
    },
    error::ApiError,
    profiles::{
        dto::{
            PortfolioResponse, ProfessionalProfileRequest, ProfileField, SupplierProfileRequest,
            UpdateFieldRequest,
        },
        repo::{self, NewProfessional, NewSupplier, Professional, Supplier},
    },
    state::AppState,
    uploads,
    users::User,
};

pub const MAX_PORTFOLIO_FILES: usize = 10;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/:user_id", get(get_user))
        .route("/professional/:user_id", get(get_professional))
        .route("/supplier/:user_id", get(get_supplier))
        .route("/professional/profile", post(submit_professional_profile))
        .route("/supplier/profile", post(submit_supplier_profile))
        .route(
            "/:user_id/profile-picture",
            get(get_profile_picture).post(upload_profile_picture),
        )
        .route(
            "/:user_id/cover-picture",
            get(get_cover_picture).post(upload_cover_picture),
        )
        .route(
            "/professional-profile/update-portfolio/:user_id",
            post(update_portfolio),
        )
        .route(
            "/professional-profile/delete-portfolio/:user_id/:index",
            delete(delete_portfolio_entry),
        )
        .route(
            "/professional-profile/update/:field/:user_id",
            put(update_profile_field),
        )
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

#[instrument(skip(state, _claims))]
async fn get_user(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(user))
}

#[instrument(skip(state, _claims))]
async fn get_professional(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Professional>, ApiError> {
    let professional = repo::find_professional_by_user(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Professional not found".into()))?;
    Ok(Json(professional))
}

#[instrument(skip(state, _claims))]
async fn get_supplier(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Supplier>, ApiError> {
    let supplier = repo::find_supplier_by_user(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Supplier not found".into()))?;
    Ok(Json(supplier))
}

#[instrument(skip(state, payload))]
async fn submit_professional_profile(
    State(state): State<AppState>,
    Json(payload): Json<ProfessionalProfileRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let professional = repo::create_professional(
        &state.db,
        NewProfessional {
            user_id: user.id,
            service_type: &payload.service_type,
            years_experience: payload.years_experience,
            bio: &payload.bio,
            certifications: &payload.certifications,
            portfolio_link: payload.portfolio_link.as_deref(),
        },
    )
    .await?;

    info!(user_id = %user.id, professional_id = %professional.id, "professional profile created");

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&user)?;
    Ok(Json(AuthResponse {
        user: TokenUser::from_user(&user),
        token,
    }))
}

#[instrument(skip(state, payload))]
async fn submit_supplier_profile(
    State(state): State<AppState>,
    Json(payload): Json<SupplierProfileRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let supplier = repo::create_supplier(
        &state.db,
        NewSupplier {
            user_id: user.id,
            business_name: &payload.business_name,
            contact_info: &payload.contact_info,
            additional_details: &payload.additional_details,
        },
    )
    .await?;

    info!(user_id = %user.id, supplier_id = %supplier.id, "supplier profile created");

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&user)?;
    Ok(Json(AuthResponse {
        user: TokenUser::from_user(&user),
        token,
    }))
}

#[instrument(skip(state))]
async fn get_profile_picture(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<String>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(user.profile_picture_url))
}

#[instrument(skip(state, mp))]
async fn upload_profile_picture(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    mut mp: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let file = uploads::single_file(&mut mp, "profilePicture")
        .await?
        .ok_or_else(|| ApiError::BadRequest("No profile picture uploaded".into()))?;

    let key = uploads::object_key(&file.file_name);
    let url = state
        .storage
        .store(&key, file.body, &file.content_type)
        .await?;
    User::set_profile_picture(&state.db, user_id, &url).await?;

    info!(user_id = %user_id, url = %url, "profile picture updated");
    Ok(Json(serde_json::json!({
        "msg": "Profile picture uploaded successfully"
    })))
}

#[instrument(skip(state))]
async fn get_cover_picture(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<String>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(user.cover_picture_url))
}

#[instrument(skip(state, mp))]
async fn upload_cover_picture(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    mut mp: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let file = uploads::single_file(&mut mp, "coverPicture")
        .await?
        .ok_or_else(|| ApiError::BadRequest("No cover picture uploaded".into()))?;

    let key = uploads::object_key(&file.file_name);
    let url = state
        .storage
        .store(&key, file.body, &file.content_type)
        .await?;
    User::set_cover_picture(&state.db, user_id, &url).await?;

    info!(user_id = %user_id, url = %url, "cover picture updated");
    Ok(Json(serde_json::json!({
        "msg": "Cover picture uploaded successfully"
    })))
}

#[instrument(skip(state, mp))]
async fn update_portfolio(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    mut mp: Multipart,
) -> Result<Json<PortfolioResponse>, ApiError> {
    let files = uploads::collect_files(&mut mp, "portfolio", MAX_PORTFOLIO_FILES).await?;
    if files.is_empty() {
        return Err(ApiError::BadRequest("No files uploaded".into()));
    }

    let professional = repo::find_professional_by_user(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Professional not found".into()))?;

    let mut portfolio = professional.portfolio;
    for file in files {
        let key = uploads::object_key(&file.file_name);
        let url = state
            .storage
            .store(&key, file.body, &file.content_type)
            .await?;
        portfolio.push(url);
    }

    let portfolio = repo::set_portfolio(&state.db, user_id, &portfolio)
        .await?
        .ok_or_else(|| ApiError::NotFound("Professional not found".into()))?;

    info!(user_id = %user_id, entries = portfolio.len(), "portfolio updated");
    Ok(Json(PortfolioResponse {
        msg: "Portfolio uploaded successfully".into(),
        portfolio,
    }))
}

/// Remove one entry, shifting later entries down. Out-of-range indices are
/// rejected rather than ignored.
fn remove_entry(mut portfolio: Vec<String>, index: usize) -> Result<Vec<String>, ApiError> {
    if index >= portfolio.len() {
        return Err(ApiError::BadRequest("Portfolio index out of range".into()));
    }
    portfolio.remove(index);
    Ok(portfolio)
}

#[instrument(skip(state))]
async fn delete_portfolio_entry(
    State(state): State<AppState>,
    Path((user_id, index)): Path<(Uuid, usize)>,
) -> Result<Json<PortfolioResponse>, ApiError> {
    let professional = repo::find_professional_by_user(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Professional not found".into()))?;

    let portfolio = remove_entry(professional.portfolio, index)?;

    let portfolio = repo::set_portfolio(&state.db, user_id, &portfolio)
        .await?
        .ok_or_else(|| ApiError::NotFound("Professional not found".into()))?;

    info!(user_id = %user_id, index, "portfolio entry deleted");
    Ok(Json(PortfolioResponse {
        msg: "Portfolio image deleted successfully".into(),
        portfolio,
    }))
}

#[instrument(skip(state, payload))]
async fn update_profile_field(
    State(state): State<AppState>,
    Path((field, user_id)): Path<(String, Uuid)>,
    Json(payload): Json<UpdateFieldRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let field: ProfileField = field.parse().map_err(|_| {
        warn!(field = %field, "unknown profile field");
        ApiError::BadRequest(format!("Unknown profile field: {field}"))
    })?;

    match field {
        ProfileField::Name => {
            User::update_name(&state.db, user_id, &payload.data_to_send)
                .await?
                .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
        }
        ProfileField::ServiceType => {
            repo::set_service_type(&state.db, user_id, &payload.data_to_send)
                .await?
                .ok_or_else(|| ApiError::NotFound("Professional not found".into()))?;
        }
        ProfileField::Bio => {
            repo::set_bio(&state.db, user_id, &payload.data_to_send)
                .await?
                .ok_or_else(|| ApiError::NotFound("Professional not found".into()))?;
        }
        ProfileField::Certifications => {
            repo::set_certifications(&state.db, user_id, &payload.data_to_send)
                .await?
                .ok_or_else(|| ApiError::NotFound("Professional not found".into()))?;
        }
    }

    info!(user_id = %user_id, field = ?field, "profile field updated");
    Ok(Json(serde_json::json!({
        "msg": "Profile updated successfully"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://fake.local/{i}.jpg")).collect()
    }

    #[test]
    fn remove_entry_preserves_relative_order() {
        let portfolio = seq(5);
        let result = remove_entry(portfolio, 2).unwrap();
        assert_eq!(
            result,
            vec![
                "https://fake.local/0.jpg",
                "https://fake.local/1.jpg",
                "https://fake.local/3.jpg",
                "https://fake.local/4.jpg",
            ]
        );
    }

    #[test]
    fn remove_entry_shrinks_by_exactly_one() {
        for k in 0..4 {
            assert_eq!(remove_entry(seq(4), k).unwrap().len(), 3);
        }
    }

    #[test]
    fn remove_entry_rejects_out_of_range_index() {
        let err = remove_entry(seq(3), 3).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        let err = remove_entry(Vec::new(), 0).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
