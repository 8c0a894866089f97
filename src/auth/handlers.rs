use axum::{
    extract::{FromRef, Query, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, AvailabilityResponse, LoginRequest, MeResponse, RegisterRequest,
            RegisterResponse, SendVerificationRequest, TokenUser, UpdateUserTypeRequest,
            VerifyCodeRequest,
        },
        extractors::{AuthUser, SessionUser, AUTH_COOKIE},
        jwt::{Identity, JwtKeys},
        password,
    },
    error::ApiError,
    profiles::resolver,
    state::AppState,
    users::{self, User, UserType},
    verification::{self, VerifyError},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/send-verification", post(send_verification))
        .route("/verify-code", post(verify_code))
        .route("/check-username", get(check_username))
        .route("/check-email", get(check_email))
        .route("/update-user-type", post(update_user_type))
        .route("/me", get(me))
        .route("/session", get(session))
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }

    // Pre-check; the unique index only backstops the race window.
    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("User already exists".into()));
    }

    let username = users::derive_username(&payload.name);
    let hash = password::hash_password(&payload.password)?;

    let user = User::create(
        &state.db,
        users::repo::NewUser {
            user_type: payload.user_type,
            name: &payload.name,
            username: &username,
            email: &payload.email,
            password_hash: Some(hash.as_str()),
            profile_picture_url: &state.config.default_avatar_url,
            cover_picture_url: &state.config.default_cover_url,
        },
    )
    .await?;

    info!(user_id = %user.id, email = %user.email, user_type = ?user.user_type, "user registered");

    // Homeowners are usable immediately; the other roles get their session
    // once they submit the role profile.
    if user.user_type == UserType::Homeowner {
        let keys = JwtKeys::from_ref(&state);
        let token = keys.sign(&user)?;
        Ok(Json(RegisterResponse::Token(AuthResponse {
            user: TokenUser::from_user(&user),
            token,
        })))
    } else {
        Ok(Json(RegisterResponse::Ack {
            msg: "User registered successfully".into(),
        }))
    }
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::NotFound("Incorrect email".into())
        })?;

    // Federated accounts never take the password path.
    if user.google_id.is_some() {
        warn!(user_id = %user.id, "password login attempted on federated account");
        return Err(ApiError::InvalidCredentials("Login with Google".into()));
    }
    let Some(hash) = user.password_hash.as_deref() else {
        warn!(user_id = %user.id, "account has no local password");
        return Err(ApiError::InvalidCredentials("Login with Google".into()));
    };

    if !password::verify_password(&payload.password, hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials("Incorrect password".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&user)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        user: TokenUser::from_user(&user),
        token,
    }))
}

/// Stateless logout: drop the cookie-transport token. There is no
/// server-side revocation list.
async fn logout(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    let jar = jar.remove(Cookie::from(AUTH_COOKIE));
    (
        jar,
        Json(serde_json::json!({ "msg": "Logged out successfully" })),
    )
}

#[instrument(skip(state, payload))]
async fn send_verification(
    State(state): State<AppState>,
    Json(payload): Json<SendVerificationRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let record = verification::issue(&state.db, &payload.email).await?;
    // Delivery goes through the email collaborator; the ledger entry is
    // what this service owns.
    info!(email = %record.email, "verification code issued");
    Ok(Json(serde_json::json!({
        "message": "Verification code sent to your email"
    })))
}

#[instrument(skip(state, payload))]
async fn verify_code(
    State(state): State<AppState>,
    Json(payload): Json<VerifyCodeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match verification::verify(&state.db, &payload.email, &payload.verification_code).await? {
        Ok(()) => {
            info!(email = %payload.email, "verification code accepted");
            Ok(Json(serde_json::json!({
                "success": true,
                "message": "Verification code verified successfully"
            })))
        }
        Err(VerifyError::NotFound) => Err(ApiError::NotFound("User not found".into())),
        Err(VerifyError::InvalidCode) => {
            warn!(email = %payload.email, "invalid verification code");
            Err(ApiError::InvalidCode("Invalid verification code".into()))
        }
        Err(VerifyError::Expired) => {
            warn!(email = %payload.email, "expired verification code");
            Err(ApiError::Expired("Verification code expired".into()))
        }
    }
}

#[derive(Debug, Deserialize)]
struct UsernameQuery {
    username: Option<String>,
}

#[instrument(skip(state))]
async fn check_username(
    State(state): State<AppState>,
    Query(q): Query<UsernameQuery>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let username = q
        .username
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Username is required".into()))?;

    let taken = User::find_by_username(&state.db, &username).await?.is_some();
    Ok(Json(if taken {
        AvailabilityResponse {
            available: false,
            msg: "Username is already taken".into(),
        }
    } else {
        AvailabilityResponse {
            available: true,
            msg: "Username is available".into(),
        }
    }))
}

#[derive(Debug, Deserialize)]
struct EmailQuery {
    email: Option<String>,
}

#[instrument(skip(state))]
async fn check_email(
    State(state): State<AppState>,
    Query(q): Query<EmailQuery>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let email = q
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Email is required".into()))?;

    let taken = User::find_by_email(&state.db, &email).await?.is_some();
    Ok(Json(if taken {
        AvailabilityResponse {
            available: false,
            msg: "Email is already registered".into(),
        }
    } else {
        AvailabilityResponse {
            available: true,
            msg: "Email is available".into(),
        }
    }))
}

#[instrument(skip(state, claims, payload))]
async fn update_user_type(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<UpdateUserTypeRequest>,
) -> Result<Json<User>, ApiError> {
    // Role changes are keyed by the primary id; a federated-only token
    // cannot pick a role until the account is linked locally.
    let Identity::Local { id } = claims.identity else {
        return Err(ApiError::Unauthorized(
            "Token does not carry a primary user id".into(),
        ));
    };

    let user = User::update_user_type(&state.db, id, payload.user_type)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    info!(user_id = %user.id, user_type = ?user.user_type, "user type updated");
    Ok(Json(user))
}

#[instrument(skip(state, claims))]
async fn me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<MeResponse>, ApiError> {
    let view = resolver::resolve_identity(&state.db, &claims).await?;
    Ok(Json(MeResponse {
        success: true,
        user: view,
    }))
}

/// Cookie-transport twin of [`me`], used by the browser client to restore a
/// session without a stored bearer token.
#[instrument(skip(state, claims))]
async fn session(
    State(state): State<AppState>,
    SessionUser(claims): SessionUser,
) -> Result<Json<MeResponse>, ApiError> {
    let view = resolver::resolve_identity(&state.db, &claims).await?;
    Ok(Json(MeResponse {
        success: true,
        user: view,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_plain_addresses() {
        assert!(is_valid_email("jane@x.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
    }

    #[test]
    fn email_regex_rejects_garbage() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("two@@x.com"));
        assert!(!is_valid_email("spaces in@x.com"));
        assert!(!is_valid_email("no-tld@x"));
    }
}
