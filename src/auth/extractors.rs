use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use super::jwt::{Claims, JwtKeys, TokenError};
use crate::error::ApiError;

/// Name of the cookie the session transport uses. Same token, same secret
/// as the bearer header; only the carrier differs.
pub const AUTH_COOKIE: &str = "auth_token";

fn reject(source: &str, err: TokenError) -> ApiError {
    match err {
        TokenError::Expired => {
            warn!(source, "expired token");
            ApiError::Unauthorized("Token expired".into())
        }
        TokenError::Invalid(e) => {
            warn!(source, error = %e, "invalid token");
            ApiError::Unauthorized("Invalid token".into())
        }
    }
}

/// Bearer-token guard for identity-sensitive routes.
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header".into()))?;

        let claims = keys.verify(token).map_err(|e| reject("bearer", e))?;
        Ok(AuthUser(claims))
    }
}

/// Cookie guard: same verification as [`AuthUser`] but reading the token
/// from the `auth_token` cookie. Used where the browser session, not an API
/// client, is the caller.
pub struct SessionUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(AUTH_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or_else(|| ApiError::Unauthorized("No token, authorization denied".into()))?;

        let claims = keys.verify(&token).map_err(|e| reject("cookie", e))?;
        Ok(SessionUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use crate::users::{User, UserType};
    use axum::http::Request;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn make_user() -> User {
        User {
            id: Uuid::new_v4(),
            user_type: UserType::Homeowner,
            name: "Jane Doe".into(),
            username: "janedoe".into(),
            email: "jane@x.com".into(),
            password_hash: None,
            google_id: None,
            profile_picture_url: String::new(),
            cover_picture_url: String::new(),
            is_verified: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[tokio::test]
    async fn bearer_and_cookie_guards_accept_the_same_token() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let user = make_user();
        let token = keys.sign(&user).expect("sign");

        let (mut parts, _) = Request::builder()
            .header("Authorization", format!("Bearer {token}"))
            .body(())
            .unwrap()
            .into_parts();
        let AuthUser(claims) = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .expect("bearer guard");
        assert_eq!(claims.email, "jane@x.com");

        let (mut parts, _) = Request::builder()
            .header("Cookie", format!("{AUTH_COOKIE}={token}"))
            .body(())
            .unwrap()
            .into_parts();
        let SessionUser(claims) = SessionUser::from_request_parts(&mut parts, &state)
            .await
            .expect("cookie guard");
        assert_eq!(claims.email, "jane@x.com");
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let state = AppState::fake();
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .err()
            .expect("should reject");
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_rejected() {
        let state = AppState::fake();
        let (mut parts, _) = Request::builder()
            .header("Authorization", "Basic abc")
            .body(())
            .unwrap()
            .into_parts();
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .err()
            .expect("should reject");
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
