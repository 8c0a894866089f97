use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{config::JwtConfig, state::AppState, users::User};

/// Who a token belongs to. Locally registered accounts carry their primary
/// id; federated accounts carry the provider id instead. Serialized
/// untagged, so the wire claim is either `id` or `googleId`; when both are
/// present, the primary id wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identity {
    Local {
        id: Uuid,
    },
    Federated {
        #[serde(rename = "googleId")]
        google_id: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    #[serde(flatten)]
    pub identity: Identity,
    pub name: String,
    pub email: String,
    pub profile_picture_url: String,
    pub iat: usize,
    pub exp: usize,
}

/// Verification failures. Expiry means re-auth; anything else is a token we
/// never issued (or one that got mangled). Both surface as 401, but they are
/// kept apart for logging.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub ttl: Duration,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: Duration::from_secs((cfg.ttl_minutes as u64) * 60),
        }
    }

    /// Sign a token for a locally registered user: primary-id identity plus
    /// the display fields the client renders without a second fetch.
    pub fn sign(&self, user: &User) -> anyhow::Result<String> {
        self.sign_with_ttl(user, TimeDuration::seconds(self.ttl.as_secs() as i64))
    }

    pub(crate) fn sign_with_ttl(&self, user: &User, ttl: TimeDuration) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            identity: Identity::Local { id: user.id },
            name: user.name.clone(),
            email: user.email.clone(),
            profile_picture_url: user.profile_picture_url.clone(),
            iat: now.unix_timestamp() as usize,
            exp: (now + ttl).unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user.id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        match decode::<Claims>(token, &self.decoding, &Validation::default()) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                _ => Err(TokenError::Invalid(e)),
            },
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::new(&state.config.jwt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::UserType;

    fn make_keys() -> JwtKeys {
        let state = AppState::fake();
        JwtKeys::from_ref(&state)
    }

    fn make_user() -> User {
        User {
            id: Uuid::new_v4(),
            user_type: UserType::Homeowner,
            name: "Jane Doe".into(),
            username: "janedoe".into(),
            email: "jane@x.com".into(),
            password_hash: Some("hash".into()),
            google_id: None,
            profile_picture_url: "https://fake.local/avatar.jpg".into(),
            cover_picture_url: "https://fake.local/cover.png".into(),
            is_verified: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[tokio::test]
    async fn sign_and_verify_roundtrip() {
        let keys = make_keys();
        let user = make_user();
        let token = keys.sign(&user).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.identity, Identity::Local { id: user.id });
        assert_eq!(claims.name, "Jane Doe");
        assert_eq!(claims.email, "jane@x.com");
    }

    #[tokio::test]
    async fn expired_token_is_classified_as_expired() {
        let keys = make_keys();
        let user = make_user();
        // well past the default validation leeway
        let token = keys
            .sign_with_ttl(&user, TimeDuration::seconds(-300))
            .expect("sign");
        match keys.verify(&token) {
            Err(TokenError::Expired) => {}
            other => panic!("expected Expired, got {:?}", other.map(|c| c.email)),
        }
    }

    #[tokio::test]
    async fn garbage_token_is_invalid_not_expired() {
        let keys = make_keys();
        match keys.verify("not.a.token") {
            Err(TokenError::Invalid(_)) => {}
            other => panic!("expected Invalid, got {:?}", other.map(|c| c.email)),
        }
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_invalid() {
        let keys = make_keys();
        let other = JwtKeys::new(&JwtConfig {
            secret: "different-secret".into(),
            ttl_minutes: 60,
        });
        let token = other.sign(&make_user()).expect("sign");
        assert!(matches!(keys.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[tokio::test]
    async fn federated_claims_resolve_to_federated_identity() {
        let keys = make_keys();
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            identity: Identity::Federated {
                google_id: "google-oauth2|12345".into(),
            },
            name: "Remote User".into(),
            email: "remote@x.com".into(),
            profile_picture_url: String::new(),
            iat: now.unix_timestamp() as usize,
            exp: (now + TimeDuration::days(1)).unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        let decoded = keys.verify(&token).expect("verify");
        assert_eq!(
            decoded.identity,
            Identity::Federated {
                google_id: "google-oauth2|12345".into()
            }
        );
    }

    #[test]
    fn primary_id_wins_when_both_claims_present() {
        let id = Uuid::new_v4();
        let value = serde_json::json!({
            "id": id,
            "googleId": "google-oauth2|12345",
            "name": "n",
            "email": "e@x.com",
            "profilePictureUrl": "",
            "iat": 0,
            "exp": 0,
        });
        let claims: Claims = serde_json::from_value(value).unwrap();
        assert_eq!(claims.identity, Identity::Local { id });
    }

    #[test]
    fn claims_serialize_camel_case() {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            identity: Identity::Local { id: Uuid::new_v4() },
            name: "n".into(),
            email: "e@x.com".into(),
            profile_picture_url: "p".into(),
            iat: now.unix_timestamp() as usize,
            exp: now.unix_timestamp() as usize,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("id").is_some());
        assert!(json.get("profilePictureUrl").is_some());
        assert!(json.get("googleId").is_none());
    }
}
