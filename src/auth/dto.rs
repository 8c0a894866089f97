use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::profiles::resolver::IdentityView;
use crate::users::{User, UserType};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub user_type: UserType,
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The token payload echoed back to the client as `user`: the display
/// fields the token itself embeds, nothing more.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub profile_picture_url: String,
}

impl TokenUser {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            profile_picture_url: user.profile_picture_url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: TokenUser,
    pub token: String,
}

/// Registration either hands back a ready session (homeowners) or a bare
/// acknowledgment (professionals and suppliers still owe a profile).
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RegisterResponse {
    Token(AuthResponse),
    Ack { msg: String },
}

#[derive(Debug, Deserialize)]
pub struct SendVerificationRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCodeRequest {
    pub email: String,
    pub verification_code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserTypeRequest {
    pub user_type: UserType,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub available: bool,
    pub msg: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub success: bool,
    pub user: IdentityView,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_parses_camel_case() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"userType":"homeowner","name":"Jane Doe","email":"jane@x.com","password":"pw123"}"#,
        )
        .unwrap();
        assert_eq!(req.user_type, UserType::Homeowner);
        assert_eq!(req.name, "Jane Doe");
    }

    #[test]
    fn verify_code_request_parses_camel_case() {
        let req: VerifyCodeRequest =
            serde_json::from_str(r#"{"email":"jane@x.com","verificationCode":"123456"}"#).unwrap();
        assert_eq!(req.verification_code, "123456");
    }

    #[test]
    fn register_response_shapes() {
        let ack = RegisterResponse::Ack {
            msg: "User registered successfully".into(),
        };
        let json = serde_json::to_value(&ack).unwrap();
        assert_eq!(json["msg"], "User registered successfully");
        assert!(json.get("token").is_none());

        let with_token = RegisterResponse::Token(AuthResponse {
            user: TokenUser {
                id: Uuid::new_v4(),
                name: "Jane Doe".into(),
                email: "jane@x.com".into(),
                profile_picture_url: "p".into(),
            },
            token: "tok".into(),
        });
        let json = serde_json::to_value(&with_token).unwrap();
        assert_eq!(json["token"], "tok");
        assert_eq!(json["user"]["profilePictureUrl"], "p");
    }
}
