use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo;
use crate::auth::jwt::{Claims, Identity};
use crate::error::ApiError;
use crate::users::{User, UserType};

/// The sanitized "who am I" composite: the user record joined with whether
/// the role extension for its type exists. Password material never appears
/// here on any path.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityView {
    pub id: Uuid,
    pub user_type: UserType,
    pub name: String,
    pub email: String,
    pub profile_picture_url: String,
    pub profile_complete: bool,
}

impl IdentityView {
    pub fn from_parts(user: &User, profile_complete: bool) -> Self {
        Self {
            id: user.id,
            user_type: user.user_type,
            name: user.name.clone(),
            email: user.email.clone(),
            profile_picture_url: user.profile_picture_url.clone(),
            profile_complete,
        }
    }
}

/// Resolve a token's identity claim into the composite view. Exactly one
/// lookup path runs, picked by the identity tag; the role join runs only
/// for user types that have a role extension.
pub async fn resolve_identity(db: &PgPool, claims: &Claims) -> Result<IdentityView, ApiError> {
    let user = match &claims.identity {
        Identity::Local { id } => User::find_by_id(db, *id).await?,
        Identity::Federated { google_id } => User::find_by_google_id(db, google_id).await?,
    }
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let profile_complete = match user.user_type {
        UserType::Professional => repo::find_professional_by_user(db, user.id).await?.is_some(),
        UserType::Supplier => repo::find_supplier_by_user(db, user.id).await?.is_some(),
        UserType::Homeowner | UserType::Unset => false,
    };

    Ok(IdentityView::from_parts(&user, profile_complete))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn make_user(user_type: UserType) -> User {
        User {
            id: Uuid::new_v4(),
            user_type,
            name: "Jane Doe".into(),
            username: "janedoe".into(),
            email: "jane@x.com".into(),
            password_hash: Some("$argon2id$v=19$m=19456,t=2,p=1$abc$def".into()),
            google_id: None,
            profile_picture_url: "https://fake.local/avatar.jpg".into(),
            cover_picture_url: "https://fake.local/cover.png".into(),
            is_verified: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn view_never_contains_password_material() {
        let view = IdentityView::from_parts(&make_user(UserType::Professional), true);
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("argon2"));
    }

    #[test]
    fn view_serializes_expected_shape() {
        let user = make_user(UserType::Homeowner);
        let view = IdentityView::from_parts(&user, false);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["userType"], "homeowner");
        assert_eq!(json["profileComplete"], false);
        assert_eq!(json["profilePictureUrl"], "https://fake.local/avatar.jpg");
    }
}
