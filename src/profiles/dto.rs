use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalProfileRequest {
    pub email: String,
    pub service_type: String,
    #[serde(default)]
    pub years_experience: i32,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub certifications: String,
    pub portfolio_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierProfileRequest {
    pub email: String,
    pub business_name: String,
    #[serde(default)]
    pub contact_info: String,
    #[serde(default)]
    pub additional_details: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFieldRequest {
    pub data_to_send: String,
}

#[derive(Debug, Serialize)]
pub struct PortfolioResponse {
    pub msg: String,
    pub portfolio: Vec<String>,
}

/// The closed set of fields the profile-update route accepts. Anything else
/// is rejected up front instead of silently ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    ServiceType,
    Bio,
    Certifications,
}

impl FromStr for ProfileField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(ProfileField::Name),
            "serviceType" => Ok(ProfileField::ServiceType),
            "bio" => Ok(ProfileField::Bio),
            "certifications" => Ok(ProfileField::Certifications),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_field_parses_known_names() {
        assert_eq!("name".parse(), Ok(ProfileField::Name));
        assert_eq!("serviceType".parse(), Ok(ProfileField::ServiceType));
        assert_eq!("bio".parse(), Ok(ProfileField::Bio));
        assert_eq!("certifications".parse(), Ok(ProfileField::Certifications));
    }

    #[test]
    fn profile_field_rejects_unknown_names() {
        assert!("email".parse::<ProfileField>().is_err());
        assert!("portfolio".parse::<ProfileField>().is_err());
        assert!("".parse::<ProfileField>().is_err());
        // case-sensitive: the wire contract uses camelCase exactly
        assert!("servicetype".parse::<ProfileField>().is_err());
    }

    #[test]
    fn update_field_request_parses_camel_case() {
        let req: UpdateFieldRequest =
            serde_json::from_str(r#"{"dataToSend":"Plumbing"}"#).unwrap();
        assert_eq!(req.data_to_send, "Plumbing");
    }

    #[test]
    fn professional_request_defaults_optional_fields() {
        let req: ProfessionalProfileRequest = serde_json::from_str(
            r#"{"email":"p@x.com","serviceType":"Plumbing"}"#,
        )
        .unwrap();
        assert_eq!(req.years_experience, 0);
        assert!(req.bio.is_empty());
        assert!(req.portfolio_link.is_none());
    }
}
