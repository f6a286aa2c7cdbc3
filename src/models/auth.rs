//! Authentication request/response DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /auth/signup`
///
/// Missing fields deserialize to empty strings so that both absent and empty
/// values are rejected by the same validation.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
}

impl RegisterRequest {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Body of `POST /auth/signin`
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Response of a successful sign-in; the refresh token travels in a cookie
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub access_token: String,
}

/// Response of a successful refresh
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Response of `POST /auth/logout-all`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutAllResponse {
    pub revoked_sessions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_requires_every_field() {
        let body = r#"{"username":"alice","password":"pw","email":"a@example.com","firstName":"Alice"}"#;
        let req: RegisterRequest = serde_json::from_str(body).unwrap();
        assert!(req.validate().is_err());

        let body = r#"{"username":"alice","password":"pw","email":"a@example.com","firstName":"Alice","lastName":""}"#;
        let req: RegisterRequest = serde_json::from_str(body).unwrap();
        assert!(req.validate().is_err());

        let body = r#"{"username":"alice","password":"pw","email":"a@example.com","firstName":"Alice","lastName":"Liddell"}"#;
        let req: RegisterRequest = serde_json::from_str(body).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.display_name(), "Alice Liddell");
    }

    #[test]
    fn test_login_response_field_names() {
        let json = serde_json::to_value(LoginResponse {
            message: "User alice logged in".to_string(),
            access_token: "token".to_string(),
        })
        .unwrap();
        assert_eq!(json["accessToken"], "token");
        assert!(json.get("refreshToken").is_none());
    }
}
