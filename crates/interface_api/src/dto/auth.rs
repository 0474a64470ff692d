//! Registration and login bodies

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /api/user/register` and `POST /api/user/login`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(length(min = 1, max = 255, message = "login must not be empty"))]
    pub login: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: String,
}

/// Token issued on register and login, also sent as `Authorization`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_fields_fail_validation() {
        let request = CredentialsRequest {
            login: String::new(),
            password: "pw".to_string(),
        };
        assert!(request.validate().is_err());

        let request = CredentialsRequest {
            login: "alice".to_string(),
            password: String::new(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_valid_credentials() {
        let request: CredentialsRequest =
            serde_json::from_str(r#"{"login":"alice","password":"pw"}"#).unwrap();
        assert!(request.validate().is_ok());
    }
}
