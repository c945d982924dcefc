use actix_web::{FromRequest, HttpRequest};
use actix_web_httpauth::extractors::bearer::BearerAuth;

use crate::model::apperror::{ApplicationError, ErrorType};

/**
 * Single shared password gate. The password itself is handed out as the bearer token, so a
 * token never expires and is valid for every client.
 */
#[derive(Clone)]
pub struct AccessSecretService {
    /**
     * The configured access secret, loaded once at start-up.
     */
    access_secret: String,
}

impl AccessSecretService {
    /**
     * Creates a new instance of AccessSecretService.
     *
     * # Arguments
     * `access_secret`: The shared password.
     *
     * # Returns
     * A Result containing the AccessSecretService or an ApplicationError if the secret is empty.
     */
    pub fn new(access_secret: &str) -> Result<Self, ApplicationError> {
        if access_secret.is_empty() {
            return Err(ApplicationError::new(ErrorType::Initialization, "Access secret must not be empty".to_string()));
        }
        Ok(AccessSecretService { access_secret: access_secret.to_string() })
    }

    /**
     * Exchanges the password for a token.
     *
     * # Arguments
     * `password`: Password supplied by the user.
     *
     * # Returns
     * The token, or an ApplicationError if the password is missing or wrong.
     */
    pub fn login(&self, password: Option<&str>) -> Result<String, ApplicationError> {
        let Some(password) = password.filter(|password| !password.is_empty()) else {
            return Err(ApplicationError::new(ErrorType::Validation, "Password not provided".to_string()));
        };
        if password != self.access_secret {
            tracing::info!("Login attempt with wrong password");
            return Err(ApplicationError::new(ErrorType::Authorization, "Wrong password".to_string()));
        }
        tracing::info!("Login succeeded");
        Ok(self.access_secret.clone())
    }

    /**
     * Validates the bearer token from the HTTP request.
     *
     * # Arguments
     * `http_request`: The HTTP request containing the token in the Authorization header.
     *
     * # Returns
     * A Result indicating success or an ApplicationError if validation fails.
     */
    pub fn validate(&self, http_request: &HttpRequest) -> Result<(), ApplicationError> {
        let credentials = BearerAuth::from_request(http_request, &mut actix_web::dev::Payload::None).into_inner().ok();
        let Some(credentials) = credentials else {
            return Err(ApplicationError::new(ErrorType::Authorization, "Access denied. Please log in.".to_string()));
        };
        if credentials.token() != self.access_secret {
            tracing::debug!("Bearer token mismatch");
            return Err(ApplicationError::new(ErrorType::Authorization, "Access denied. Please log in.".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn test_access_secret_service_initialization_empty() {
        assert!(AccessSecretService::new("").is_err());
    }

    #[test]
    fn test_login_success() {
        let service = AccessSecretService::new("bomba2025").unwrap();
        assert_eq!(service.login(Some("bomba2025")).unwrap(), "bomba2025");
    }

    #[test]
    fn test_login_wrong_password() {
        let service = AccessSecretService::new("bomba2025").unwrap();
        assert_eq!(service.login(Some("bomba2024")).unwrap_err().error_type, ErrorType::Authorization);
        assert_eq!(service.login(Some("bomba2025 ")).unwrap_err().error_type, ErrorType::Authorization);
    }

    #[test]
    fn test_login_missing_password() {
        let service = AccessSecretService::new("bomba2025").unwrap();
        assert_eq!(service.login(None).unwrap_err().error_type, ErrorType::Validation);
        assert_eq!(service.login(Some("")).unwrap_err().error_type, ErrorType::Validation);
    }

    #[test]
    fn test_validator_success() {
        let service = AccessSecretService::new("bomba2025").unwrap();
        let req = TestRequest::with_uri("/api/testes").insert_header(("Authorization", "Bearer bomba2025")).to_http_request();
        assert!(service.validate(&req).is_ok());
    }

    #[test]
    fn test_validator_wrong_token() {
        let service = AccessSecretService::new("bomba2025").unwrap();
        let req = TestRequest::with_uri("/api/testes").insert_header(("Authorization", "Bearer nope")).to_http_request();
        assert_eq!(service.validate(&req).unwrap_err().error_type, ErrorType::Authorization);
    }

    #[test]
    fn test_validator_missing_header() {
        let service = AccessSecretService::new("bomba2025").unwrap();
        let req = TestRequest::with_uri("/api/testes").to_http_request();
        assert!(service.validate(&req).is_err());
    }
}
