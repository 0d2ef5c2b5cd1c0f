use serde::{Deserialize, Serialize};

/// Request body for `POST /api/auth/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
}

/// Request body for `POST /api/auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_response_serialization() {
        let response = LoginResponse {
            success: true,
            message: "Login successful".into(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("Login successful"));
    }

    #[test]
    fn register_request_accepts_missing_phone() {
        let body = r#"{"username":"alice1","email":"a@x.com","password":"longenough1"}"#;
        let req: RegisterRequest = serde_json::from_str(body).unwrap();
        assert!(req.phone.is_none());
    }
}
