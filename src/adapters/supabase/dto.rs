use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserDto {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Body of a successful `/token` call.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: UserDto,
}

/// `/signup` answers with a full token response when accounts are confirmed
/// automatically, and with the bare user object otherwise.
#[derive(Debug, Clone, Deserialize)]
pub struct SignUpResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub user: Option<UserDto>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl SignUpResponse {
    pub fn into_token_response(self) -> Option<TokenResponse> {
        let access_token = self.access_token?;
        let user = self.user.or_else(|| {
            self.id.map(|id| UserDto {
                id,
                email: self.email,
            })
        })?;
        Some(TokenResponse {
            access_token,
            refresh_token: self.refresh_token,
            expires_in: self.expires_in,
            user,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SeatUpdate {
    pub available_seats: i32,
}

/// Error body shapes of both the auth and the data API.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn auth_message(self) -> Option<String> {
        self.msg
            .or(self.error_description)
            .or(self.message)
            .or(self.error)
    }

    pub fn data_message(self) -> Option<String> {
        self.message.or(self.msg).or(self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_up_without_session() {
        let body: SignUpResponse = serde_json::from_value(serde_json::json!({
            "id": "u1",
            "email": "x@example.com",
            "confirmation_sent_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(body.into_token_response().is_none());
    }

    #[test]
    fn test_sign_up_with_session() {
        let body: SignUpResponse = serde_json::from_value(serde_json::json!({
            "access_token": "at",
            "refresh_token": "rt",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": {"id": "u1", "email": "x@example.com"}
        }))
        .unwrap();
        let tokens = body.into_token_response().unwrap();
        assert_eq!(tokens.user.id, "u1");
        assert_eq!(tokens.refresh_token.as_deref(), Some("rt"));
    }

    #[test]
    fn test_auth_message_precedence() {
        let body: ErrorBody = serde_json::from_value(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        }))
        .unwrap();
        assert_eq!(body.auth_message().as_deref(), Some("Invalid login credentials"));

        let body: ErrorBody = serde_json::from_value(serde_json::json!({
            "code": 422,
            "msg": "Password should be at least 6 characters."
        }))
        .unwrap();
        assert_eq!(
            body.auth_message().as_deref(),
            Some("Password should be at least 6 characters.")
        );
    }
}
