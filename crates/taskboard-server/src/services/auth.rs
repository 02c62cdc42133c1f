//! Authentication service

use crate::error::AuthError;
use crate::storage::UserStore;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskboard_types::{AuthToken, Credentials};

pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt_secret: String,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt_secret: String, token_ttl_hours: i64) -> Self {
        Self {
            users,
            jwt_secret,
            token_ttl: Duration::hours(token_ttl_hours),
        }
    }

    pub async fn register(&self, credentials: &Credentials) -> Result<AuthToken, AuthError> {
        let user_id = self.users.insert_user(credentials).await?;
        self.issue_token(user_id)
    }

    /// `UserNotFound` and `IncorrectPassword` are kept apart here; the HTTP
    /// layer decides how much of that a client gets to see.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthToken, AuthError> {
        let user_id = self.users.check_user(credentials).await?;
        self.issue_token(user_id)
    }

    pub fn issue_token(&self, user_id: i64) -> Result<AuthToken, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Encode(e.to_string()))?;

        Ok(AuthToken { token, user_id })
    }

    /// User id carried by a valid, unexpired token
    pub fn validate_token(&self, token: &str) -> Result<i64, AuthError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        token_data
            .claims
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidToken("subject is not a user id".to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user id
    iat: i64,
    exp: i64,
}
