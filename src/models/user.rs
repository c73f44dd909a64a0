//! User and authentication models.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub language: Option<i32>,
    pub created: DateTime<Utc>,
}

/// Public user view.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserBrief {
    pub id: i32,
    pub name: String,
    pub is_admin: bool,
}

/// JWT claims carried by every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// User id as a string, per JWT convention.
    pub sub: String,
    pub name: String,
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    pub fn new(user: &User, expiration_hours: u64) -> Self {
        let now = Utc::now();
        Self {
            sub: user.id.to_string(),
            name: user.name.clone(),
            is_admin: user.is_admin,
            exp: (now + Duration::hours(expiration_hours as i64)).timestamp(),
            iat: now.timestamp(),
        }
    }

    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }

    pub fn to_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let data = decode::<UserClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: String,
    pub id: i32,
    /// "admin", "demo_admin" or "user".
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: 42,
            name: "testaaja".to_string(),
            password_hash: String::new(),
            is_admin: true,
            language: None,
            created: Utc::now(),
        }
    }

    #[test]
    fn token_round_trip() {
        let claims = UserClaims::new(&test_user(), 24);
        let token = claims.to_token("secret").unwrap();
        let decoded = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(decoded.sub, "42");
        assert_eq!(decoded.user_id(), Some(42));
        assert!(decoded.is_admin);
    }

    #[test]
    fn bad_secret_is_rejected() {
        let claims = UserClaims::new(&test_user(), 24);
        let token = claims.to_token("secret").unwrap();
        assert!(UserClaims::from_token(&token, "other").is_err());
    }
}
