//! Authentication and user lookups.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::config::AuthConfig;
use crate::error::{ApiError, ApiResult};
use crate::models::user::{LoginResponse, User, UserBrief, UserClaims};
use crate::repository::Repository;

/// The shared demo account gets admin rights but is reported with its
/// own role so the client can disable destructive actions.
const DEMO_ADMIN_NAME: &str = "demo_admin";

fn role_of(user: &User) -> &'static str {
    if user.is_admin {
        "admin"
    } else if user.name == DEMO_ADMIN_NAME {
        "demo_admin"
    } else {
        "user"
    }
}

#[derive(Clone)]
pub struct UsersService {
    repo: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repo: Repository, config: AuthConfig) -> Self {
        Self { repo, config }
    }

    fn verify_password(&self, user: &User, password: &str) -> ApiResult<bool> {
        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|_| ApiError::Internal("Virheellinen salasanatiiviste.".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    pub fn hash_password(&self, password: &str) -> ApiResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ApiError::Internal(format!("Salasanan suojaus epäonnistui: {e}")))?;
        Ok(hash.to_string())
    }

    fn token_for(&self, user: &User) -> ApiResult<LoginResponse> {
        let claims = UserClaims::new(user, self.config.jwt_expiration_hours);
        let token = claims
            .to_token(&self.config.jwt_secret)
            .map_err(|e| ApiError::Internal(format!("Tunnisteen luonti epäonnistui: {e}")))?;
        Ok(LoginResponse {
            token,
            user: user.name.clone(),
            id: user.id,
            role: role_of(user).to_string(),
        })
    }

    pub async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        let Some(user) = self.repo.users.get_by_name(username).await? else {
            tracing::warn!(username, "login for unknown user");
            return Err(ApiError::Unauthorized("Tuntematon käyttäjä".to_string()));
        };
        if !self.verify_password(&user, password)? {
            tracing::warn!(username, "failed login");
            return Err(ApiError::Unauthorized("Väärä salasana".to_string()));
        }
        self.token_for(&user)
    }

    pub async fn register(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ApiError::BadRequest(
                "Käyttäjätunnus ja salasana ovat pakollisia.".to_string(),
            ));
        }
        if self.repo.users.get_by_name(username).await?.is_some() {
            return Err(ApiError::Unauthorized("Käyttäjä on jo olemassa".to_string()));
        }
        let hash = self.hash_password(password)?;
        let id = self.repo.users.insert(username, &hash).await?;
        let Some(user) = self.repo.users.get_full(id).await? else {
            return Err(ApiError::Internal("Palvelinvirhe.".to_string()));
        };
        self.token_for(&user)
    }

    /// Issue a fresh token for an already-authenticated user.
    pub async fn refresh(&self, user_id: i32, username: &str) -> ApiResult<LoginResponse> {
        let Some(user) = self.repo.users.get_full(user_id).await? else {
            return Err(ApiError::Unauthorized(format!(
                "Tuntematon käyttäjä {username}"
            )));
        };
        if user.name != username {
            return Err(ApiError::Unauthorized(format!(
                "Tuntematon käyttäjä {username}"
            )));
        }
        self.token_for(&user)
    }

    pub async fn get(&self, id: i32) -> ApiResult<UserBrief> {
        self.repo
            .users
            .get(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Käyttäjää ei löydy.".to_string()))
    }

    pub async fn list(&self) -> ApiResult<Vec<UserBrief>> {
        self.repo.users.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(name: &str, is_admin: bool) -> User {
        User {
            id: 1,
            name: name.to_string(),
            password_hash: String::new(),
            is_admin,
            language: None,
            created: Utc::now(),
        }
    }

    #[test]
    fn roles_follow_account_type() {
        assert_eq!(role_of(&user("seppo", true)), "admin");
        assert_eq!(role_of(&user("demo_admin", false)), "demo_admin");
        assert_eq!(role_of(&user("seppo", false)), "user");
    }
}
