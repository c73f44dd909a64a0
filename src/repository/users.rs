//! User persistence.

use sqlx::{Pool, Postgres};

use crate::error::ApiResult;
use crate::models::user::{User, UserBrief};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get_by_name(&self, name: &str) -> ApiResult<Option<User>> {
        Ok(sqlx::query_as(
            "SELECT id, name, password_hash, is_admin, language, created \
             FROM users WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn get(&self, id: i32) -> ApiResult<Option<UserBrief>> {
        Ok(
            sqlx::query_as("SELECT id, name, is_admin FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    pub async fn get_full(&self, id: i32) -> ApiResult<Option<User>> {
        Ok(sqlx::query_as(
            "SELECT id, name, password_hash, is_admin, language, created \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn insert(&self, name: &str, password_hash: &str) -> ApiResult<i32> {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO users (name, password_hash, is_admin) VALUES ($1, $2, false) \
             RETURNING id",
        )
        .bind(name)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn list(&self) -> ApiResult<Vec<UserBrief>> {
        Ok(
            sqlx::query_as("SELECT id, name, is_admin FROM users ORDER BY name")
                .fetch_all(&self.pool)
                .await?,
        )
    }

}
