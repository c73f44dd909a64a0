//! Reference-table reads: countries, languages, genres, roles and the
//! enumerated types.

use sqlx::{Pool, Postgres};

use crate::error::{ApiError, ApiResult};
use crate::models::refs::{Genre, IdName};

#[derive(Clone)]
pub struct RefsRepository {
    pool: Pool<Postgres>,
}

impl RefsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn id_names(&self, table: &str) -> ApiResult<Vec<IdName>> {
        let sql = format!("SELECT id, name FROM {table} ORDER BY name");
        Ok(sqlx::query_as(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn genres(&self) -> ApiResult<Vec<Genre>> {
        Ok(
            sqlx::query_as("SELECT id, name, abbr FROM genre ORDER BY id")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    pub async fn countries(&self) -> ApiResult<Vec<IdName>> {
        self.id_names("country").await
    }

    pub async fn languages(&self) -> ApiResult<Vec<IdName>> {
        self.id_names("language").await
    }

    pub async fn roles(&self) -> ApiResult<Vec<IdName>> {
        Ok(sqlx::query_as("SELECT id, name FROM contributorrole ORDER BY id")
            .fetch_all(&self.pool)
            .await?)
    }

    /// Roles legal for one contribution target. Unknown targets are user
    /// error.
    pub async fn roles_for_target(&self, target: &str) -> ApiResult<Vec<IdName>> {
        let ids: &[i32] = match target {
            "work" => &crate::models::refs::role::WORK_ROLES,
            "edition" => &crate::models::refs::role::EDITION_ROLES,
            "short" => &crate::models::refs::role::SHORT_ROLES,
            "issue" => &crate::models::refs::role::ISSUE_ROLES,
            other => {
                return Err(ApiError::BadRequest(format!(
                    "Virheellinen kohde {other}."
                )))
            }
        };
        Ok(sqlx::query_as(
            "SELECT id, name FROM contributorrole WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn work_types(&self) -> ApiResult<Vec<IdName>> {
        Ok(sqlx::query_as("SELECT id, name FROM worktype ORDER BY id")
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn story_types(&self) -> ApiResult<Vec<IdName>> {
        Ok(sqlx::query_as("SELECT id, name FROM storytype ORDER BY id")
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn bindings(&self) -> ApiResult<Vec<IdName>> {
        Ok(sqlx::query_as("SELECT id, name FROM bindingtype ORDER BY id")
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn formats(&self) -> ApiResult<Vec<IdName>> {
        Ok(sqlx::query_as("SELECT id, name FROM format ORDER BY id")
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn publication_sizes(&self) -> ApiResult<Vec<IdName>> {
        Ok(sqlx::query_as("SELECT id, name FROM publicationsize ORDER BY id")
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn magazine_types(&self) -> ApiResult<Vec<IdName>> {
        Ok(sqlx::query_as("SELECT id, name FROM magazinetype ORDER BY id")
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn tag_types(&self) -> ApiResult<Vec<IdName>> {
        Ok(sqlx::query_as("SELECT id, name FROM tagtype ORDER BY id")
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn filter_countries(&self, pattern: &str) -> ApiResult<Vec<IdName>> {
        Ok(sqlx::query_as(
            "SELECT id, name FROM country WHERE name ILIKE $1 ORDER BY name",
        )
        .bind(format!("{pattern}%"))
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn filter_languages(&self, pattern: &str) -> ApiResult<Vec<IdName>> {
        Ok(sqlx::query_as(
            "SELECT id, name FROM language WHERE name ILIKE $1 ORDER BY name",
        )
        .bind(format!("{pattern}%"))
        .fetch_all(&self.pool)
        .await?)
    }
}
