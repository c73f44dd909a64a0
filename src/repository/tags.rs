//! Tag persistence. Tags attach to six entity types through junction
//! tables, so renames, merges and deletes all have to mind the lot.

use sqlx::{Pool, Postgres};

use crate::error::{ApiError, ApiResult};
use crate::models::refs::IdName;
use crate::models::short::ShortBrief;
use crate::models::tag::{Tag, TagBrief, TagRefCounts};
use crate::models::work::WorkBrief;

/// Junction tables of the tag, with the column naming the tagged entity.
const JUNCTIONS: [(&str, &str); 6] = [
    ("worktag", "work_id"),
    ("storytag", "shortstory_id"),
    ("articletag", "article_id"),
    ("issuetag", "issue_id"),
    ("persontag", "person_id"),
    ("magazinetag", "magazine_id"),
];

#[derive(Clone)]
pub struct TagsRepository {
    pool: Pool<Postgres>,
}

impl TagsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> ApiResult<Vec<TagBrief>> {
        Ok(sqlx::query_as(
            "SELECT t.id, t.name, tt.name AS type_name \
             FROM tag t \
             LEFT JOIN tagtype tt ON tt.id = t.type_id \
             ORDER BY t.name",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn get(&self, id: i32) -> ApiResult<Option<Tag>> {
        #[derive(sqlx::FromRow)]
        struct TagRow {
            id: i32,
            name: String,
            type_id: Option<i32>,
            description: Option<String>,
        }

        let Some(row) = sqlx::query_as::<_, TagRow>(
            "SELECT id, name, type_id, description FROM tag WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let tag_type: Option<IdName> = match row.type_id {
            Some(type_id) => {
                sqlx::query_as("SELECT id, name FROM tagtype WHERE id = $1")
                    .bind(type_id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => None,
        };

        let works: Vec<WorkBrief> = sqlx::query_as(
            "SELECT w.id, w.title, w.orig_title, w.pubyear, w.author_str, \
                    coalesce(array_remove(array_agg(DISTINCT g.abbr), NULL), '{}') AS genres \
             FROM work w \
             JOIN worktag wt ON wt.work_id = w.id \
             LEFT JOIN workgenre wg ON wg.work_id = w.id \
             LEFT JOIN genre g ON g.id = wg.genre_id \
             WHERE wt.tag_id = $1 \
             GROUP BY w.id \
             ORDER BY w.author_str, w.title",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let stories: Vec<ShortBrief> = sqlx::query_as(
            "SELECT s.id, s.title, s.orig_title, s.pubyear, st.name AS story_type, \
                    (SELECT string_agg(p.name, ' & ') \
                     FROM storycontributor sc \
                     JOIN person p ON p.id = sc.person_id \
                     WHERE sc.shortstory_id = s.id AND sc.role_id = 1) AS author_str \
             FROM shortstory s \
             JOIN storytag stg ON stg.shortstory_id = s.id \
             LEFT JOIN storytype st ON st.id = s.story_type \
             WHERE stg.tag_id = $1 \
             ORDER BY s.title",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let people: Vec<IdName> = sqlx::query_as(
            "SELECT p.id, p.name FROM person p \
             JOIN persontag pt ON pt.person_id = p.id \
             WHERE pt.tag_id = $1 ORDER BY p.name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Tag {
            id: row.id,
            name: row.name,
            tag_type,
            description: row.description,
            works,
            stories,
            people,
        }))
    }

    pub async fn filter(&self, pattern: &str) -> ApiResult<Vec<TagBrief>> {
        Ok(sqlx::query_as(
            "SELECT t.id, t.name, tt.name AS type_name \
             FROM tag t \
             LEFT JOIN tagtype tt ON tt.id = t.type_id \
             WHERE t.name ILIKE $1 \
             ORDER BY t.name",
        )
        .bind(format!("%{pattern}%"))
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn create(&self, name: &str) -> ApiResult<i32> {
        if self.find_by_name(name).await?.is_some() {
            return Err(ApiError::BadRequest(format!(
                "Asiasana {name} on jo olemassa."
            )));
        }
        let (id,): (i32,) = sqlx::query_as("INSERT INTO tag (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    /// Renaming to a name another tag holds is refused; merge instead.
    pub async fn rename(&self, id: i32, name: &str) -> ApiResult<()> {
        if let Some(existing) = self.find_by_name(name).await? {
            if existing.id != id {
                return Err(ApiError::BadRequest(format!(
                    "Asiasana {name} on jo olemassa."
                )));
            }
        }
        let result = sqlx::query("UPDATE tag SET name = $1 WHERE id = $2")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Ei löytynyt.".into()));
        }
        Ok(())
    }

    pub async fn update(
        &self,
        id: i32,
        name: &str,
        type_id: Option<i32>,
        description: Option<&str>,
    ) -> ApiResult<()> {
        if let Some(existing) = self.find_by_name(name).await? {
            if existing.id != id {
                return Err(ApiError::BadRequest(format!(
                    "Asiasana {name} on jo olemassa."
                )));
            }
        }
        let result = sqlx::query(
            "UPDATE tag SET name = $1, type_id = $2, description = $3 WHERE id = $4",
        )
        .bind(name)
        .bind(type_id)
        .bind(description)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Ei löytynyt.".into()));
        }
        Ok(())
    }

    /// Repoint every reference from `source_id` to `target_id`, then drop
    /// the source tag. Duplicate junction rows are discarded.
    pub async fn merge(&self, target_id: i32, source_id: i32) -> ApiResult<()> {
        if target_id == source_id {
            return Err(ApiError::BadRequest(
                "Asiasanaa ei voi yhdistää itseensä.".into(),
            ));
        }
        let mut tx = self.pool.begin().await?;
        for id in [target_id, source_id] {
            let exists: Option<(i32,)> = sqlx::query_as("SELECT id FROM tag WHERE id = $1")
                .bind(id)
                .fetch_optional(tx.as_mut())
                .await?;
            if exists.is_none() {
                return Err(ApiError::NotFound("Ei löytynyt.".into()));
            }
        }
        for (table, column) in JUNCTIONS {
            let sql = format!(
                "UPDATE {table} SET tag_id = $1 \
                 WHERE tag_id = $2 \
                   AND NOT EXISTS (SELECT 1 FROM {table} t2 \
                                   WHERE t2.tag_id = $1 AND t2.{column} = {table}.{column})"
            );
            sqlx::query(&sql)
                .bind(target_id)
                .bind(source_id)
                .execute(tx.as_mut())
                .await?;
            let sql = format!("DELETE FROM {table} WHERE tag_id = $1");
            sqlx::query(&sql).bind(source_id).execute(tx.as_mut()).await?;
        }
        sqlx::query("DELETE FROM tag WHERE id = $1")
            .bind(source_id)
            .execute(tx.as_mut())
            .await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn ref_counts(&self, id: i32) -> ApiResult<TagRefCounts> {
        Ok(sqlx::query_as(
            "SELECT (SELECT count(*) FROM worktag WHERE tag_id = $1) AS works, \
                    (SELECT count(*) FROM storytag WHERE tag_id = $1) AS stories, \
                    (SELECT count(*) FROM articletag WHERE tag_id = $1) AS articles, \
                    (SELECT count(*) FROM issuetag WHERE tag_id = $1) AS issues, \
                    (SELECT count(*) FROM persontag WHERE tag_id = $1) AS people, \
                    (SELECT count(*) FROM magazinetag WHERE tag_id = $1) AS magazines",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?)
    }

    /// Deletion requires the tag to be unused everywhere.
    pub async fn delete(&self, id: i32) -> ApiResult<()> {
        let counts = self.ref_counts(id).await?;
        let blocker = if counts.works > 0 {
            Some("teosten")
        } else if counts.stories > 0 {
            Some("novellien")
        } else if counts.articles > 0 {
            Some("artikkelien")
        } else if counts.issues > 0 {
            Some("irtonumeroiden")
        } else if counts.people > 0 {
            Some("henkilöiden")
        } else if counts.magazines > 0 {
            Some("lehtien")
        } else {
            None
        };
        if let Some(entity) = blocker {
            return Err(ApiError::BadRequest(format!(
                "Asiasana on {entity} käytössä."
            )));
        }
        let result = sqlx::query("DELETE FROM tag WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("Ei löytynyt.".into()));
        }
        Ok(())
    }

    async fn find_by_name(&self, name: &str) -> ApiResult<Option<IdName>> {
        Ok(
            sqlx::query_as("SELECT id, name FROM tag WHERE lower(name) = lower($1)")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

}
