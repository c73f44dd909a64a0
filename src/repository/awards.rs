//! Award persistence. Awarded rows point at exactly one of person, work
//! or short story.

use sqlx::{FromRow, PgPool, Pool, Postgres};

use crate::error::ApiResult;
use crate::models::award::{Award, AwardCategory, AwardTarget, Awarded};
use crate::models::refs::IdName;

#[derive(FromRow)]
struct AwardedRow {
    id: i32,
    award_id: i32,
    award_name: String,
    category_id: i32,
    category_name: String,
    year: Option<i32>,
    person_id: Option<i32>,
    person_name: Option<String>,
    work_id: Option<i32>,
    work_title: Option<String>,
    story_id: Option<i32>,
    story_title: Option<String>,
}

const AWARDED_SELECT: &str = "SELECT ad.id, ad.award_id, a.name AS award_name, \
            ad.category_id, ac.name AS category_name, ad.year, \
            ad.person_id, p.name AS person_name, \
            ad.work_id, w.title AS work_title, \
            ad.story_id, s.title AS story_title \
     FROM awarded ad \
     JOIN award a ON a.id = ad.award_id \
     JOIN awardcategory ac ON ac.id = ad.category_id \
     LEFT JOIN person p ON p.id = ad.person_id \
     LEFT JOIN work w ON w.id = ad.work_id \
     LEFT JOIN shortstory s ON s.id = ad.story_id";

impl AwardedRow {
    fn into_awarded(self) -> Awarded {
        let target = if let Some(id) = self.person_id {
            AwardTarget::Person(IdName {
                id,
                name: self.person_name.unwrap_or_default(),
            })
        } else if let Some(id) = self.work_id {
            AwardTarget::Work(IdName {
                id,
                name: self.work_title.unwrap_or_default(),
            })
        } else {
            AwardTarget::Story(IdName {
                id: self.story_id.unwrap_or_default(),
                name: self.story_title.unwrap_or_default(),
            })
        };
        Awarded {
            id: self.id,
            award: IdName {
                id: self.award_id,
                name: self.award_name,
            },
            category: IdName {
                id: self.category_id,
                name: self.category_name,
            },
            year: self.year,
            target,
        }
    }
}

async fn awarded_where(pool: &PgPool, column: &str, id: i32) -> ApiResult<Vec<Awarded>> {
    let sql = format!("{AWARDED_SELECT} WHERE ad.{column} = $1 ORDER BY ad.year, a.name");
    let rows: Vec<AwardedRow> = sqlx::query_as(&sql).bind(id).fetch_all(pool).await?;
    Ok(rows.into_iter().map(AwardedRow::into_awarded).collect())
}

pub async fn awards_for_work(pool: &PgPool, work_id: i32) -> ApiResult<Vec<Awarded>> {
    awarded_where(pool, "work_id", work_id).await
}

pub async fn awards_for_person(pool: &PgPool, person_id: i32) -> ApiResult<Vec<Awarded>> {
    awarded_where(pool, "person_id", person_id).await
}

pub async fn awards_for_story(pool: &PgPool, story_id: i32) -> ApiResult<Vec<Awarded>> {
    awarded_where(pool, "story_id", story_id).await
}

#[derive(Clone)]
pub struct AwardsRepository {
    pool: Pool<Postgres>,
}

impl AwardsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> ApiResult<Vec<Award>> {
        Ok(sqlx::query_as(
            "SELECT id, name, description, domestic FROM award ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn get(&self, id: i32) -> ApiResult<Option<Award>> {
        Ok(sqlx::query_as(
            "SELECT id, name, description, domestic FROM award WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn winners(&self, award_id: i32) -> ApiResult<Vec<Awarded>> {
        awarded_where(&self.pool, "award_id", award_id).await
    }

    /// Categories applicable to people (type 0), works (1) or short
    /// stories (2).
    pub async fn person_categories(&self) -> ApiResult<Vec<AwardCategory>> {
        self.categories_of_type(0).await
    }

    pub async fn work_categories(&self) -> ApiResult<Vec<AwardCategory>> {
        self.categories_of_type(1).await
    }

    pub async fn story_categories(&self) -> ApiResult<Vec<AwardCategory>> {
        self.categories_of_type(2).await
    }

    async fn categories_of_type(&self, category_type: i32) -> ApiResult<Vec<AwardCategory>> {
        Ok(sqlx::query_as(
            "SELECT id, name, type FROM awardcategory \
             WHERE type = $1 ORDER BY name",
        )
        .bind(category_type)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn for_person(&self, person_id: i32) -> ApiResult<Vec<Awarded>> {
        awards_for_person(&self.pool, person_id).await
    }

    pub async fn for_work(&self, work_id: i32) -> ApiResult<Vec<Awarded>> {
        awards_for_work(&self.pool, work_id).await
    }

    pub async fn for_story(&self, story_id: i32) -> ApiResult<Vec<Awarded>> {
        awards_for_story(&self.pool, story_id).await
    }
}
