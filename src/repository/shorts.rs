//! Short story persistence.

use sqlx::{PgConnection, Pool, Postgres};

use crate::error::ApiResult;
use crate::models::edition::EditionBrief;
use crate::models::magazine::IssueBrief;
use crate::models::refs::IdName;
use crate::models::short::{Short, ShortBrief, ShortRow};
use crate::services::contributors;

const ROW_COLUMNS: &str = "id, title, orig_title, language, pubyear, story_type";

pub async fn fetch_row(conn: &mut PgConnection, id: i32) -> ApiResult<Option<ShortRow>> {
    let sql = format!("SELECT {ROW_COLUMNS} FROM shortstory WHERE id = $1");
    Ok(sqlx::query_as(&sql).bind(id).fetch_optional(conn).await?)
}

pub async fn insert_row(conn: &mut PgConnection, row: &ShortRow) -> ApiResult<i32> {
    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO shortstory (title, orig_title, language, pubyear, story_type) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(&row.title)
    .bind(&row.orig_title)
    .bind(row.language)
    .bind(row.pubyear)
    .bind(row.story_type)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn update_row(conn: &mut PgConnection, row: &ShortRow) -> ApiResult<()> {
    sqlx::query(
        "UPDATE shortstory SET title = $1, orig_title = $2, language = $3, \
                pubyear = $4, story_type = $5 \
         WHERE id = $6",
    )
    .bind(&row.title)
    .bind(&row.orig_title)
    .bind(row.language)
    .bind(row.pubyear)
    .bind(row.story_type)
    .bind(row.id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Remove the story from every container, then its own rows.
pub async fn delete_cascade(conn: &mut PgConnection, id: i32) -> ApiResult<()> {
    for sql in [
        "DELETE FROM storycontributor WHERE shortstory_id = $1",
        "DELETE FROM editionshortstory WHERE shortstory_id = $1",
        "DELETE FROM issueshortstory WHERE shortstory_id = $1",
        "DELETE FROM storytag WHERE shortstory_id = $1",
        "DELETE FROM awarded WHERE story_id = $1",
        "DELETE FROM shortstory WHERE id = $1",
    ] {
        sqlx::query(sql).bind(id).execute(&mut *conn).await?;
    }
    Ok(())
}

pub async fn tag_ids(conn: &mut PgConnection, short_id: i32) -> ApiResult<Vec<i32>> {
    let rows: Vec<(i32,)> =
        sqlx::query_as("SELECT tag_id FROM storytag WHERE shortstory_id = $1 ORDER BY tag_id")
            .bind(short_id)
            .fetch_all(conn)
            .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn set_tags(conn: &mut PgConnection, short_id: i32, tag_ids: &[i32]) -> ApiResult<()> {
    sqlx::query("DELETE FROM storytag WHERE shortstory_id = $1")
        .bind(short_id)
        .execute(&mut *conn)
        .await?;
    for tag_id in tag_ids {
        sqlx::query("INSERT INTO storytag (shortstory_id, tag_id) VALUES ($1, $2)")
            .bind(short_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct ShortsRepository {
    pool: Pool<Postgres>,
}

impl ShortsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i32) -> ApiResult<Option<Short>> {
        let mut conn = self.pool.acquire().await?;
        let Some(row) = fetch_row(conn.as_mut(), id).await? else {
            return Ok(None);
        };
        let contributors = contributors::short_contributions(conn.as_mut(), id).await?;
        drop(conn);

        let language_name: Option<IdName> = match row.language {
            Some(lang) => {
                sqlx::query_as("SELECT id, name FROM language WHERE id = $1")
                    .bind(lang)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => None,
        };
        let story_type: Option<IdName> = match row.story_type {
            Some(st) => {
                sqlx::query_as("SELECT id, name FROM storytype WHERE id = $1")
                    .bind(st)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => None,
        };

        let tags: Vec<IdName> = sqlx::query_as(
            "SELECT t.id, t.name FROM tag t \
             JOIN storytag st ON st.tag_id = t.id \
             WHERE st.shortstory_id = $1 ORDER BY t.name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let editions: Vec<EditionBrief> = sqlx::query_as(
            "SELECT e.id, e.title, e.pubyear, e.editionnum, e.version, \
                    pub.name AS publisher_name, \
                    (SELECT ei.image_src FROM editionimage ei \
                     WHERE ei.edition_id = e.id ORDER BY ei.id LIMIT 1) AS image_src, \
                    pt.work_id, w.author_str \
             FROM edition e \
             JOIN editionshortstory ess ON ess.edition_id = e.id \
             LEFT JOIN publisher pub ON pub.id = e.publisher_id \
             LEFT JOIN part pt ON pt.edition_id = e.id \
             LEFT JOIN work w ON w.id = pt.work_id \
             WHERE ess.shortstory_id = $1 \
             ORDER BY e.pubyear",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let issues: Vec<IssueBrief> = sqlx::query_as(
            "SELECT i.id, i.magazine_id, i.year, i.number, i.number_extra, i.count, \
                    m.name AS magazine_name, \
                    concat(i.number, coalesce(i.number_extra, ''), '/', i.year) \
                        AS cover_number \
             FROM issue i \
             JOIN magazine m ON m.id = i.magazine_id \
             JOIN issueshortstory iss ON iss.issue_id = i.id \
             WHERE iss.shortstory_id = $1 \
             ORDER BY i.year, i.number",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Short {
            id: row.id,
            title: row.title,
            orig_title: row.orig_title,
            language_name,
            pubyear: row.pubyear,
            story_type,
            contributors,
            tags,
            editions,
            issues,
        }))
    }

    pub async fn latest(&self, count: i64) -> ApiResult<Vec<ShortBrief>> {
        Ok(sqlx::query_as(
            "SELECT s.id, s.title, s.orig_title, s.pubyear, st.name AS story_type, \
                    (SELECT string_agg(p.name, ' & ') \
                     FROM storycontributor sc \
                     JOIN person p ON p.id = sc.person_id \
                     WHERE sc.shortstory_id = s.id AND sc.role_id = 1) AS author_str \
             FROM shortstory s \
             LEFT JOIN storytype st ON st.id = s.story_type \
             ORDER BY s.id DESC LIMIT $1",
        )
        .bind(count)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Structured search: author, title, original title, year range and
    /// type, ANDed together.
    pub async fn search(&self, params: &ShortSearchParams) -> ApiResult<Vec<ShortBrief>> {
        let mut sql = String::from(
            "SELECT s.id, s.title, s.orig_title, s.pubyear, st.name AS story_type, \
                    (SELECT string_agg(p.name, ' & ') \
                     FROM storycontributor sca \
                     JOIN person p ON p.id = sca.person_id \
                     WHERE sca.shortstory_id = s.id AND sca.role_id = 1) AS author_str \
             FROM shortstory s \
             LEFT JOIN storytype st ON st.id = s.story_type \
             WHERE 1 = 1",
        );
        let mut binds: Vec<String> = Vec::new();

        if let Some(author) = &params.author {
            binds.push(format!("%{author}%"));
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM storycontributor sc \
                   JOIN person p2 ON p2.id = sc.person_id \
                   WHERE sc.shortstory_id = s.id \
                     AND (p2.name ILIKE ${n} OR p2.alt_name ILIKE ${n}))",
                n = binds.len()
            ));
        }
        if let Some(title) = &params.title {
            binds.push(format!("%{title}%"));
            sql.push_str(&format!(" AND s.title ILIKE ${}", binds.len()));
        }
        if let Some(orig_title) = &params.orig_title {
            binds.push(format!("%{orig_title}%"));
            sql.push_str(&format!(" AND s.orig_title ILIKE ${}", binds.len()));
        }
        if let Some(year) = params.pubyear_first {
            binds.push(year.to_string());
            sql.push_str(&format!(" AND s.pubyear >= ${}::int", binds.len()));
        }
        if let Some(year) = params.pubyear_last {
            binds.push(year.to_string());
            sql.push_str(&format!(" AND s.pubyear <= ${}::int", binds.len()));
        }
        if let Some(story_type) = params.story_type {
            binds.push(story_type.to_string());
            sql.push_str(&format!(" AND s.story_type = ${}::int", binds.len()));
        }

        sql.push_str(" ORDER BY s.title");

        let mut query = sqlx::query_as::<_, ShortBrief>(&sql);
        for bind in &binds {
            query = query.bind(bind);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

}

/// Parameters of the structured short story search.
#[derive(Debug, Default, Clone)]
pub struct ShortSearchParams {
    pub author: Option<String>,
    pub title: Option<String>,
    pub orig_title: Option<String>,
    pub pubyear_first: Option<i32>,
    pub pubyear_last: Option<i32>,
    pub story_type: Option<i32>,
}
