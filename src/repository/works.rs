//! Work persistence: full-schema assembly, row CRUD inside the caller's
//! transaction, genre/tag/link junctions and the contained-shorts view.

use indexmap::IndexMap;
use sqlx::{PgConnection, Pool, Postgres};

use crate::error::ApiResult;
use crate::models::refs::{Genre, IdName, Link};
use crate::models::short::ShortBrief;
use crate::models::work::{Work, WorkBrief, WorkRow};
use crate::services::contributors;

const ROW_COLUMNS: &str =
    "id, title, subtitle, orig_title, pubyear, language, bookseries_id, \
     bookseriesnum, bookseriesorder, type, description, descr_attr, misc, \
     imported_string, author_str";

const BRIEF_SELECT: &str =
    "SELECT w.id, w.title, w.orig_title, w.pubyear, w.author_str, \
            coalesce(array_remove(array_agg(DISTINCT g.abbr), NULL), '{}') AS genres \
     FROM work w \
     LEFT JOIN workgenre wg ON wg.work_id = w.id \
     LEFT JOIN genre g ON g.id = wg.genre_id";

pub async fn fetch_row(conn: &mut PgConnection, id: i32) -> ApiResult<Option<WorkRow>> {
    let sql = format!("SELECT {ROW_COLUMNS} FROM work WHERE id = $1");
    Ok(sqlx::query_as(&sql).bind(id).fetch_optional(conn).await?)
}

pub async fn insert_row(conn: &mut PgConnection, row: &WorkRow) -> ApiResult<i32> {
    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO work (title, subtitle, orig_title, pubyear, language, \
                           bookseries_id, bookseriesnum, bookseriesorder, type, \
                           description, descr_attr, misc, imported_string, author_str) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
         RETURNING id",
    )
    .bind(&row.title)
    .bind(&row.subtitle)
    .bind(&row.orig_title)
    .bind(row.pubyear)
    .bind(row.language)
    .bind(row.bookseries_id)
    .bind(&row.bookseriesnum)
    .bind(row.bookseriesorder)
    .bind(row.work_type)
    .bind(&row.description)
    .bind(&row.descr_attr)
    .bind(&row.misc)
    .bind(&row.imported_string)
    .bind(&row.author_str)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn update_row(conn: &mut PgConnection, row: &WorkRow) -> ApiResult<()> {
    sqlx::query(
        "UPDATE work SET title = $1, subtitle = $2, orig_title = $3, pubyear = $4, \
                language = $5, bookseries_id = $6, bookseriesnum = $7, \
                bookseriesorder = $8, type = $9, description = $10, \
                descr_attr = $11, misc = $12, imported_string = $13, \
                author_str = $14 \
         WHERE id = $15",
    )
    .bind(&row.title)
    .bind(&row.subtitle)
    .bind(&row.orig_title)
    .bind(row.pubyear)
    .bind(row.language)
    .bind(row.bookseries_id)
    .bind(&row.bookseriesnum)
    .bind(row.bookseriesorder)
    .bind(row.work_type)
    .bind(&row.description)
    .bind(&row.descr_attr)
    .bind(&row.misc)
    .bind(&row.imported_string)
    .bind(&row.author_str)
    .bind(row.id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Drop the work's own junction rows and the row itself. Editions must
/// already be gone; part rows disappear with them.
pub async fn delete_row(conn: &mut PgConnection, id: i32) -> ApiResult<()> {
    for sql in [
        "DELETE FROM workgenre WHERE work_id = $1",
        "DELETE FROM worktag WHERE work_id = $1",
        "DELETE FROM worklink WHERE work_id = $1",
        "DELETE FROM workcontributor WHERE work_id = $1",
        "DELETE FROM awarded WHERE work_id = $1",
        "DELETE FROM work WHERE id = $1",
    ] {
        sqlx::query(sql).bind(id).execute(&mut *conn).await?;
    }
    Ok(())
}

pub async fn edition_ids(conn: &mut PgConnection, work_id: i32) -> ApiResult<Vec<i32>> {
    let rows: Vec<(i32,)> = sqlx::query_as(
        "SELECT DISTINCT edition_id FROM part WHERE work_id = $1 ORDER BY edition_id",
    )
    .bind(work_id)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn link_to_edition(
    conn: &mut PgConnection,
    work_id: i32,
    edition_id: i32,
) -> ApiResult<()> {
    sqlx::query("INSERT INTO part (edition_id, work_id) VALUES ($1, $2)")
        .bind(edition_id)
        .bind(work_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn genre_ids(conn: &mut PgConnection, work_id: i32) -> ApiResult<Vec<i32>> {
    let rows: Vec<(i32,)> =
        sqlx::query_as("SELECT genre_id FROM workgenre WHERE work_id = $1 ORDER BY genre_id")
            .bind(work_id)
            .fetch_all(conn)
            .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn set_genres(conn: &mut PgConnection, work_id: i32, genre_ids: &[i32]) -> ApiResult<()> {
    sqlx::query("DELETE FROM workgenre WHERE work_id = $1")
        .bind(work_id)
        .execute(&mut *conn)
        .await?;
    for genre_id in genre_ids {
        sqlx::query("INSERT INTO workgenre (work_id, genre_id) VALUES ($1, $2)")
            .bind(work_id)
            .bind(genre_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub async fn tag_ids(conn: &mut PgConnection, work_id: i32) -> ApiResult<Vec<i32>> {
    let rows: Vec<(i32,)> =
        sqlx::query_as("SELECT tag_id FROM worktag WHERE work_id = $1 ORDER BY tag_id")
            .bind(work_id)
            .fetch_all(conn)
            .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn set_tags(conn: &mut PgConnection, work_id: i32, tag_ids: &[i32]) -> ApiResult<()> {
    sqlx::query("DELETE FROM worktag WHERE work_id = $1")
        .bind(work_id)
        .execute(&mut *conn)
        .await?;
    for tag_id in tag_ids {
        sqlx::query("INSERT INTO worktag (work_id, tag_id) VALUES ($1, $2)")
            .bind(work_id)
            .bind(tag_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub async fn links(conn: &mut PgConnection, work_id: i32) -> ApiResult<Vec<Link>> {
    Ok(sqlx::query_as(
        "SELECT link, description FROM worklink WHERE work_id = $1 ORDER BY id",
    )
    .bind(work_id)
    .fetch_all(conn)
    .await?)
}

pub async fn save_links(conn: &mut PgConnection, work_id: i32, links: &[Link]) -> ApiResult<()> {
    sqlx::query("DELETE FROM worklink WHERE work_id = $1")
        .bind(work_id)
        .execute(&mut *conn)
        .await?;
    for link in links {
        sqlx::query("INSERT INTO worklink (work_id, link, description) VALUES ($1, $2, $3)")
            .bind(work_id)
            .bind(&link.link)
            .bind(&link.description)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Apply an ordered contained-shorts list to every edition of the work.
pub async fn save_shorts(conn: &mut PgConnection, work_id: i32, short_ids: &[i32]) -> ApiResult<()> {
    let editions = edition_ids(&mut *conn, work_id).await?;
    for edition_id in editions {
        super::editions::save_shorts(&mut *conn, edition_id, short_ids).await?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct WorksRepository {
    pool: Pool<Postgres>,
}

impl WorksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i32) -> ApiResult<Option<Work>> {
        let mut conn = self.pool.acquire().await?;
        let Some(row) = fetch_row(conn.as_mut(), id).await? else {
            return Ok(None);
        };
        let contributions = contributors::work_contributions(conn.as_mut(), id).await?;
        let links = links(conn.as_mut(), id).await?;
        drop(conn);

        let language_name = self.id_name("language", row.language).await?;
        let bookseries = self.id_name("bookseries", row.bookseries_id).await?;
        let work_type = self.id_name("worktype", row.work_type).await?;

        let genres: Vec<Genre> = sqlx::query_as(
            "SELECT g.id, g.name, g.abbr FROM genre g \
             JOIN workgenre wg ON wg.genre_id = g.id \
             WHERE wg.work_id = $1 ORDER BY g.id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let tags: Vec<IdName> = sqlx::query_as(
            "SELECT t.id, t.name FROM tag t \
             JOIN worktag wt ON wt.tag_id = t.id \
             WHERE wt.work_id = $1 ORDER BY t.name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let mut editions = Vec::new();
        let mut conn = self.pool.acquire().await?;
        let edition_id_list = edition_ids(conn.as_mut(), id).await?;
        drop(conn);
        for edition_id in edition_id_list {
            if let Some(edition) = super::editions::load_full(&self.pool, edition_id).await? {
                editions.push(edition);
            }
        }

        let stories = self.contained_shorts(id).await?;
        let awards = super::awards::awards_for_work(&self.pool, id).await?;

        Ok(Some(Work {
            id: row.id,
            title: row.title,
            subtitle: row.subtitle,
            orig_title: row.orig_title,
            pubyear: row.pubyear,
            language_name,
            bookseries,
            bookseriesnum: row.bookseriesnum,
            bookseriesorder: row.bookseriesorder,
            work_type,
            description: row.description,
            descr_attr: row.descr_attr,
            misc: row.misc,
            author_str: row.author_str,
            contributions,
            genres,
            tags,
            links,
            editions,
            stories,
            awards,
        }))
    }

    async fn id_name(&self, table: &str, id: Option<i32>) -> ApiResult<Option<IdName>> {
        let Some(id) = id else {
            return Ok(None);
        };
        let sql = format!("SELECT id, name FROM {table} WHERE id = $1");
        Ok(sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    /// Distinct shorts across the work's editions in reading order.
    pub async fn contained_shorts(&self, work_id: i32) -> ApiResult<Vec<ShortBrief>> {
        Ok(sqlx::query_as(
            "SELECT s.id, s.title, s.orig_title, s.pubyear, st.name AS story_type, \
                    (SELECT string_agg(p.name, ' & ') \
                     FROM storycontributor sc \
                     JOIN person p ON p.id = sc.person_id \
                     WHERE sc.shortstory_id = s.id AND sc.role_id = 1) AS author_str \
             FROM shortstory s \
             LEFT JOIN storytype st ON st.id = s.story_type \
             JOIN editionshortstory ess ON ess.shortstory_id = s.id \
             JOIN part pt ON pt.edition_id = ess.edition_id \
             WHERE pt.work_id = $1 \
             GROUP BY s.id, s.title, s.orig_title, s.pubyear, st.name \
             ORDER BY min(ess.order_num)",
        )
        .bind(work_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Works whose author string starts with the given letter.
    pub async fn by_initial(&self, letter: &str) -> ApiResult<Vec<WorkBrief>> {
        let sql = format!(
            "{BRIEF_SELECT} WHERE w.author_str ILIKE $1 \
             GROUP BY w.id ORDER BY w.author_str, w.title"
        );
        Ok(sqlx::query_as(&sql)
            .bind(format!("{letter}%"))
            .fetch_all(&self.pool)
            .await?)
    }

    /// Counts of works per first letter of the author string.
    pub async fn first_letters(&self) -> ApiResult<IndexMap<String, i64>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT upper(substr(author_str, 1, 1)) AS letter, count(*) AS count \
             FROM work WHERE author_str IS NOT NULL AND author_str <> '' \
             GROUP BY letter ORDER BY letter",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn latest(&self, count: i64) -> ApiResult<Vec<WorkBrief>> {
        let sql = format!("{BRIEF_SELECT} GROUP BY w.id ORDER BY w.id DESC LIMIT $1");
        Ok(sqlx::query_as(&sql).bind(count).fetch_all(&self.pool).await?)
    }

    pub async fn filter(&self, pattern: &str) -> ApiResult<Vec<WorkBrief>> {
        let sql = format!(
            "{BRIEF_SELECT} WHERE w.title ILIKE $1 \
             GROUP BY w.id ORDER BY w.title"
        );
        Ok(sqlx::query_as(&sql)
            .bind(format!("{pattern}%"))
            .fetch_all(&self.pool)
            .await?)
    }

    /// Structured book search with author/title/year/genre/nationality
    /// constraints; all are optional and ANDed together.
    pub async fn search(&self, params: &WorkSearchParams) -> ApiResult<Vec<WorkBrief>> {
        let mut sql = format!("{BRIEF_SELECT} WHERE 1 = 1");
        let mut binds: Vec<String> = Vec::new();

        if let Some(author) = &params.author {
            binds.push(format!("{author}%"));
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM workcontributor wc \
                   JOIN person p ON p.id = wc.person_id \
                   WHERE wc.work_id = w.id AND wc.role_id = 1 \
                     AND (p.name ILIKE ${n} OR p.alt_name ILIKE ${n}))",
                n = binds.len()
            ));
        }
        if let Some(title) = &params.title {
            binds.push(format!("%{title}%"));
            sql.push_str(&format!(" AND w.title ILIKE ${}", binds.len()));
        }
        if let Some(orig_title) = &params.orig_title {
            binds.push(format!("%{orig_title}%"));
            sql.push_str(&format!(" AND w.orig_title ILIKE ${}", binds.len()));
        }
        if let Some(year) = params.printyear_first {
            binds.push(year.to_string());
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM part pt JOIN edition e ON e.id = pt.edition_id \
                   WHERE pt.work_id = w.id AND e.pubyear >= ${}::int)",
                binds.len()
            ));
        }
        if let Some(year) = params.printyear_last {
            binds.push(year.to_string());
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM part pt JOIN edition e ON e.id = pt.edition_id \
                   WHERE pt.work_id = w.id AND e.pubyear <= ${}::int)",
                binds.len()
            ));
        }
        if let Some(genre) = params.genre {
            binds.push(genre.to_string());
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM workgenre wg2 \
                   WHERE wg2.work_id = w.id AND wg2.genre_id = ${}::int)",
                binds.len()
            ));
        }
        if let Some(nationality) = params.nationality {
            binds.push(nationality.to_string());
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM workcontributor wc2 \
                   JOIN person p2 ON p2.id = wc2.person_id \
                   WHERE wc2.work_id = w.id AND wc2.role_id = 1 \
                     AND p2.nationality_id = ${}::int)",
                binds.len()
            ));
        }
        if let Some(work_type) = params.work_type {
            binds.push(work_type.to_string());
            sql.push_str(&format!(" AND w.type = ${}::int", binds.len()));
        }

        sql.push_str(" GROUP BY w.id ORDER BY w.author_str, w.title");

        let mut query = sqlx::query_as::<_, WorkBrief>(&sql);
        for bind in &binds {
            query = query.bind(bind);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

}

/// Parameters of the structured book search.
#[derive(Debug, Default, Clone)]
pub struct WorkSearchParams {
    pub author: Option<String>,
    pub title: Option<String>,
    pub orig_title: Option<String>,
    pub printyear_first: Option<i32>,
    pub printyear_last: Option<i32>,
    pub genre: Option<i32>,
    pub nationality: Option<i32>,
    pub work_type: Option<i32>,
}
