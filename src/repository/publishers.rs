//! Publisher, book series and publication series persistence.

use sqlx::{PgConnection, Pool, Postgres};

use crate::error::{ApiError, ApiResult};
use crate::models::edition::EditionBrief;
use crate::models::publisher::{
    Bookseries, BookseriesBrief, Publisher, PublisherBrief, Pubseries, PubseriesBrief,
};
use crate::models::refs::IdName;
use crate::models::work::WorkBrief;

use super::editions::BRIEF_SELECT as EDITION_BRIEF;

#[derive(sqlx::FromRow)]
pub struct PublisherRow {
    pub id: i32,
    pub name: String,
    pub fullname: Option<String>,
    pub description: Option<String>,
    pub image_src: Option<String>,
    pub image_attr: Option<String>,
}

pub async fn fetch_publisher_row(
    conn: &mut PgConnection,
    id: i32,
) -> ApiResult<Option<PublisherRow>> {
    Ok(sqlx::query_as(
        "SELECT id, name, fullname, description, image_src, image_attr \
         FROM publisher WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?)
}

pub async fn insert_publisher_row(conn: &mut PgConnection, row: &PublisherRow) -> ApiResult<i32> {
    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO publisher (name, fullname, description, image_src, image_attr) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(&row.name)
    .bind(&row.fullname)
    .bind(&row.description)
    .bind(&row.image_src)
    .bind(&row.image_attr)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn update_publisher_row(conn: &mut PgConnection, row: &PublisherRow) -> ApiResult<()> {
    sqlx::query(
        "UPDATE publisher SET name = $1, fullname = $2, description = $3, \
                image_src = $4, image_attr = $5 \
         WHERE id = $6",
    )
    .bind(&row.name)
    .bind(&row.fullname)
    .bind(&row.description)
    .bind(&row.image_src)
    .bind(&row.image_attr)
    .bind(row.id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn publisher_name_in_use(
    conn: &mut PgConnection,
    name: &str,
    fullname: Option<&str>,
    exclude_id: i32,
) -> ApiResult<bool> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT count(*) FROM publisher \
         WHERE (name = $1 OR ($2::text IS NOT NULL AND fullname = $2)) AND id <> $3",
    )
    .bind(name)
    .bind(fullname)
    .bind(exclude_id)
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}

/// Deletion is refused while editions still reference the publisher.
/// Publication series go with the publisher; magazines are detached.
pub async fn delete_publisher_cascade(conn: &mut PgConnection, id: i32) -> ApiResult<()> {
    let (edition_count,): (i64,) =
        sqlx::query_as("SELECT count(*) FROM edition WHERE publisher_id = $1")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
    if edition_count > 0 {
        return Err(ApiError::BadRequest("Kustantajalla on painoksia.".into()));
    }
    sqlx::query("UPDATE edition SET pubseries_id = NULL \
                 WHERE pubseries_id IN (SELECT id FROM pubseries WHERE publisher_id = $1)")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM pubseries WHERE publisher_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("UPDATE magazine SET publisher_id = NULL WHERE publisher_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    let result = sqlx::query("DELETE FROM publisher WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Ei löytynyt.".into()));
    }
    Ok(())
}

#[derive(sqlx::FromRow)]
pub struct BookseriesRow {
    pub id: i32,
    pub name: String,
    pub orig_name: Option<String>,
    pub image_src: Option<String>,
    pub image_attr: Option<String>,
    pub important: bool,
}

pub async fn fetch_bookseries_row(
    conn: &mut PgConnection,
    id: i32,
) -> ApiResult<Option<BookseriesRow>> {
    Ok(sqlx::query_as(
        "SELECT id, name, orig_name, image_src, image_attr, important \
         FROM bookseries WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?)
}

pub async fn insert_bookseries_row(conn: &mut PgConnection, row: &BookseriesRow) -> ApiResult<i32> {
    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO bookseries (name, orig_name, image_src, image_attr, important) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(&row.name)
    .bind(&row.orig_name)
    .bind(&row.image_src)
    .bind(&row.image_attr)
    .bind(row.important)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn update_bookseries_row(conn: &mut PgConnection, row: &BookseriesRow) -> ApiResult<()> {
    sqlx::query(
        "UPDATE bookseries SET name = $1, orig_name = $2, image_src = $3, \
                image_attr = $4, important = $5 \
         WHERE id = $6",
    )
    .bind(&row.name)
    .bind(&row.orig_name)
    .bind(&row.image_src)
    .bind(&row.image_attr)
    .bind(row.important)
    .bind(row.id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn bookseries_name_in_use(
    conn: &mut PgConnection,
    name: &str,
    exclude_id: i32,
) -> ApiResult<bool> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT count(*) FROM bookseries WHERE name = $1 AND id <> $2")
            .bind(name)
            .bind(exclude_id)
            .fetch_one(conn)
            .await?;
    Ok(count > 0)
}

/// Refused while works still belong to the series.
pub async fn delete_bookseries_row(conn: &mut PgConnection, id: i32) -> ApiResult<()> {
    let (work_count,): (i64,) =
        sqlx::query_as("SELECT count(*) FROM work WHERE bookseries_id = $1")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
    if work_count > 0 {
        return Err(ApiError::BadRequest("Kirjasarjalla on teoksia.".into()));
    }
    let result = sqlx::query("DELETE FROM bookseries WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Ei löytynyt.".into()));
    }
    Ok(())
}

#[derive(sqlx::FromRow)]
pub struct PubseriesRow {
    pub id: i32,
    pub name: String,
    pub publisher_id: Option<i32>,
    pub important: bool,
    pub image_src: Option<String>,
    pub image_attr: Option<String>,
}

pub async fn fetch_pubseries_row(
    conn: &mut PgConnection,
    id: i32,
) -> ApiResult<Option<PubseriesRow>> {
    Ok(sqlx::query_as(
        "SELECT id, name, publisher_id, important, image_src, image_attr \
         FROM pubseries WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?)
}

pub async fn insert_pubseries_row(conn: &mut PgConnection, row: &PubseriesRow) -> ApiResult<i32> {
    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO pubseries (name, publisher_id, important, image_src, image_attr) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(&row.name)
    .bind(row.publisher_id)
    .bind(row.important)
    .bind(&row.image_src)
    .bind(&row.image_attr)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn update_pubseries_row(conn: &mut PgConnection, row: &PubseriesRow) -> ApiResult<()> {
    sqlx::query(
        "UPDATE pubseries SET name = $1, publisher_id = $2, important = $3, \
                image_src = $4, image_attr = $5 \
         WHERE id = $6",
    )
    .bind(&row.name)
    .bind(row.publisher_id)
    .bind(row.important)
    .bind(&row.image_src)
    .bind(&row.image_attr)
    .bind(row.id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn pubseries_name_in_use(
    conn: &mut PgConnection,
    name: &str,
    exclude_id: i32,
) -> ApiResult<bool> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT count(*) FROM pubseries WHERE name = $1 AND id <> $2")
            .bind(name)
            .bind(exclude_id)
            .fetch_one(conn)
            .await?;
    Ok(count > 0)
}

/// Editions keep their rows but lose the series reference.
pub async fn delete_pubseries_row(conn: &mut PgConnection, id: i32) -> ApiResult<()> {
    sqlx::query("UPDATE edition SET pubseries_id = NULL, pubseriesnum = NULL \
                 WHERE pubseries_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    let result = sqlx::query("DELETE FROM pubseries WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Ei löytynyt.".into()));
    }
    Ok(())
}

#[derive(Clone)]
pub struct PublishersRepository {
    pool: Pool<Postgres>,
}

impl PublishersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> ApiResult<Vec<PublisherBrief>> {
        Ok(
            sqlx::query_as("SELECT id, name, fullname FROM publisher ORDER BY name")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    pub async fn get(&self, id: i32) -> ApiResult<Option<Publisher>> {
        let mut conn = self.pool.acquire().await?;
        let Some(row) = fetch_publisher_row(conn.as_mut(), id).await? else {
            return Ok(None);
        };
        drop(conn);

        let sql = format!("{EDITION_BRIEF} WHERE e.publisher_id = $1 ORDER BY e.pubyear");
        let editions: Vec<EditionBrief> =
            sqlx::query_as(&sql).bind(id).fetch_all(&self.pool).await?;

        let series: Vec<IdName> = sqlx::query_as(
            "SELECT id, name FROM pubseries WHERE publisher_id = $1 ORDER BY name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Publisher {
            id: row.id,
            name: row.name,
            fullname: row.fullname,
            description: row.description,
            image_src: row.image_src,
            image_attr: row.image_attr,
            editions,
            series,
        }))
    }

    pub async fn filter(&self, pattern: &str) -> ApiResult<Vec<PublisherBrief>> {
        Ok(sqlx::query_as(
            "SELECT id, name, fullname FROM publisher \
             WHERE name ILIKE $1 OR fullname ILIKE $1 \
             ORDER BY name",
        )
        .bind(format!("{pattern}%"))
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn list_bookseries(&self) -> ApiResult<Vec<BookseriesBrief>> {
        Ok(sqlx::query_as(
            "SELECT id, name, orig_name, important FROM bookseries ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn get_bookseries(&self, id: i32) -> ApiResult<Option<Bookseries>> {
        let mut conn = self.pool.acquire().await?;
        let Some(row) = fetch_bookseries_row(conn.as_mut(), id).await? else {
            return Ok(None);
        };
        drop(conn);

        let works: Vec<WorkBrief> = sqlx::query_as(
            "SELECT w.id, w.title, w.orig_title, w.pubyear, w.author_str, \
                    coalesce(array_remove(array_agg(DISTINCT g.abbr), NULL), '{}') AS genres \
             FROM work w \
             LEFT JOIN workgenre wg ON wg.work_id = w.id \
             LEFT JOIN genre g ON g.id = wg.genre_id \
             WHERE w.bookseries_id = $1 \
             GROUP BY w.id \
             ORDER BY w.bookseriesorder, w.pubyear",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Bookseries {
            id: row.id,
            name: row.name,
            orig_name: row.orig_name,
            important: row.important,
            image_src: row.image_src,
            image_attr: row.image_attr,
            works,
        }))
    }

    pub async fn filter_bookseries(&self, pattern: &str) -> ApiResult<Vec<BookseriesBrief>> {
        Ok(sqlx::query_as(
            "SELECT id, name, orig_name, important FROM bookseries \
             WHERE name ILIKE $1 ORDER BY name",
        )
        .bind(format!("{pattern}%"))
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn list_pubseries(&self) -> ApiResult<Vec<PubseriesBrief>> {
        Ok(sqlx::query_as(
            "SELECT ps.id, ps.name, ps.important, p.name AS publisher_name \
             FROM pubseries ps \
             LEFT JOIN publisher p ON p.id = ps.publisher_id \
             ORDER BY ps.name",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn get_pubseries(&self, id: i32) -> ApiResult<Option<Pubseries>> {
        let mut conn = self.pool.acquire().await?;
        let Some(row) = fetch_pubseries_row(conn.as_mut(), id).await? else {
            return Ok(None);
        };
        drop(conn);

        let publisher: Option<IdName> = match row.publisher_id {
            Some(publisher_id) => {
                sqlx::query_as("SELECT id, name FROM publisher WHERE id = $1")
                    .bind(publisher_id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => None,
        };

        let sql = format!("{EDITION_BRIEF} WHERE e.pubseries_id = $1 ORDER BY e.pubseriesnum, e.pubyear");
        let editions: Vec<EditionBrief> =
            sqlx::query_as(&sql).bind(id).fetch_all(&self.pool).await?;

        Ok(Some(Pubseries {
            id: row.id,
            name: row.name,
            important: row.important,
            image_src: row.image_src,
            image_attr: row.image_attr,
            publisher,
            editions,
        }))
    }

    pub async fn filter_pubseries(&self, pattern: &str) -> ApiResult<Vec<PubseriesBrief>> {
        Ok(sqlx::query_as(
            "SELECT ps.id, ps.name, ps.important, p.name AS publisher_name \
             FROM pubseries ps \
             LEFT JOIN publisher p ON p.id = ps.publisher_id \
             WHERE ps.name ILIKE $1 \
             ORDER BY ps.name",
        )
        .bind(format!("{pattern}%"))
        .fetch_all(&self.pool)
        .await?)
    }

}
