//! Edition persistence: full-schema assembly, row CRUD inside the
//! caller's transaction, contained shorts, images, owners and wishlist.

use sqlx::{PgConnection, PgPool, Pool, Postgres};

use crate::error::ApiResult;
use crate::models::contributor::Contribution;
use crate::models::edition::{Edition, EditionBrief, EditionImage, EditionRow, UserBook, WishlistEntry};
use crate::models::refs::{role, IdName};
use crate::models::short::ShortBrief;
use crate::services::contributors;

const ROW_COLUMNS: &str =
    "id, title, subtitle, pubyear, publisher_id, editionnum, version, isbn, \
     printedin, pubseries_id, pubseriesnum, coll_info, pages, binding_id, \
     format_id, size, dustcover, coverimage, misc, imported_string, verified";

/// Brief list entry with the work's author string and the first cover.
pub(crate) const BRIEF_SELECT: &str =
    "SELECT e.id, e.title, e.pubyear, e.editionnum, e.version, \
            pub.name AS publisher_name, \
            (SELECT ei.image_src FROM editionimage ei \
             WHERE ei.edition_id = e.id ORDER BY ei.id LIMIT 1) AS image_src, \
            pt.work_id, w.author_str \
     FROM edition e \
     LEFT JOIN publisher pub ON pub.id = e.publisher_id \
     LEFT JOIN part pt ON pt.edition_id = e.id \
     LEFT JOIN work w ON w.id = pt.work_id";

async fn id_name(pool: &PgPool, table: &str, id: Option<i32>) -> ApiResult<Option<IdName>> {
    let Some(id) = id else {
        return Ok(None);
    };
    let sql = format!("SELECT id, name FROM {table} WHERE id = $1");
    Ok(sqlx::query_as(&sql).bind(id).fetch_optional(pool).await?)
}

fn persons_with_role(contributions: &[Contribution], role_id: i32) -> Vec<IdName> {
    let mut seen = Vec::new();
    let mut out = Vec::new();
    for c in contributions.iter().filter(|c| c.role.id == role_id) {
        if !seen.contains(&c.person.id) {
            seen.push(c.person.id);
            out.push(IdName {
                id: c.person.id,
                name: c.person.name.clone().unwrap_or_default(),
            });
        }
    }
    out
}

/// Assemble the full edition schema.
pub async fn load_full(pool: &PgPool, id: i32) -> ApiResult<Option<Edition>> {
    let sql = format!("SELECT {ROW_COLUMNS} FROM edition WHERE id = $1");
    let Some(row) = sqlx::query_as::<_, EditionRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
    else {
        return Ok(None);
    };

    let publisher = id_name(pool, "publisher", row.publisher_id).await?;
    let pubseries = id_name(pool, "pubseries", row.pubseries_id).await?;
    let binding = id_name(pool, "bindingtype", row.binding_id).await?;
    let format = id_name(pool, "format", row.format_id).await?;

    let mut conn = pool.acquire().await?;
    let contributions = contributors::edition_contributions(conn.as_mut(), id).await?;
    drop(conn);

    let images: Vec<EditionImage> = sqlx::query_as(
        "SELECT id, edition_id, image_src, image_attr FROM editionimage \
         WHERE edition_id = $1 ORDER BY id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let stories = contained_shorts(pool, id).await?;

    let work_id: Option<(i32,)> =
        sqlx::query_as("SELECT work_id FROM part WHERE edition_id = $1 LIMIT 1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(Some(Edition {
        id: row.id,
        title: row.title,
        subtitle: row.subtitle,
        pubyear: row.pubyear,
        publisher,
        editionnum: row.editionnum,
        version: row.version,
        isbn: row.isbn,
        printedin: row.printedin,
        pubseries,
        pubseriesnum: row.pubseriesnum,
        coll_info: row.coll_info,
        pages: row.pages,
        binding,
        format,
        size: row.size,
        dustcover: row.dustcover,
        coverimage: row.coverimage,
        misc: row.misc,
        imported_string: row.imported_string,
        verified: row.verified,
        work_id: work_id.map(|(w,)| w),
        editors: persons_with_role(&contributions, role::EDITOR),
        translators: persons_with_role(&contributions, role::TRANSLATOR),
        cover_artists: persons_with_role(&contributions, role::COVER_ARTIST),
        illustrators: persons_with_role(&contributions, role::ILLUSTRATOR),
        chief_editors: persons_with_role(&contributions, role::EDITOR_IN_CHIEF),
        contributions,
        images,
        stories,
    }))
}

/// Shorts contained in the edition in reading order.
pub async fn contained_shorts(pool: &PgPool, edition_id: i32) -> ApiResult<Vec<ShortBrief>> {
    Ok(sqlx::query_as(
        "SELECT s.id, s.title, s.orig_title, s.pubyear, st.name AS story_type, \
                (SELECT string_agg(p.name, ' & ') \
                 FROM storycontributor sc \
                 JOIN person p ON p.id = sc.person_id \
                 WHERE sc.shortstory_id = s.id AND sc.role_id = 1) AS author_str \
         FROM editionshortstory ess \
         JOIN shortstory s ON s.id = ess.shortstory_id \
         LEFT JOIN storytype st ON st.id = s.story_type \
         WHERE ess.edition_id = $1 \
         ORDER BY ess.order_num",
    )
    .bind(edition_id)
    .fetch_all(pool)
    .await?)
}

pub async fn fetch_row(conn: &mut PgConnection, id: i32) -> ApiResult<Option<EditionRow>> {
    let sql = format!("SELECT {ROW_COLUMNS} FROM edition WHERE id = $1");
    Ok(sqlx::query_as(&sql).bind(id).fetch_optional(conn).await?)
}

pub async fn insert_row(conn: &mut PgConnection, row: &EditionRow) -> ApiResult<i32> {
    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO edition (title, subtitle, pubyear, publisher_id, editionnum, \
                              version, isbn, printedin, pubseries_id, pubseriesnum, \
                              coll_info, pages, binding_id, format_id, size, \
                              dustcover, coverimage, misc, imported_string, verified) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
                 $16, $17, $18, $19, $20) \
         RETURNING id",
    )
    .bind(&row.title)
    .bind(&row.subtitle)
    .bind(row.pubyear)
    .bind(row.publisher_id)
    .bind(row.editionnum)
    .bind(row.version)
    .bind(&row.isbn)
    .bind(&row.printedin)
    .bind(row.pubseries_id)
    .bind(row.pubseriesnum)
    .bind(&row.coll_info)
    .bind(row.pages)
    .bind(row.binding_id)
    .bind(row.format_id)
    .bind(row.size)
    .bind(row.dustcover)
    .bind(row.coverimage)
    .bind(&row.misc)
    .bind(&row.imported_string)
    .bind(row.verified)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn update_row(conn: &mut PgConnection, row: &EditionRow) -> ApiResult<()> {
    sqlx::query(
        "UPDATE edition SET title = $1, subtitle = $2, pubyear = $3, \
                publisher_id = $4, editionnum = $5, version = $6, isbn = $7, \
                printedin = $8, pubseries_id = $9, pubseriesnum = $10, \
                coll_info = $11, pages = $12, binding_id = $13, format_id = $14, \
                size = $15, dustcover = $16, coverimage = $17, misc = $18, \
                imported_string = $19, verified = $20 \
         WHERE id = $21",
    )
    .bind(&row.title)
    .bind(&row.subtitle)
    .bind(row.pubyear)
    .bind(row.publisher_id)
    .bind(row.editionnum)
    .bind(row.version)
    .bind(&row.isbn)
    .bind(&row.printedin)
    .bind(row.pubseries_id)
    .bind(row.pubseriesnum)
    .bind(&row.coll_info)
    .bind(row.pages)
    .bind(row.binding_id)
    .bind(row.format_id)
    .bind(row.size)
    .bind(row.dustcover)
    .bind(row.coverimage)
    .bind(&row.misc)
    .bind(&row.imported_string)
    .bind(row.verified)
    .bind(row.id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Remove an edition and everything hanging off it. Contributors first,
/// then the work linkage, then child lists, then the row.
pub async fn delete_cascade(conn: &mut PgConnection, id: i32) -> ApiResult<()> {
    for sql in [
        "DELETE FROM editioncontributor WHERE edition_id = $1",
        "DELETE FROM editionshortstory WHERE edition_id = $1",
        "DELETE FROM part WHERE edition_id = $1",
        "DELETE FROM editionimage WHERE edition_id = $1",
        "DELETE FROM editionprice WHERE edition_id = $1",
        "DELETE FROM userbook WHERE edition_id = $1",
        "DELETE FROM userwishlist WHERE edition_id = $1",
        "DELETE FROM edition WHERE id = $1",
    ] {
        sqlx::query(sql).bind(id).execute(&mut *conn).await?;
    }
    Ok(())
}

/// Work the edition belongs to via its part row.
pub async fn work_id_of(conn: &mut PgConnection, edition_id: i32) -> ApiResult<Option<i32>> {
    let row: Option<(i32,)> =
        sqlx::query_as("SELECT work_id FROM part WHERE edition_id = $1 LIMIT 1")
            .bind(edition_id)
            .fetch_optional(conn)
            .await?;
    Ok(row.map(|(id,)| id))
}

pub async fn edition_count_of_work(conn: &mut PgConnection, work_id: i32) -> ApiResult<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT count(DISTINCT edition_id) FROM part WHERE work_id = $1")
            .bind(work_id)
            .fetch_one(conn)
            .await?;
    Ok(count)
}

/// Replace the contained-shorts membership with the given ordered list,
/// renumbering order_num densely from 1.
pub async fn save_shorts(
    conn: &mut PgConnection,
    edition_id: i32,
    short_ids: &[i32],
) -> ApiResult<()> {
    sqlx::query("DELETE FROM editionshortstory WHERE edition_id = $1")
        .bind(edition_id)
        .execute(&mut *conn)
        .await?;
    for (idx, short_id) in short_ids.iter().enumerate() {
        sqlx::query(
            "INSERT INTO editionshortstory (edition_id, shortstory_id, order_num) \
             VALUES ($1, $2, $3)",
        )
        .bind(edition_id)
        .bind(short_id)
        .bind((idx + 1) as i32)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Set the cover image of an edition, replacing a previous one.
/// Returns the replaced path when there was one.
pub async fn add_image(
    conn: &mut PgConnection,
    edition_id: i32,
    image_src: &str,
) -> ApiResult<Option<String>> {
    let existing: Option<(i32, String)> = sqlx::query_as(
        "SELECT id, image_src FROM editionimage WHERE edition_id = $1 ORDER BY id LIMIT 1",
    )
    .bind(edition_id)
    .fetch_optional(&mut *conn)
    .await?;
    match existing {
        Some((id, previous)) => {
            sqlx::query("UPDATE editionimage SET image_src = $1 WHERE id = $2")
                .bind(image_src)
                .bind(id)
                .execute(conn)
                .await?;
            Ok(Some(previous))
        }
        None => {
            sqlx::query("INSERT INTO editionimage (edition_id, image_src) VALUES ($1, $2)")
                .bind(edition_id)
                .bind(image_src)
                .execute(conn)
                .await?;
            Ok(None)
        }
    }
}

/// Delete an image row, returning the removed path.
pub async fn remove_image(
    conn: &mut PgConnection,
    image_id: i32,
) -> ApiResult<Option<String>> {
    let row: Option<(String,)> = sqlx::query_as(
        "DELETE FROM editionimage WHERE id = $1 RETURNING image_src",
    )
    .bind(image_id)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(|(src,)| src))
}

#[derive(Clone)]
pub struct EditionsRepository {
    pool: Pool<Postgres>,
}

impl EditionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i32) -> ApiResult<Option<Edition>> {
        load_full(&self.pool, id).await
    }

    pub async fn shorts(&self, edition_id: i32) -> ApiResult<Vec<ShortBrief>> {
        contained_shorts(&self.pool, edition_id).await
    }

    pub async fn latest(&self, count: i64) -> ApiResult<Vec<EditionBrief>> {
        let sql = format!("{BRIEF_SELECT} ORDER BY e.id DESC LIMIT $1");
        Ok(sqlx::query_as(&sql).bind(count).fetch_all(&self.pool).await?)
    }

    /// Latest editions, at most one per work. Editions without a work
    /// are skipped.
    pub async fn latest_per_work(&self, count: i64) -> ApiResult<Vec<EditionBrief>> {
        Ok(sqlx::query_as(
            "SELECT id, title, pubyear, editionnum, version, publisher_name, \
                    image_src, work_id, author_str \
             FROM (SELECT DISTINCT ON (pt.work_id) \
                          e.id, e.title, e.pubyear, e.editionnum, e.version, \
                          pub.name AS publisher_name, \
                          (SELECT ei.image_src FROM editionimage ei \
                           WHERE ei.edition_id = e.id ORDER BY ei.id LIMIT 1) \
                              AS image_src, \
                          pt.work_id, w.author_str \
                   FROM edition e \
                   LEFT JOIN publisher pub ON pub.id = e.publisher_id \
                   JOIN part pt ON pt.edition_id = e.id \
                   JOIN work w ON w.id = pt.work_id \
                   ORDER BY pt.work_id, e.id DESC) x \
             ORDER BY id DESC LIMIT $1",
        )
        .bind(count)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Latest editions that have a cover image.
    pub async fn latest_covers(&self, count: i64) -> ApiResult<Vec<EditionBrief>> {
        let sql = format!(
            "{BRIEF_SELECT} \
             WHERE EXISTS (SELECT 1 FROM editionimage ei WHERE ei.edition_id = e.id) \
             ORDER BY e.id DESC LIMIT $1"
        );
        Ok(sqlx::query_as(&sql).bind(count).fetch_all(&self.pool).await?)
    }

    pub async fn owned_by(&self, user_id: i32) -> ApiResult<Vec<EditionBrief>> {
        let sql = format!(
            "{BRIEF_SELECT} \
             JOIN userbook ub ON ub.edition_id = e.id \
             WHERE ub.user_id = $1 ORDER BY w.author_str, e.title"
        );
        Ok(sqlx::query_as(&sql).bind(user_id).fetch_all(&self.pool).await?)
    }

    pub async fn owners(&self, edition_id: i32) -> ApiResult<Vec<UserBook>> {
        Ok(sqlx::query_as(
            "SELECT ub.edition_id, ub.user_id, u.name AS user_name, \
                    ub.condition, ub.description \
             FROM userbook ub JOIN users u ON u.id = ub.user_id \
             WHERE ub.edition_id = $1 ORDER BY u.name",
        )
        .bind(edition_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn owner(&self, edition_id: i32, user_id: i32) -> ApiResult<Option<UserBook>> {
        Ok(sqlx::query_as(
            "SELECT ub.edition_id, ub.user_id, u.name AS user_name, \
                    ub.condition, ub.description \
             FROM userbook ub JOIN users u ON u.id = ub.user_id \
             WHERE ub.edition_id = $1 AND ub.user_id = $2",
        )
        .bind(edition_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    pub async fn wishlist_of(&self, user_id: i32) -> ApiResult<Vec<EditionBrief>> {
        let sql = format!(
            "{BRIEF_SELECT} \
             JOIN userwishlist uw ON uw.edition_id = e.id \
             WHERE uw.user_id = $1 ORDER BY w.author_str, e.title"
        );
        Ok(sqlx::query_as(&sql).bind(user_id).fetch_all(&self.pool).await?)
    }

    pub async fn set_owner(
        &self,
        edition_id: i32,
        user_id: i32,
        condition: Option<i32>,
        description: Option<&str>,
    ) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO userbook (edition_id, user_id, condition, description) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (edition_id, user_id) \
             DO UPDATE SET condition = $3, description = $4",
        )
        .bind(edition_id)
        .bind(user_id)
        .bind(condition)
        .bind(description)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove_owner(&self, edition_id: i32, user_id: i32) -> ApiResult<bool> {
        let result =
            sqlx::query("DELETE FROM userbook WHERE edition_id = $1 AND user_id = $2")
                .bind(edition_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn wishlist(&self, edition_id: i32) -> ApiResult<Vec<WishlistEntry>> {
        Ok(sqlx::query_as(
            "SELECT uw.edition_id, uw.user_id, u.name AS user_name \
             FROM userwishlist uw JOIN users u ON u.id = uw.user_id \
             WHERE uw.edition_id = $1 ORDER BY u.name",
        )
        .bind(edition_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn wishlist_contains(&self, edition_id: i32, user_id: i32) -> ApiResult<bool> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM userwishlist WHERE edition_id = $1 AND user_id = $2",
        )
        .bind(edition_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    pub async fn add_to_wishlist(&self, edition_id: i32, user_id: i32) -> ApiResult<()> {
        sqlx::query(
            "INSERT INTO userwishlist (edition_id, user_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(edition_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove_from_wishlist(&self, edition_id: i32, user_id: i32) -> ApiResult<bool> {
        let result =
            sqlx::query("DELETE FROM userwishlist WHERE edition_id = $1 AND user_id = $2")
                .bind(edition_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

}
