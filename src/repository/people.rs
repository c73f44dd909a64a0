//! Person persistence: the filtered list query, full-schema assembly
//! with alias resolution, and row CRUD inside the caller's transaction.

use sqlx::{PgConnection, Pool, Postgres};

use crate::error::ApiResult;
use crate::models::edition::EditionBrief;
use crate::models::magazine::IssueBrief;
use crate::models::person::{Person, PersonBrief, PersonRow};
use crate::models::refs::{role, IdName, Link};
use crate::models::short::ShortBrief;
use crate::models::work::WorkBrief;
use crate::services::filters::PeopleQuery;

const ROW_COLUMNS: &str =
    "id, name, alt_name, fullname, other_names, first_name, last_name, \
     image_src, image_attr, dob, dod, bio, bio_src, nationality_id, \
     imported_string";

/// Subquery producing the distinct role names of a person across all
/// three contributor tables.
const ROLES_EXPR: &str =
    "coalesce((SELECT array_agg(DISTINCT r.name) FROM contributorrole r WHERE \
        EXISTS (SELECT 1 FROM workcontributor x \
                WHERE x.person_id = p.id AND x.role_id = r.id) OR \
        EXISTS (SELECT 1 FROM editioncontributor x \
                WHERE x.person_id = p.id AND x.role_id = r.id) OR \
        EXISTS (SELECT 1 FROM storycontributor x \
                WHERE x.person_id = p.id AND x.role_id = r.id)), '{}')";

pub async fn fetch_row(conn: &mut PgConnection, id: i32) -> ApiResult<Option<PersonRow>> {
    let sql = format!("SELECT {ROW_COLUMNS} FROM person WHERE id = $1");
    Ok(sqlx::query_as(&sql).bind(id).fetch_optional(conn).await?)
}

pub async fn insert_row(conn: &mut PgConnection, row: &PersonRow) -> ApiResult<i32> {
    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO person (name, alt_name, fullname, other_names, first_name, \
                             last_name, image_src, image_attr, dob, dod, bio, \
                             bio_src, nationality_id, imported_string) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
         RETURNING id",
    )
    .bind(&row.name)
    .bind(&row.alt_name)
    .bind(&row.fullname)
    .bind(&row.other_names)
    .bind(&row.first_name)
    .bind(&row.last_name)
    .bind(&row.image_src)
    .bind(&row.image_attr)
    .bind(row.dob)
    .bind(row.dod)
    .bind(&row.bio)
    .bind(&row.bio_src)
    .bind(row.nationality_id)
    .bind(&row.imported_string)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn update_row(conn: &mut PgConnection, row: &PersonRow) -> ApiResult<()> {
    sqlx::query(
        "UPDATE person SET name = $1, alt_name = $2, fullname = $3, \
                other_names = $4, first_name = $5, last_name = $6, \
                image_src = $7, image_attr = $8, dob = $9, dod = $10, \
                bio = $11, bio_src = $12, nationality_id = $13, \
                imported_string = $14 \
         WHERE id = $15",
    )
    .bind(&row.name)
    .bind(&row.alt_name)
    .bind(&row.fullname)
    .bind(&row.other_names)
    .bind(&row.first_name)
    .bind(&row.last_name)
    .bind(&row.image_src)
    .bind(&row.image_attr)
    .bind(row.dob)
    .bind(row.dod)
    .bind(&row.bio)
    .bind(&row.bio_src)
    .bind(row.nationality_id)
    .bind(&row.imported_string)
    .bind(row.id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Reason the person cannot be deleted, if any.
pub async fn deletion_blocker(
    conn: &mut PgConnection,
    id: i32,
) -> ApiResult<Option<&'static str>> {
    let checks: [(&str, &str); 5] = [
        (
            "SELECT count(*) FROM workcontributor WHERE person_id = $1",
            "Henkilöllä on teoksia.",
        ),
        (
            "SELECT count(*) FROM editioncontributor WHERE person_id = $1",
            "Henkilöllä on painoksia.",
        ),
        (
            "SELECT count(*) FROM storycontributor WHERE person_id = $1",
            "Henkilöllä on novelleja.",
        ),
        (
            "SELECT count(*) FROM awarded WHERE person_id = $1",
            "Henkilöllä on palkintoja.",
        ),
        (
            "SELECT count(*) FROM alias WHERE alias = $1 OR realname = $1",
            "Henkilöllä on aliaksia.",
        ),
    ];
    for (sql, reason) in checks {
        let (count,): (i64,) = sqlx::query_as(sql).bind(id).fetch_one(&mut *conn).await?;
        if count > 0 {
            return Ok(Some(reason));
        }
    }
    Ok(None)
}

pub async fn delete_row(conn: &mut PgConnection, id: i32) -> ApiResult<()> {
    for sql in [
        "DELETE FROM personlink WHERE person_id = $1",
        "DELETE FROM persontag WHERE person_id = $1",
        "DELETE FROM person WHERE id = $1",
    ] {
        sqlx::query(sql).bind(id).execute(&mut *conn).await?;
    }
    Ok(())
}

pub async fn links(conn: &mut PgConnection, person_id: i32) -> ApiResult<Vec<Link>> {
    Ok(sqlx::query_as(
        "SELECT link, description FROM personlink WHERE person_id = $1 ORDER BY id",
    )
    .bind(person_id)
    .fetch_all(conn)
    .await?)
}

pub async fn save_links(conn: &mut PgConnection, person_id: i32, links: &[Link]) -> ApiResult<()> {
    sqlx::query("DELETE FROM personlink WHERE person_id = $1")
        .bind(person_id)
        .execute(&mut *conn)
        .await?;
    for link in links {
        sqlx::query("INSERT INTO personlink (person_id, link, description) VALUES ($1, $2, $3)")
            .bind(person_id)
            .bind(&link.link)
            .bind(&link.description)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct PeopleRepository {
    pool: Pool<Postgres>,
}

impl PeopleRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Filtered, sorted, paginated listing. The count is taken before
    /// pagination.
    pub async fn list(&self, query: &PeopleQuery) -> ApiResult<(Vec<PersonBrief>, i64)> {
        let count_sql = format!("SELECT count(*) FROM person p {}", query.where_sql);
        let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
        for bind in &query.binds {
            count_query = count_query.bind(bind);
        }
        let (total,) = count_query.fetch_one(&self.pool).await?;

        let mut page_sql = format!(
            "SELECT p.id, p.name, p.alt_name, p.fullname, p.dob, p.dod, \
                    (SELECT c.name FROM country c WHERE c.id = p.nationality_id) \
                        AS nationality, \
                    (SELECT count(DISTINCT wc.work_id) FROM workcontributor wc \
                     WHERE wc.person_id = p.id) AS workcount, \
                    (SELECT count(DISTINCT sc.shortstory_id) FROM storycontributor sc \
                     WHERE sc.person_id = p.id) AS storycount, \
                    {ROLES_EXPR} AS roles \
             FROM person p {} {}",
            query.where_sql, query.order_sql
        );
        let mut bind_pos = query.binds.len();
        if let Some(limit) = query.limit {
            bind_pos += 1;
            page_sql.push_str(&format!(" LIMIT ${bind_pos}"));
            bind_pos += 1;
            page_sql.push_str(&format!(" OFFSET ${bind_pos}"));
            let mut page_query = sqlx::query_as::<_, PersonBrief>(&page_sql);
            for bind in &query.binds {
                page_query = page_query.bind(bind);
            }
            page_query = page_query.bind(limit).bind(query.offset);
            Ok((page_query.fetch_all(&self.pool).await?, total))
        } else {
            let mut page_query = sqlx::query_as::<_, PersonBrief>(&page_sql);
            for bind in &query.binds {
                page_query = page_query.bind(bind);
            }
            Ok((page_query.fetch_all(&self.pool).await?, total))
        }
    }

    /// Full person schema. An alias with exactly one real person
    /// resolves to the real person; the real person's page merges in
    /// contributions made under any alias.
    pub async fn get(&self, id: i32) -> ApiResult<Option<Person>> {
        let real_ids: Vec<(i32,)> =
            sqlx::query_as("SELECT realname FROM alias WHERE alias = $1")
                .bind(id)
                .fetch_all(&self.pool)
                .await?;
        let id = if real_ids.len() == 1 { real_ids[0].0 } else { id };

        let mut conn = self.pool.acquire().await?;
        let Some(row) = fetch_row(conn.as_mut(), id).await? else {
            return Ok(None);
        };
        let links = links(conn.as_mut(), id).await?;
        drop(conn);

        let aliases: Vec<IdName> = sqlx::query_as(
            "SELECT p.id, p.name FROM person p \
             JOIN alias a ON a.alias = p.id WHERE a.realname = $1 ORDER BY p.name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        let real_names: Vec<IdName> = sqlx::query_as(
            "SELECT p.id, p.name FROM person p \
             JOIN alias a ON a.realname = p.id WHERE a.alias = $1 ORDER BY p.name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        // Contributions made under an alias belong on the real person's
        // page.
        let mut identity_ids: Vec<i32> = vec![id];
        identity_ids.extend(aliases.iter().map(|a| a.id));

        let nationality: Option<IdName> = match row.nationality_id {
            Some(nat_id) => {
                sqlx::query_as("SELECT id, name FROM country WHERE id = $1")
                    .bind(nat_id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => None,
        };

        let roles: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT r.name FROM contributorrole r WHERE \
               EXISTS (SELECT 1 FROM workcontributor x \
                       WHERE x.person_id = ANY($1) AND x.role_id = r.id) OR \
               EXISTS (SELECT 1 FROM editioncontributor x \
                       WHERE x.person_id = ANY($1) AND x.role_id = r.id) OR \
               EXISTS (SELECT 1 FROM storycontributor x \
                       WHERE x.person_id = ANY($1) AND x.role_id = r.id) \
             ORDER BY r.name",
        )
        .bind(&identity_ids)
        .fetch_all(&self.pool)
        .await?;

        let works: Vec<WorkBrief> = sqlx::query_as(
            "SELECT w.id, w.title, w.orig_title, w.pubyear, w.author_str, \
                    coalesce(array_remove(array_agg(DISTINCT g.abbr), NULL), '{}') \
                        AS genres \
             FROM work w \
             JOIN workcontributor wc ON wc.work_id = w.id \
             LEFT JOIN workgenre wg ON wg.work_id = w.id \
             LEFT JOIN genre g ON g.id = wg.genre_id \
             WHERE wc.person_id = ANY($1) AND wc.role_id = $2 \
             GROUP BY w.id ORDER BY w.pubyear, w.title",
        )
        .bind(&identity_ids)
        .bind(role::AUTHOR)
        .fetch_all(&self.pool)
        .await?;

        let edits = self.editions_with_role(&identity_ids, role::EDITOR).await?;
        let translations = self
            .editions_with_role(&identity_ids, role::TRANSLATOR)
            .await?;

        let stories: Vec<ShortBrief> = sqlx::query_as(
            "SELECT s.id, s.title, s.orig_title, s.pubyear, st.name AS story_type, \
                    (SELECT string_agg(p.name, ' & ') \
                     FROM storycontributor sca \
                     JOIN person p ON p.id = sca.person_id \
                     WHERE sca.shortstory_id = s.id AND sca.role_id = 1) AS author_str \
             FROM shortstory s \
             LEFT JOIN storytype st ON st.id = s.story_type \
             JOIN storycontributor sc ON sc.shortstory_id = s.id \
             WHERE sc.person_id = ANY($1) \
             GROUP BY s.id, s.title, s.orig_title, s.pubyear, st.name \
             ORDER BY s.pubyear, s.title",
        )
        .bind(&identity_ids)
        .fetch_all(&self.pool)
        .await?;

        let personal_tags: Vec<IdName> = sqlx::query_as(
            "SELECT t.id, t.name FROM tag t \
             JOIN persontag pt ON pt.tag_id = t.id \
             WHERE pt.person_id = $1 ORDER BY t.name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Person {
            id: row.id,
            name: row.name,
            alt_name: row.alt_name,
            fullname: row.fullname,
            other_names: row.other_names,
            first_name: row.first_name,
            last_name: row.last_name,
            image_src: row.image_src,
            image_attr: row.image_attr,
            dob: row.dob,
            dod: row.dod,
            bio: row.bio,
            bio_src: row.bio_src,
            nationality,
            links,
            roles: roles.into_iter().map(|(name,)| name).collect(),
            works,
            edits,
            translations,
            stories,
            aliases,
            real_names,
            personal_tags,
        }))
    }

    async fn editions_with_role(
        &self,
        person_ids: &[i32],
        role_id: i32,
    ) -> ApiResult<Vec<EditionBrief>> {
        Ok(sqlx::query_as(
            "SELECT e.id, e.title, e.pubyear, e.editionnum, e.version, \
                    pub.name AS publisher_name, \
                    (SELECT ei.image_src FROM editionimage ei \
                     WHERE ei.edition_id = e.id ORDER BY ei.id LIMIT 1) AS image_src, \
                    pt.work_id, w.author_str \
             FROM edition e \
             JOIN editioncontributor ec ON ec.edition_id = e.id \
             LEFT JOIN publisher pub ON pub.id = e.publisher_id \
             LEFT JOIN part pt ON pt.edition_id = e.id \
             LEFT JOIN work w ON w.id = pt.work_id \
             WHERE ec.person_id = ANY($1) AND ec.role_id = $2 \
             ORDER BY e.pubyear, e.title",
        )
        .bind(person_ids)
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Shorts the person contributed to in any role.
    pub async fn shorts(&self, person_id: i32) -> ApiResult<Vec<ShortBrief>> {
        Ok(sqlx::query_as(
            "SELECT s.id, s.title, s.orig_title, s.pubyear, st.name AS story_type, \
                    (SELECT string_agg(p.name, ' & ') \
                     FROM storycontributor sca \
                     JOIN person p ON p.id = sca.person_id \
                     WHERE sca.shortstory_id = s.id AND sca.role_id = 1) AS author_str \
             FROM shortstory s \
             LEFT JOIN storytype st ON st.id = s.story_type \
             JOIN storycontributor sc ON sc.shortstory_id = s.id \
             WHERE sc.person_id = $1 \
             GROUP BY s.id, s.title, s.orig_title, s.pubyear, st.name \
             ORDER BY s.title",
        )
        .bind(person_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Magazine issues where the person is chief editor.
    pub async fn chief_editor_issues(&self, person_id: i32) -> ApiResult<Vec<IssueBrief>> {
        Ok(sqlx::query_as(
            "SELECT i.id, i.magazine_id, i.year, i.number, i.number_extra, i.count, \
                    m.name AS magazine_name, \
                    concat(i.number, coalesce(i.number_extra, ''), '/', i.year) \
                        AS cover_number \
             FROM issue i \
             JOIN magazine m ON m.id = i.magazine_id \
             JOIN issuecontributor ic ON ic.issue_id = i.id \
             WHERE ic.person_id = $1 AND ic.role_id = $2 \
             ORDER BY i.year, i.number",
        )
        .bind(person_id)
        .bind(role::EDITOR_IN_CHIEF)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn filter(&self, pattern: &str) -> ApiResult<Vec<PersonBrief>> {
        Ok(sqlx::query_as(
            "SELECT p.id, p.name, p.alt_name, p.fullname, p.dob, p.dod, \
                    (SELECT c.name FROM country c WHERE c.id = p.nationality_id) \
                        AS nationality \
             FROM person p \
             WHERE p.name ILIKE $1 OR p.alt_name ILIKE $1 \
             ORDER BY p.name",
        )
        .bind(format!("{pattern}%"))
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn latest(&self, count: i64) -> ApiResult<Vec<PersonBrief>> {
        Ok(sqlx::query_as(
            "SELECT p.id, p.name, p.alt_name, p.fullname, p.dob, p.dod, \
                    (SELECT c.name FROM country c WHERE c.id = p.nationality_id) \
                        AS nationality \
             FROM person p ORDER BY p.id DESC LIMIT $1",
        )
        .bind(count)
        .fetch_all(&self.pool)
        .await?)
    }

}
